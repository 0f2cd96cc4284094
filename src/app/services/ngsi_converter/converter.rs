//! Record assembly and batch conversion
//!
//! [`NgsiConverter`] composes identity, geometry and field extraction into a
//! [`Record`] and drives that over a batch of raw payloads, skipping (and
//! logging) every message that fails in an anticipated way.

use super::fields::{coerce_f64, has_content, is_skipped_value, parse_timestamp, property_names};
use super::identity::{SensorIdentity, extract_geometry, service_path};
use super::message::NgsiMessage;
use super::sensor_factory::{CachedSensorFactory, FreshSensorFactory, SensorFactory};
use super::ConversionError;
use crate::config::ServicePathTable;
use crate::constants::TIMESTAMP_ATTR;
use crate::models::Record;
use std::collections::BTreeMap;
use tracing::{debug, error, info};

/// Converter from NGSI messages to records
///
/// The sensor creation strategy is injected through `F`; use
/// [`NgsiConverter::new`] for fresh descriptors per record or
/// [`NgsiConverter::cached`] to share descriptors by sensor name.
#[derive(Debug)]
pub struct NgsiConverter<F = FreshSensorFactory> {
    service_paths: ServicePathTable,
    factory: F,
}

impl NgsiConverter<FreshSensorFactory> {
    pub fn new(service_paths: ServicePathTable) -> Self {
        Self::with_factory(service_paths, FreshSensorFactory)
    }
}

impl NgsiConverter<CachedSensorFactory> {
    pub fn cached(service_paths: ServicePathTable) -> Self {
        Self::with_factory(service_paths, CachedSensorFactory::new())
    }
}

impl<F: SensorFactory> NgsiConverter<F> {
    pub fn with_factory(service_paths: ServicePathTable, factory: F) -> Self {
        Self {
            service_paths,
            factory,
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn service_paths(&self) -> &ServicePathTable {
        &self.service_paths
    }

    /// Build the record for one decoded message
    pub fn create_record(&self, message: &NgsiMessage) -> Result<Record, ConversionError> {
        let identity = SensorIdentity::parse(&message.body.id)?;
        let attributes = message.attributes();

        let properties = property_names(attributes);
        let geometry = extract_geometry(attributes)?;

        let mut values = BTreeMap::new();
        let mut timestamp = None;
        for attr in attributes {
            if !has_content(&attr.value) || is_skipped_value(&attr.name) {
                continue;
            }

            if attr.name == TIMESTAMP_ATTR {
                timestamp = Some(parse_timestamp(&attr.value)?);
                continue;
            }

            match coerce_f64(&attr.value) {
                Some(value) => {
                    values.insert(attr.name.clone(), value);
                }
                None => error!("Cannot convert to float {} = {}", attr.name, attr.value),
            }
        }

        let path = service_path(&message.headers)?;
        let entity_type = self
            .service_paths
            .entity_type(&path)
            .cloned()
            .ok_or(ConversionError::UnknownServicePath { path })?;

        let source = self.factory.create_sensor(
            &identity.sensor_name(),
            entity_type,
            geometry,
            properties,
        )?;

        Ok(Record::new(timestamp, source, values))
    }

    /// Decode and convert a single raw payload
    pub fn convert_message(&self, payload: &str) -> Result<Record, ConversionError> {
        let message = NgsiMessage::parse(payload)?;
        self.create_record(&message)
    }

    /// Convert a batch of raw payloads, preserving input order.
    ///
    /// Messages failing with a recoverable [`ConversionError`] are logged and
    /// left out of the output; any other failure aborts the batch.
    pub fn convert<S: AsRef<str>>(&self, messages: &[S]) -> Result<Vec<Record>, ConversionError> {
        debug!("Converting batch of {} messages", messages.len());

        let mut records = Vec::with_capacity(messages.len());
        let mut skipped = 0usize;

        for payload in messages {
            let payload = payload.as_ref();
            match self.convert_message(payload) {
                Ok(record) => records.push(record),
                Err(e) if e.is_recoverable() => {
                    skipped += 1;
                    match e {
                        ConversionError::MalformedPayload(_) => {
                            error!("Exception decoding message {}: {}", payload, e)
                        }
                        _ => error!("Exception occurred with message {}: {}", payload, e),
                    }
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Converted {} of {} messages ({} skipped)",
            records.len(),
            messages.len(),
            skipped
        );

        Ok(records)
    }
}
