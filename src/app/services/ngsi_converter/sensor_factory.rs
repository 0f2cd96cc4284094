//! Sensor creation strategies
//!
//! The converter asks a [`SensorFactory`] for the [`Source`] of every record.
//! [`FreshSensorFactory`] builds a new descriptor each time, while
//! [`CachedSensorFactory`] keeps one descriptor per sensor name so records of
//! the same sensor share it.

use super::ConversionError;
use crate::models::{EntityType, Geometry, Source};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Strategy used by the converter to obtain sensor descriptors
pub trait SensorFactory {
    fn create_sensor(
        &self,
        name: &str,
        entity_type: EntityType,
        geometry: Geometry,
        properties: Vec<String>,
    ) -> Result<Arc<Source>, ConversionError>;
}

/// Always builds a new descriptor, even for a recurring sensor name
#[derive(Debug, Default, Clone, Copy)]
pub struct FreshSensorFactory;

impl SensorFactory for FreshSensorFactory {
    fn create_sensor(
        &self,
        name: &str,
        entity_type: EntityType,
        geometry: Geometry,
        properties: Vec<String>,
    ) -> Result<Arc<Source>, ConversionError> {
        Ok(Arc::new(Source::new(name, entity_type, geometry, properties)))
    }
}

/// Registry of descriptors keyed by sensor name.
///
/// The first descriptor registered for a name is returned for every later
/// request; geometry or properties of later messages never update it.
/// Every operation fails with [`ConversionError::RegistryPoisoned`] once a
/// thread has panicked while holding the registry lock.
#[derive(Debug, Default)]
pub struct CachedSensorFactory {
    pub(super) sensors: Mutex<HashMap<String, Arc<Source>>>,
}

impl CachedSensorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> Result<MutexGuard<'_, HashMap<String, Arc<Source>>>, ConversionError> {
        self.sensors
            .lock()
            .map_err(|_| ConversionError::RegistryPoisoned)
    }

    /// Registered descriptor for a sensor name, if any
    pub fn get(&self, name: &str) -> Result<Option<Arc<Source>>, ConversionError> {
        Ok(self.registry()?.get(name).cloned())
    }

    /// Number of registered sensors
    pub fn len(&self) -> Result<usize, ConversionError> {
        Ok(self.registry()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, ConversionError> {
        Ok(self.registry()?.is_empty())
    }

    /// Drop every registered descriptor, e.g. between batches
    pub fn clear(&self) -> Result<(), ConversionError> {
        self.registry()?.clear();
        Ok(())
    }
}

impl SensorFactory for CachedSensorFactory {
    fn create_sensor(
        &self,
        name: &str,
        entity_type: EntityType,
        geometry: Geometry,
        properties: Vec<String>,
    ) -> Result<Arc<Source>, ConversionError> {
        let mut sensors = self.registry()?;

        if let Some(existing) = sensors.get(name) {
            return Ok(Arc::clone(existing));
        }

        debug!("Registering sensor {} ({})", name, entity_type);
        let source = Arc::new(Source::new(name, entity_type, geometry, properties));
        sensors.insert(name.to_string(), Arc::clone(&source));
        Ok(source)
    }
}

/// Lets several converters share one registry
impl<F: SensorFactory + ?Sized> SensorFactory for Arc<F> {
    fn create_sensor(
        &self,
        name: &str,
        entity_type: EntityType,
        geometry: Geometry,
        properties: Vec<String>,
    ) -> Result<Arc<Source>, ConversionError> {
        (**self).create_sensor(name, entity_type, geometry, properties)
    }
}
