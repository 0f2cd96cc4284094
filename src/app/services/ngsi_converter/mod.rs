//! NGSI message conversion
//!
//! This module turns raw NGSI (FIWARE) context messages into normalized
//! [`Record`](crate::models::Record)s ready to be handed to a sink.
//!
//! # Architecture
//!
//! - [`message`] - Typed view of the NGSI payload (`headers`, `body.id`, `body.attributes`)
//! - [`identity`] - Sensor identity parsing, geometry and service path extraction
//! - [`fields`] - Attribute classification and numeric/timestamp coercion
//! - [`sensor_factory`] - Sensor creation strategies (fresh or cached by name)
//! - [`converter`] - Record assembly and the fault-isolating batch driver
//!
//! # Failure policy
//!
//! Every failure a single message can cause is a [`ConversionError`] for which
//! [`ConversionError::is_recoverable`] returns `true`; the batch driver logs it
//! and moves on. Anything else aborts the batch.
//!
//! # Example Usage
//!
//! ```rust
//! use tdm_ingestion::app::services::ngsi_converter::NgsiConverter;
//! use tdm_ingestion::config::ServicePathTable;
//!
//! let converter = NgsiConverter::cached(ServicePathTable::default());
//! let payload = r#"{
//!     "headers": [{"fiware-servicePath": "/cagliari/edge/meteo"}],
//!     "body": {
//!         "id": "WeatherObserved:Edge-CFA703F4.Station01.TempSensor",
//!         "attributes": [
//!             {"name": "latitude", "value": "39.2"},
//!             {"name": "longitude", "value": "9.1"},
//!             {"name": "temperature", "value": "21.5"}
//!         ]
//!     }
//! }"#;
//!
//! let records = converter.convert(&[payload]).unwrap();
//! assert_eq!(records[0].source.name, "Station01.TempSensor");
//! ```

pub mod converter;
pub mod fields;
pub mod identity;
pub mod message;
pub mod sensor_factory;

#[cfg(test)]
pub mod tests;

pub use converter::NgsiConverter;
pub use identity::SensorIdentity;
pub use message::{NgsiAttribute, NgsiBody, NgsiMessage};
pub use sensor_factory::{CachedSensorFactory, FreshSensorFactory, SensorFactory};

use thiserror::Error;

/// Failures raised while converting a single NGSI message
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("Invalid message id '{id}'")]
    MalformedIdentity { id: String },

    #[error("Missing latitude and/or longitude")]
    MissingGeometry,

    #[error("Invalid {name} value: {value}")]
    InvalidCoordinate { name: String, value: String },

    #[error("Invalid timestamp value: {value}")]
    InvalidTimestamp { value: String },

    #[error("fiware-servicePath header not found")]
    MissingServicePath,

    #[error("Unknown fiware-servicePath '{path}'")]
    UnknownServicePath { path: String },

    #[error("Sensor registry lock poisoned")]
    RegistryPoisoned,
}

impl ConversionError {
    /// Whether the batch driver may skip the offending message and continue
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ConversionError::RegistryPoisoned)
    }
}
