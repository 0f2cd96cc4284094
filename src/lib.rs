//! TDM Ingestion Library
//!
//! Ingestion tools for a FIWARE-based sensor network: NGSI context messages
//! are converted into normalized sensor records and stored, and aggregated
//! time series are published as open data.
//!
//! This library provides tools for:
//! - Parsing NGSI messages into records with shared or fresh sensor descriptors
//! - Mapping `fiware-servicePath` headers to entity types
//! - Storing records in TDMQ or in Parquet/CSV files
//! - Polling TDMQ time series and publishing them as CKAN resources
//! - Pruning superseded daily and weekly CKAN resources

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Core application modules
pub mod app {
    pub mod services {
        pub mod ckan;
        pub mod ingestion;
        pub mod ngsi_converter;
        pub mod storage;
        pub mod tdmq;

        #[cfg(test)]
        pub mod test_support;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::services::ngsi_converter::{ConversionError, NgsiConverter};
pub use config::{IngestionConfig, ServicePathTable};
pub use error::{IngestionError, Result};
pub use models::{EntityType, Geometry, Record, Source};
