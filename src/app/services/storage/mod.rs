//! Record sinks
//!
//! Destinations for converted [`Record`]s:
//!
//! - [`tdmq`] - Posts measures to the TDMQ time-series service
//! - [`file`] - Writes Parquet or CSV files through Polars

pub mod file;
pub mod tdmq;

#[cfg(test)]
pub mod tests;

pub use file::{FileSink, OutputFormat, records_to_dataframe};
pub use tdmq::TdmqStorage;

use crate::error::Result;
use crate::models::Record;
use std::future::Future;

/// Destination for converted records
pub trait RecordSink {
    /// Store a batch of records, returning how many were stored
    fn write(&self, records: &[Record]) -> impl Future<Output = Result<usize>> + Send;
}
