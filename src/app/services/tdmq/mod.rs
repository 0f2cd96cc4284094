//! TDMQ time-series service collaborator
//!
//! - [`client`] - REST client (`/sources`, `/sources/{id}/timeseries`, `/measures`)
//! - [`consumer`] - Polls aggregated series for all sources of an entity type
//! - [`models`] - Measures, sources and time series

pub mod client;
pub mod consumer;
pub mod models;

#[cfg(test)]
pub mod tests;

pub use client::{TdmqClient, TimeseriesQuery};
pub use consumer::TdmqConsumer;
pub use models::{Measure, TdmqSource, TimeSeries};
