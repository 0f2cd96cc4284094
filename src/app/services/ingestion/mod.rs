//! TDMQ to CKAN ingestion jobs
//!
//! - [`window`] - Relative deltas and the windows they select
//! - [`naming`] - Resource names and descriptions for a window
//! - [`job`] - Poll, publish and prune in one run

pub mod job;
pub mod naming;
pub mod window;

pub use job::{IngestionJob, IngestionReport};
pub use naming::{render_description, resource_name};
pub use window::{TimeDelta, TimeWindow, parse_instant};
