//! CKAN open data portal collaborator
//!
//! - [`client`] - Action API calls (`package_show`, `datastore_create`, `resource_delete`)
//! - [`storage`] - Time series publication and pruning of superseded resources

pub mod client;
pub mod storage;

#[cfg(test)]
pub mod tests;

pub use client::{CkanClient, CkanResource, DatastoreField};
pub use storage::{CkanStorage, ResourceSpec};
