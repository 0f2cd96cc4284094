//! Periodic TDMQ to CKAN ingestion

use super::naming::{render_description, resource_name};
use super::window::{TimeDelta, TimeWindow};
use crate::app::services::ckan::{CkanStorage, ResourceSpec};
use crate::app::services::tdmq::TdmqConsumer;
use crate::error::Result;
use tracing::info;

/// One run: poll an entity type over a window and publish it as a resource
#[derive(Debug, Clone)]
pub struct IngestionJob {
    pub entity_type: String,
    /// Aggregation bucket in seconds
    pub bucket: f64,
    pub op: String,
    pub window: TimeWindow,
    /// Set when the window was derived from a relative delta
    pub period: Option<TimeDelta>,
    pub dataset: String,
    /// Resource name, a strftime pattern when `period` is set
    pub resource: String,
    /// Description, with `%{after}`/`%{before}` placeholders when `period` is set
    pub description: String,
    pub upsert: bool,
    pub prune: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestionReport {
    pub resource_name: String,
    pub sources: usize,
    pub rows: usize,
    pub pruned: usize,
}

impl IngestionJob {
    pub fn resource_name(&self) -> Result<String> {
        match self.period {
            Some(_) => resource_name(&self.resource, self.window.after),
            None => Ok(self.resource.clone()),
        }
    }

    pub fn description(&self) -> String {
        match self.period {
            Some(_) => render_description(&self.description, &self.window),
            None => self.description.clone(),
        }
    }

    /// `Some(prune_weekly)` when this run should prune finer resources
    pub fn prune_scope(&self) -> Option<bool> {
        if !self.prune {
            return None;
        }
        self.period.and_then(|period| period.prune_scope())
    }

    pub async fn run(&self, consumer: &TdmqConsumer, storage: &CkanStorage) -> Result<IngestionReport> {
        let resource_name = self.resource_name()?;
        info!(
            "Ingesting {} ({} s buckets, {}) into {}/{}",
            self.entity_type, self.bucket, self.op, self.dataset, resource_name
        );

        let series = consumer
            .poll(&self.entity_type, self.bucket, &self.op, &self.window)
            .await?;

        let spec = ResourceSpec {
            dataset: self.dataset.clone(),
            name: resource_name.clone(),
            description: self.description(),
            upsert: self.upsert,
            period: self.period,
            after: self.window.after,
        };
        let rows = storage.write(&series, &spec).await?;

        let pruned = match self.prune_scope() {
            Some(prune_weekly) => {
                storage
                    .prune_resources(&self.dataset, &resource_name, &self.window, prune_weekly)
                    .await?
            }
            None => 0,
        };

        Ok(IngestionReport {
            resource_name,
            sources: series.len(),
            rows,
            pruned,
        })
    }
}
