//! Publication of aggregated time series as CKAN datastore resources

use super::client::{CkanClient, CkanResource, DatastoreField};
use crate::app::services::ingestion::{TimeDelta, TimeWindow, parse_instant};
use crate::app::services::tdmq::TimeSeries;
use crate::constants::{CKAN_AFTER_EXTRA, CKAN_PERIOD_EXTRA, DATE_FORMAT};
use crate::error::{IngestionError, Result};
use crate::models::Geometry;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Target resource of a write
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    pub dataset: String,
    pub name: String,
    pub description: String,
    /// Replace a resource with the same name instead of failing
    pub upsert: bool,
    /// Relative window the resource covers, recorded for pruning
    pub period: Option<TimeDelta>,
    pub after: DateTime<Utc>,
}

impl ResourceSpec {
    fn to_resource(&self) -> Value {
        let mut resource = json!({
            "package_id": self.dataset,
            "name": self.name,
            "description": self.description,
        });
        resource[CKAN_AFTER_EXTRA] = Value::String(self.after.format(DATE_FORMAT).to_string());
        if let Some(period) = self.period {
            resource[CKAN_PERIOD_EXTRA] = Value::String(period.as_str().to_string());
        }
        resource
    }
}

#[derive(Debug, Clone)]
pub struct CkanStorage {
    client: CkanClient,
}

impl CkanStorage {
    pub fn new(client: CkanClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &CkanClient {
        &self.client
    }

    /// Write every point of `series` as one datastore resource.
    ///
    /// Returns the number of rows written; empty input creates nothing. With
    /// `upsert`, resources of the same name are deleted only after the new
    /// resource has been created.
    pub async fn write(&self, series: &[TimeSeries], spec: &ResourceSpec) -> Result<usize> {
        let (fields, rows) = flatten(series);
        if rows.is_empty() {
            info!("No data to write to resource '{}'", spec.name);
            return Ok(0);
        }

        let existing: Vec<CkanResource> = self
            .client
            .package_resources(&spec.dataset)
            .await?
            .into_iter()
            .filter(|resource| resource.has_name(&spec.name))
            .collect();

        if !existing.is_empty() && !spec.upsert {
            return Err(IngestionError::ResourceExists {
                dataset: spec.dataset.clone(),
                name: spec.name.clone(),
            });
        }

        // The replaced resources stay in place until the new one exists
        let resource_id = self
            .client
            .datastore_create(&spec.to_resource(), &fields, &rows)
            .await?;
        info!(
            "Created resource '{}' ({}) with {} rows",
            spec.name,
            resource_id,
            rows.len()
        );

        for resource in existing.iter().filter(|r| r.id != resource_id) {
            info!("Removing replaced resource '{}' ({})", spec.name, resource.id);
            self.client.resource_delete(&resource.id).await?;
        }
        Ok(rows.len())
    }

    /// Delete finer-grained resources superseded by `keep`.
    ///
    /// Daily resources always qualify, weekly ones only with `prune_weekly`;
    /// a resource is deleted when its recorded start lies inside `window`.
    pub async fn prune_resources(
        &self,
        dataset: &str,
        keep: &str,
        window: &TimeWindow,
        prune_weekly: bool,
    ) -> Result<usize> {
        let mut pruned = 0;

        for resource in self.client.package_resources(dataset).await? {
            if resource.has_name(keep) || !is_prunable(&resource, prune_weekly) {
                continue;
            }

            let Some(after) = resource.extra_str(CKAN_AFTER_EXTRA) else {
                continue;
            };
            let after = match parse_instant(after) {
                Ok(after) => after,
                Err(e) => {
                    warn!("Skipping resource {}: {}", resource.id, e);
                    continue;
                }
            };

            if window.after <= after && after < window.before {
                debug!(
                    "Pruning resource {} ({})",
                    resource.id,
                    resource.name.as_deref().unwrap_or("unnamed")
                );
                self.client.resource_delete(&resource.id).await?;
                pruned += 1;
            }
        }

        info!("Pruned {} resources from dataset '{}'", pruned, dataset);
        Ok(pruned)
    }
}

fn is_prunable(resource: &CkanResource, prune_weekly: bool) -> bool {
    match resource.extra_str(CKAN_PERIOD_EXTRA) {
        Some(period) if period == TimeDelta::OneDay.as_str() => true,
        Some(period) if period == TimeDelta::OneWeek.as_str() => prune_weekly,
        _ => false,
    }
}

/// Datastore fields and rows for a set of series.
///
/// Coordinates are only declared when at least one series is located;
/// property columns are the sorted union over all series.
pub fn flatten(series: &[TimeSeries]) -> (Vec<DatastoreField>, Vec<Value>) {
    let located = series.iter().any(|s| s.geometry.is_some());
    let properties: BTreeSet<&str> = series
        .iter()
        .flat_map(|s| s.data.keys().map(String::as_str))
        .collect();

    let mut fields = vec![
        DatastoreField::new("station", "text"),
        DatastoreField::new("date", "timestamp"),
    ];
    if located {
        fields.push(DatastoreField::new("latitude", "numeric"));
        fields.push(DatastoreField::new("longitude", "numeric"));
    }
    fields.extend(
        properties
            .iter()
            .map(|name| DatastoreField::new(*name, "numeric")),
    );

    let mut rows = Vec::new();
    for s in series {
        for (index, time) in s.time.iter().enumerate() {
            let mut row = Map::new();
            row.insert("station".into(), Value::String(s.source_id.clone()));
            row.insert(
                "date".into(),
                Value::String(time.to_rfc3339_opts(SecondsFormat::Secs, true)),
            );
            if let Some(Geometry::Point {
                latitude,
                longitude,
            }) = s.geometry
            {
                row.insert("latitude".into(), json!(latitude));
                row.insert("longitude".into(), json!(longitude));
            }
            for name in &properties {
                row.insert((*name).to_string(), json!(s.value(name, index)));
            }
            rows.push(Value::Object(row));
        }
    }

    (fields, rows)
}
