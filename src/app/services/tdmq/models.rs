//! Wire and domain types exchanged with TDMQ

use crate::app::services::ngsi_converter::fields::parse_timestamp;
use crate::error::Result;
use crate::models::{Geometry, Record};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One measure as accepted by `POST /measures`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measure {
    pub time: DateTime<Utc>,
    pub source: String,
    pub entity_type: String,
    pub geometry: Value,
    pub data: BTreeMap<String, f64>,
}

impl Measure {
    /// Measure for a record; `None` when the record has no timestamp
    pub fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            time: record.timestamp?,
            source: record.source.name.clone(),
            entity_type: record.source.entity_type.category.clone(),
            geometry: record.source.geometry.to_geojson(),
            data: record.values.clone(),
        })
    }
}

/// Source description returned by `GET /sources`
#[derive(Debug, Clone, Deserialize)]
pub struct TdmqSource {
    pub tdmq_id: String,
    pub external_id: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub default_footprint: Option<Value>,
}

impl TdmqSource {
    /// Point geometry from the GeoJSON footprint, if it is one
    pub fn geometry(&self) -> Option<Geometry> {
        let footprint = self.default_footprint.as_ref()?;
        if footprint.get("type")?.as_str()? != "Point" {
            return None;
        }
        let coordinates = footprint.get("coordinates")?.as_array()?;
        let longitude = coordinates.first()?.as_f64()?;
        let latitude = coordinates.get(1)?.as_f64()?;
        Some(Geometry::point(latitude, longitude))
    }
}

/// Body of `GET /sources/{id}/timeseries`
#[derive(Debug, Clone, Deserialize)]
pub struct TimeSeriesResponse {
    pub coords: TimeSeriesCoords,
    #[serde(default)]
    pub data: BTreeMap<String, Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeSeriesCoords {
    #[serde(default)]
    pub time: Vec<Value>,
}

/// Aggregated series of one source over a window
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub source_id: String,
    pub geometry: Option<Geometry>,
    pub time: Vec<DateTime<Utc>>,
    pub data: BTreeMap<String, Vec<Option<f64>>>,
}

impl TimeSeries {
    pub fn from_response(source: &TdmqSource, response: TimeSeriesResponse) -> Result<Self> {
        let time = response
            .coords
            .time
            .iter()
            .map(parse_time_coord)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source_id: source.external_id.clone(),
            geometry: source.geometry(),
            time,
            data: response.data,
        })
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Value of a property at a time index
    pub fn value(&self, property: &str, index: usize) -> Option<f64> {
        self.data.get(property)?.get(index).copied().flatten()
    }
}

/// Time coordinate as RFC 3339 text or Unix epoch seconds
pub fn parse_time_coord(value: &Value) -> Result<DateTime<Utc>> {
    if let Some(text) = value.as_str() {
        if let Ok(time) = DateTime::parse_from_rfc3339(text) {
            return Ok(time.with_timezone(&Utc));
        }
    }
    Ok(parse_timestamp(value)?)
}
