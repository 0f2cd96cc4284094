//! Core data structures for NGSI ingestion.
//!
//! Defines entity types, geometries, sensor descriptors and the normalized
//! observation record produced by the converter and consumed by the sinks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Domain meaning of a sensor, e.g. `("WeatherObserver", "Station")`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityType {
    pub category: String,
    pub subcategory: String,
}

impl EntityType {
    pub fn new(category: impl Into<String>, subcategory: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: subcategory.into(),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.subcategory)
    }
}

/// Geographic location of a sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { latitude: f64, longitude: f64 },
}

impl Geometry {
    pub fn point(latitude: f64, longitude: f64) -> Self {
        Geometry::Point {
            latitude,
            longitude,
        }
    }

    /// GeoJSON representation (`coordinates` are longitude first)
    pub fn to_geojson(&self) -> serde_json::Value {
        match self {
            Geometry::Point {
                latitude,
                longitude,
            } => serde_json::json!({
                "type": "Point",
                "coordinates": [longitude, latitude],
            }),
        }
    }
}

/// Sensor descriptor shared by every record the sensor produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub entity_type: EntityType,
    pub geometry: Geometry,
    pub properties: Vec<String>,
}

impl Source {
    pub fn new(
        name: impl Into<String>,
        entity_type: EntityType,
        geometry: Geometry,
        properties: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            entity_type,
            geometry,
            properties,
        }
    }
}

/// One observation event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Observation time, `None` when the message carried no `timestamp`
    pub timestamp: Option<DateTime<Utc>>,
    pub source: Arc<Source>,
    pub values: BTreeMap<String, f64>,
}

impl Record {
    pub fn new(
        timestamp: Option<DateTime<Utc>>,
        source: Arc<Source>,
        values: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            timestamp,
            source,
            values,
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_equality_by_value() {
        let a = EntityType::new("WeatherObserver", "Station");
        let b = EntityType::new("WeatherObserver".to_string(), "Station".to_string());
        assert_eq!(a, b);
        assert_ne!(a, EntityType::new("EnergyConsumptionMonitor", "Station"));
        assert_eq!(a.to_string(), "WeatherObserver/Station");
    }

    #[test]
    fn test_point_geojson_is_longitude_first() {
        let geometry = Geometry::point(39.2, 9.1);
        let json = geometry.to_geojson();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"][0], 9.1);
        assert_eq!(json["coordinates"][1], 39.2);
    }
}
