//! Sensor identity, geometry and service path extraction

use super::ConversionError;
use super::fields::coerce_f64;
use super::message::NgsiAttribute;
use crate::constants::{LATITUDE_ATTR, LONGITUDE_ATTR, MESSAGE_ID_PATTERN, SERVICE_PATH_HEADER};
use crate::models::Geometry;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static MESSAGE_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MESSAGE_ID_PATTERN).expect("message id pattern must compile"));

/// Identity decomposed from `body.id`
///
/// The capture groups of the id pattern are named `Type`, `Edge`, `Node` and
/// `Sensor`, but production ids carry the node in `Edge` and the station in
/// `Node`. Fields here follow the position: group 2 is the node, group 3 the
/// station, group 4 the sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorIdentity {
    pub type_tag: String,
    pub node: String,
    pub station: String,
    pub sensor: String,
}

impl SensorIdentity {
    /// Parse an id such as `WeatherObserved:Edge-CFA703F4.Station01.TempSensor`
    pub fn parse(id: &str) -> Result<Self, ConversionError> {
        let captures =
            MESSAGE_ID_REGEX
                .captures(id)
                .ok_or_else(|| ConversionError::MalformedIdentity {
                    id: id.to_string(),
                })?;

        Ok(Self {
            type_tag: captures["Type"].to_string(),
            node: captures["Edge"].to_string(),
            station: captures["Node"].to_string(),
            sensor: captures["Sensor"].to_string(),
        })
    }

    /// Deployment-wide sensor name, `"{station}.{sensor}"`
    pub fn sensor_name(&self) -> String {
        format!("{}.{}", self.station, self.sensor)
    }
}

/// Build a point from the `latitude`/`longitude` attributes.
///
/// When a coordinate appears more than once the last occurrence wins.
pub fn extract_geometry(attributes: &[NgsiAttribute]) -> Result<Geometry, ConversionError> {
    let mut latitude = None;
    let mut longitude = None;

    for attr in attributes {
        let slot = match attr.name.as_str() {
            LATITUDE_ATTR => &mut latitude,
            LONGITUDE_ATTR => &mut longitude,
            _ => continue,
        };
        let value = coerce_f64(&attr.value).ok_or_else(|| ConversionError::InvalidCoordinate {
            name: attr.name.clone(),
            value: attr.value.to_string(),
        })?;
        *slot = Some(value);
    }

    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Ok(Geometry::point(latitude, longitude)),
        _ => Err(ConversionError::MissingGeometry),
    }
}

/// Value of the first `fiware-servicePath` header
pub fn service_path(headers: &[Map<String, Value>]) -> Result<String, ConversionError> {
    headers
        .iter()
        .find_map(|header| header.get(SERVICE_PATH_HEADER))
        .map(|value| match value {
            Value::String(path) => path.clone(),
            other => other.to_string(),
        })
        .ok_or(ConversionError::MissingServicePath)
}
