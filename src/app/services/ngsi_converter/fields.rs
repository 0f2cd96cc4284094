//! Attribute classification and value coercion
//!
//! Decides which attributes are metadata, which one carries the observation
//! time and how measurement values are turned into floating point numbers.

use super::ConversionError;
use super::message::NgsiAttribute;
use crate::constants::{NON_PROPERTY_ATTRS, SKIPPED_VALUE_ATTRS};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Whether an attribute name is excluded from a source's property list
pub fn is_non_property(name: &str) -> bool {
    NON_PROPERTY_ATTRS.contains(&name)
}

/// Whether an attribute is never stored as a record value
pub fn is_skipped_value(name: &str) -> bool {
    SKIPPED_VALUE_ATTRS.contains(&name)
}

/// Property names in attribute order, duplicates included
pub fn property_names(attributes: &[NgsiAttribute]) -> Vec<String> {
    attributes
        .iter()
        .filter(|attr| !is_non_property(&attr.name))
        .map(|attr| attr.name.clone())
        .collect()
}

/// Whether a value is non-null and its text form is not blank
pub fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// Coerce a JSON value to `f64`.
///
/// Numbers pass through, strings are parsed after trimming and booleans map to
/// 1.0/0.0. Arrays, objects and null are not numeric.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Interpret a value as Unix epoch seconds (fractions allowed) in UTC.
///
/// Sub-second precision is rounded to the nearest microsecond.
pub fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>, ConversionError> {
    let invalid = || ConversionError::InvalidTimestamp {
        value: value.to_string(),
    };

    let seconds = coerce_f64(value).filter(|s| s.is_finite()).ok_or_else(invalid)?;
    let micros = (seconds * 1_000_000.0).round();
    if !(i64::MIN as f64..=i64::MAX as f64).contains(&micros) {
        return Err(invalid());
    }

    DateTime::from_timestamp_micros(micros as i64).ok_or_else(invalid)
}
