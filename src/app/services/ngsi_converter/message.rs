//! Typed view of an NGSI notification payload

use super::ConversionError;
use serde::Deserialize;
use serde_json::{Map, Value};

/// A decoded NGSI message
///
/// Only the parts the converter reads are modelled; unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct NgsiMessage {
    /// Sequence of single-key header objects
    #[serde(default)]
    pub headers: Vec<Map<String, Value>>,
    pub body: NgsiBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NgsiBody {
    pub id: String,
    #[serde(default)]
    pub attributes: Vec<NgsiAttribute>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NgsiAttribute {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl NgsiMessage {
    /// Decode a message from its JSON text
    pub fn parse(payload: &str) -> Result<Self, ConversionError> {
        Ok(serde_json::from_str(payload)?)
    }

    pub fn attributes(&self) -> &[NgsiAttribute] {
        &self.body.attributes
    }
}

impl NgsiAttribute {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}
