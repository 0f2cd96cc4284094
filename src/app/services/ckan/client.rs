//! CKAN action API client

use crate::error::{IngestionError, Result};
use reqwest::{Client, header::AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Resource entry of a CKAN dataset
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CkanResource {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Every other key, including custom extras
    #[serde(flatten)]
    pub extras: BTreeMap<String, Value>,
}

impl CkanResource {
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extras.get(key)?.as_str()
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

/// Column declaration for `datastore_create`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatastoreField {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: &'static str,
}

impl DatastoreField {
    pub fn new(id: impl Into<String>, field_type: &'static str) -> Self {
        Self {
            id: id.into(),
            field_type,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ActionResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Value,
}

#[derive(Debug, Deserialize)]
struct PackageShow {
    #[serde(default)]
    resources: Vec<CkanResource>,
}

#[derive(Debug, Deserialize)]
struct DatastoreCreated {
    resource_id: String,
}

#[derive(Debug, Clone)]
pub struct CkanClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl CkanClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Invoke an action and return its `result`
    pub async fn action(&self, action: &str, payload: &Value) -> Result<Value> {
        let endpoint = format!("{}/api/3/action/{}", self.base_url, action);
        debug!("POST {}", endpoint);

        let response = self
            .http
            .post(&endpoint)
            .header(AUTHORIZATION, &self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // CKAN reports action failures inside the envelope, often with a 4xx status
        match serde_json::from_str::<ActionResponse>(&body) {
            Ok(envelope) if envelope.success => Ok(envelope.result),
            Ok(envelope) => Err(IngestionError::CkanAction {
                action: action.to_string(),
                message: describe_error(&envelope.error),
            }),
            Err(_) => Err(IngestionError::Api {
                service: "CKAN",
                endpoint,
                status: status.as_u16(),
                body,
            }),
        }
    }

    /// Resources of a dataset (`package_show`)
    pub async fn package_resources(&self, dataset: &str) -> Result<Vec<CkanResource>> {
        let result = self.action("package_show", &json!({ "id": dataset })).await?;
        let package: PackageShow = serde_json::from_value(result)?;
        Ok(package.resources)
    }

    /// Create a resource with its datastore table; returns the new resource id
    pub async fn datastore_create(
        &self,
        resource: &Value,
        fields: &[DatastoreField],
        records: &[Value],
    ) -> Result<String> {
        let payload = json!({
            "resource": resource,
            "fields": fields,
            "records": records,
            "force": true,
        });
        let result = self.action("datastore_create", &payload).await?;
        let created: DatastoreCreated = serde_json::from_value(result)?;
        Ok(created.resource_id)
    }

    pub async fn resource_delete(&self, resource_id: &str) -> Result<()> {
        self.action("resource_delete", &json!({ "id": resource_id }))
            .await?;
        Ok(())
    }
}

fn describe_error(error: &Value) -> String {
    match error {
        Value::Null => "unknown error".to_string(),
        Value::Object(map) => match map.get("message").and_then(Value::as_str) {
            Some(message) => message.to_string(),
            None => error.to_string(),
        },
        other => other.to_string(),
    }
}
