//! Test suite for the CKAN collaborator
//!
//! A small in-process imitation of the CKAN action API keeps one dataset's
//! resources in memory and records every call.


use crate::app::services::ckan::{CkanClient, CkanStorage};
use crate::app::services::tdmq::TimeSeries;
use crate::app::services::test_support::{Captured, captured, spawn_server, utc};
use crate::models::Geometry;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::post,
};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const API_KEY: &str = "test-api-key";
pub const DATASET: &str = "cagliari-weather";

#[derive(Clone)]
pub struct CkanState {
    /// `{"action": .., "auth": .., "payload": ..}` per call
    pub calls: Captured,
    pub resources: Captured,
    next_id: Arc<Mutex<usize>>,
    /// Reject every `datastore_create` with a validation error
    pub fail_create: bool,
}

impl CkanState {
    pub fn with_resources(resources: Vec<Value>) -> Self {
        Self {
            calls: captured(),
            resources: Arc::new(Mutex::new(resources)),
            next_id: Arc::new(Mutex::new(0)),
            fail_create: false,
        }
    }

    pub fn actions(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| call["action"].as_str().map(str::to_string))
            .collect()
    }

    pub fn resource_names(&self) -> Vec<String> {
        self.resources
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r["name"].as_str().map(str::to_string))
            .collect()
    }
}

impl Default for CkanState {
    fn default() -> Self {
        Self::with_resources(Vec::new())
    }
}

pub async fn spawn_ckan(state: CkanState) -> String {
    let router = Router::new()
        .route("/api/3/action/{action}", post(action))
        .with_state(state);
    spawn_server(router).await
}

pub fn client(url: &str) -> CkanClient {
    CkanClient::new(url, API_KEY, Duration::from_secs(5)).unwrap()
}

pub fn storage(url: &str) -> CkanStorage {
    CkanStorage::new(client(url))
}

/// Existing resource entry carrying pruning extras
pub fn resource(id: &str, name: &str, period: Option<&str>, after: &str) -> Value {
    let mut resource = json!({"id": id, "name": name, "tdm_after": after});
    if let Some(period) = period {
        resource["tdm_period"] = json!(period);
    }
    resource
}

pub fn located_series() -> TimeSeries {
    TimeSeries {
        source_id: "Station01.TempSensor".to_string(),
        geometry: Some(Geometry::point(39.2, 9.1)),
        time: vec![utc(2021, 3, 1, 0), utc(2021, 3, 1, 1)],
        data: BTreeMap::from([("temperature".to_string(), vec![Some(20.5), None])]),
    }
}

pub fn unlocated_series() -> TimeSeries {
    TimeSeries {
        source_id: "Station02.TempSensor".to_string(),
        geometry: None,
        time: vec![utc(2021, 3, 1, 0)],
        data: BTreeMap::from([("humidity".to_string(), vec![Some(60.0)])]),
    }
}

fn success(result: Value) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({"success": true, "result": result})),
    )
}

fn failure(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({"success": false, "error": {"message": message}})),
    )
}

async fn action(
    State(state): State<CkanState>,
    Path(action): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.calls.lock().unwrap().push(json!({
        "action": &action,
        "auth": &auth,
        "payload": payload.clone(),
    }));

    if auth != API_KEY {
        return failure(StatusCode::FORBIDDEN, "Access denied");
    }

    match action.as_str() {
        "package_show" if payload["id"] == DATASET => {
            let resources = state.resources.lock().unwrap().clone();
            success(json!({"name": DATASET, "resources": resources}))
        }
        "package_show" => failure(StatusCode::NOT_FOUND, "Not found"),
        "resource_delete" => {
            let mut resources = state.resources.lock().unwrap();
            let before = resources.len();
            resources.retain(|r| r["id"] != payload["id"]);
            if resources.len() == before {
                failure(StatusCode::NOT_FOUND, "Resource was not found.")
            } else {
                success(Value::Null)
            }
        }
        "datastore_create" if state.fail_create => {
            failure(StatusCode::CONFLICT, "Validation Error: bad field type")
        }
        "datastore_create" => {
            let id = {
                let mut next_id = state.next_id.lock().unwrap();
                *next_id += 1;
                format!("created-{}", next_id)
            };
            let mut resource = payload["resource"].clone();
            resource["id"] = json!(id);
            state.resources.lock().unwrap().push(resource);
            success(json!({"resource_id": id}))
        }
        _ => failure(StatusCode::BAD_REQUEST, "Unknown action"),
    }
}
