//! Test suite for the TDMQ collaborator
//!
//! Requests go to an in-process axum server mimicking the TDMQ REST API.


use crate::app::services::test_support::{Captured, spawn_server};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;

/// Epoch seconds of 2021-03-01T00:00:00Z
pub const MARCH_FIRST: f64 = 1_614_556_800.0;

#[derive(Clone, Default)]
pub struct TdmqState {
    /// `{"path": .., "params": {..}}` for every GET
    pub requests: Captured,
    /// Bodies posted to `/measures`
    pub measures: Captured,
}

pub async fn spawn_tdmq(state: TdmqState) -> String {
    let router = Router::new()
        .route("/sources", get(list_sources))
        .route("/sources/{id}/timeseries", get(timeseries))
        .route("/measures", post(store_measures))
        .with_state(state);
    spawn_server(router).await
}

async fn list_sources(
    State(state): State<TdmqState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let entity_type = params.get("entity_type").cloned();
    state
        .requests
        .lock()
        .unwrap()
        .push(json!({"path": "/sources", "params": params}));

    Json(json!([
        {
            "tdmq_id": "id-1",
            "external_id": "Station01.TempSensor",
            "entity_type": entity_type,
            "default_footprint": {"type": "Point", "coordinates": [9.1, 39.2]}
        },
        {
            "tdmq_id": "id-2",
            "external_id": "Station02.TempSensor",
            "default_footprint": null
        }
    ]))
}

async fn timeseries(
    State(state): State<TdmqState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    state.requests.lock().unwrap().push(json!({
        "path": format!("/sources/{}/timeseries", id),
        "params": params,
    }));

    match id.as_str() {
        "id-1" => {
            // Answer last so ordering depends on the consumer, not on arrival
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(Json(json!({
                "coords": {"time": [MARCH_FIRST, MARCH_FIRST + 3600.0]},
                "data": {"temperature": [20.5, null]}
            })))
        }
        "id-2" => Ok(Json(json!({
            "coords": {"time": ["2021-03-01T00:00:00Z"]},
            "data": {"temperature": [18.0], "humidity": [60.0]}
        }))),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn store_measures(State(state): State<TdmqState>, Json(body): Json<Value>) -> StatusCode {
    state.measures.lock().unwrap().push(body);
    StatusCode::OK
}
