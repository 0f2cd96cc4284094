//! Integration tests for the TDMQ to CKAN ingestion job
//!
//! A single local server plays both TDMQ (`/tdmq/...`) and CKAN
//! (`/ckan/api/3/action/...`) so a whole run can be observed.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tdm_ingestion::IngestionError;
use tdm_ingestion::app::services::ckan::{CkanClient, CkanStorage};
use tdm_ingestion::app::services::ingestion::{IngestionJob, TimeDelta};
use tdm_ingestion::app::services::tdmq::{TdmqClient, TdmqConsumer};

#[derive(Clone)]
struct Portal {
    resources: Arc<Mutex<Vec<Value>>>,
    actions: Arc<Mutex<Vec<String>>>,
}

async fn sources() -> Json<Value> {
    Json(json!([
        {"tdmq_id": "s1", "external_id": "Station01.Davis",
         "default_footprint": {"type": "Point", "coordinates": [9.1, 39.2]}},
        {"tdmq_id": "s2", "external_id": "Station02.Davis",
         "default_footprint": {"type": "Point", "coordinates": [9.2, 39.3]}}
    ]))
}

async fn timeseries(Path(id): Path<String>) -> Json<Value> {
    let temperature = if id == "s1" { 12.0 } else { 14.0 };
    Json(json!({
        "coords": {"time": ["2021-02-01T00:00:00Z", "2021-02-02T00:00:00Z"]},
        "data": {"temperature": [temperature, temperature + 1.0]}
    }))
}

async fn action(
    State(portal): State<Portal>,
    Path(action): Path<String>,
    Json(payload): Json<Value>,
) -> Json<Value> {
    let call = {
        let mut actions = portal.actions.lock().unwrap();
        actions.push(action.clone());
        actions.len()
    };
    let mut resources = portal.resources.lock().unwrap();

    let result = match action.as_str() {
        "package_show" => json!({"resources": resources.clone()}),
        "resource_delete" => {
            resources.retain(|r| r["id"] != payload["id"]);
            Value::Null
        }
        "datastore_create" => {
            let id = format!("res-{}", call);
            let mut resource = payload["resource"].clone();
            resource["id"] = json!(id);
            resource["row_count"] = json!(payload["records"].as_array().map(Vec::len));
            resources.push(resource);
            json!({"resource_id": id})
        }
        _ => return Json(json!({"success": false, "error": {"message": "unsupported"}})),
    };
    Json(json!({"success": true, "result": result}))
}

async fn spawn_portal(existing: Vec<Value>) -> (String, Portal) {
    let portal = Portal {
        resources: Arc::new(Mutex::new(existing)),
        actions: Arc::new(Mutex::new(Vec::new())),
    };
    let router = Router::new()
        .route("/tdmq/sources", get(sources))
        .route("/tdmq/sources/{id}/timeseries", get(timeseries))
        .route("/ckan/api/3/action/{action}", post(action))
        .with_state(portal.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    (url, portal)
}

fn daily(id: &str, date: &str) -> Value {
    json!({"id": id, "name": format!("weather-{}", date), "tdm_period": "1d", "tdm_after": date})
}

fn monthly_job(upsert: bool) -> IngestionJob {
    let now = Utc.with_ymd_and_hms(2021, 3, 15, 6, 0, 0).unwrap();
    IngestionJob {
        entity_type: "WeatherObserver".to_string(),
        bucket: 86400.0,
        op: "avg".to_string(),
        window: TimeDelta::OneMonth.window(now).unwrap(),
        period: Some(TimeDelta::OneMonth),
        dataset: "cagliari-weather".to_string(),
        resource: "weather-%Y-%m".to_string(),
        description: "Daily averages from %{after} to %{before}".to_string(),
        upsert,
        prune: true,
    }
}

fn collaborators(url: &str) -> (TdmqConsumer, CkanStorage) {
    let timeout = Duration::from_secs(5);
    let consumer = TdmqConsumer::new(TdmqClient::new(&format!("{}/tdmq", url), timeout).unwrap());
    let storage = CkanStorage::new(
        CkanClient::new(&format!("{}/ckan", url), "api-key", timeout).unwrap(),
    );
    (consumer, storage)
}

#[tokio::test]
async fn test_monthly_run_publishes_and_prunes() {
    let (url, portal) = spawn_portal(vec![
        daily("d1", "2021-02-01"),
        daily("d2", "2021-02-28"),
        daily("d3", "2021-03-01"),
        json!({"id": "w1", "name": "weekly-2021-02-08", "tdm_period": "1w", "tdm_after": "2021-02-08"}),
    ])
    .await;
    let (consumer, storage) = collaborators(&url);

    let report = monthly_job(false).run(&consumer, &storage).await.unwrap();

    assert_eq!(report.resource_name, "weather-2021-02");
    assert_eq!(report.sources, 2);
    assert_eq!(report.rows, 4);
    assert_eq!(report.pruned, 3);

    let resources = portal.resources.lock().unwrap();
    let names: Vec<&str> = resources.iter().filter_map(|r| r["name"].as_str()).collect();
    assert_eq!(names, vec!["weather-2021-03-01", "weather-2021-02"]);

    let created = &resources[1];
    assert_eq!(
        created["description"],
        "Daily averages from 2021-02-01 to 2021-03-01"
    );
    assert_eq!(created["tdm_period"], "1m");
    assert_eq!(created["tdm_after"], "2021-02-01");
    assert_eq!(created["row_count"], 4);
}

#[tokio::test]
async fn test_rerun_requires_upsert() {
    let (url, portal) = spawn_portal(Vec::new()).await;
    let (consumer, storage) = collaborators(&url);

    monthly_job(false).run(&consumer, &storage).await.unwrap();

    let second = monthly_job(false).run(&consumer, &storage).await;
    assert!(matches!(second, Err(IngestionError::ResourceExists { .. })));

    let third = monthly_job(true).run(&consumer, &storage).await.unwrap();
    assert_eq!(third.rows, 4);
    assert_eq!(portal.resources.lock().unwrap().len(), 1);
    assert!(
        portal
            .actions
            .lock()
            .unwrap()
            .contains(&"resource_delete".to_string())
    );
}
