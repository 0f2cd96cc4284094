//! Shared fixtures for service tests: in-process HTTP servers, sample data
//! and captured log output

use crate::models::{EntityType, Geometry, Record, Source};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tracing::subscriber::DefaultGuard;

/// Request bodies received by a test server, in arrival order
pub type Captured = Arc<Mutex<Vec<Value>>>;

pub fn captured() -> Captured {
    Arc::new(Mutex::new(Vec::new()))
}

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn weather_source(name: &str) -> Arc<Source> {
    Arc::new(Source::new(
        name,
        EntityType::new("WeatherObserver", "Station"),
        Geometry::point(39.2, 9.1),
        vec!["temperature".to_string(), "humidity".to_string()],
    ))
}

pub fn record(
    source: &Arc<Source>,
    timestamp: Option<DateTime<Utc>>,
    values: &[(&str, f64)],
) -> Record {
    let values: BTreeMap<String, f64> = values
        .iter()
        .map(|(name, value)| (name.to_string(), *value))
        .collect();
    Record::new(timestamp, Arc::clone(source), values)
}

/// Formatted log output of the current thread
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Lines logged at `level`, e.g. `"ERROR"`
    pub fn lines_at(&self, level: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.contains(level))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Capture DEBUG and above on this thread until the guard is dropped
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
