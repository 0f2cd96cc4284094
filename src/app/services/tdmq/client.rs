//! HTTP client for the TDMQ REST API

use super::models::{Measure, TdmqSource, TimeSeriesResponse};
use crate::error::{IngestionError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// Aggregation request for a source's time series
#[derive(Debug, Clone, PartialEq)]
pub struct TimeseriesQuery {
    pub after: DateTime<Utc>,
    pub before: DateTime<Utc>,
    /// Bucket width in seconds
    pub bucket: f64,
    /// Aggregation operation, e.g. `avg`
    pub op: String,
}

impl TimeseriesQuery {
    fn params(&self) -> [(&'static str, String); 4] {
        [
            ("after", self.after.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("before", self.before.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("bucket", self.bucket.to_string()),
            ("op", self.op.clone()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct TdmqClient {
    http: Client,
    base_url: String,
}

impl TdmqClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Sources registered for an entity type
    pub async fn sources(&self, entity_type: &str) -> Result<Vec<TdmqSource>> {
        let endpoint = self.endpoint("sources");
        debug!("GET {} entity_type={}", endpoint, entity_type);

        let response = self
            .http
            .get(&endpoint)
            .query(&[("entity_type", entity_type)])
            .send()
            .await?;
        Ok(check_status(&endpoint, response).await?.json().await?)
    }

    /// Aggregated time series of one source
    pub async fn timeseries(
        &self,
        tdmq_id: &str,
        query: &TimeseriesQuery,
    ) -> Result<TimeSeriesResponse> {
        let endpoint = self.endpoint(&format!("sources/{}/timeseries", tdmq_id));
        debug!("GET {} {:?}", endpoint, query);

        let response = self
            .http
            .get(&endpoint)
            .query(&query.params())
            .send()
            .await?;
        Ok(check_status(&endpoint, response).await?.json().await?)
    }

    /// Store measures
    pub async fn post_measures(&self, measures: &[Measure]) -> Result<()> {
        let endpoint = self.endpoint("measures");
        debug!("POST {} ({} measures)", endpoint, measures.len());

        let response = self.http.post(&endpoint).json(measures).send().await?;
        check_status(&endpoint, response).await?;
        Ok(())
    }
}

async fn check_status(endpoint: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            debug!("Could not read error body from {}: {}", endpoint, e);
            String::new()
        }
    };
    Err(IngestionError::Api {
        service: "TDMQ",
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body,
    })
}
