//! Polling of aggregated time series for every source of an entity type

use super::client::{TdmqClient, TimeseriesQuery};
use super::models::{TdmqSource, TimeSeries};
use crate::app::services::ingestion::TimeWindow;
use crate::error::Result;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct TdmqConsumer {
    client: TdmqClient,
    concurrency: usize,
    show_progress: bool,
}

impl TdmqConsumer {
    pub fn new(client: TdmqClient) -> Self {
        Self {
            client,
            concurrency: crate::constants::DEFAULT_POLL_CONCURRENCY,
            show_progress: false,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn client(&self) -> &TdmqClient {
        &self.client
    }

    /// Fetch the series of every source of `entity_type` over `window`.
    ///
    /// Output order follows the order TDMQ lists the sources in.
    pub async fn poll(
        &self,
        entity_type: &str,
        bucket: f64,
        op: &str,
        window: &TimeWindow,
    ) -> Result<Vec<TimeSeries>> {
        let sources = self.client.sources(entity_type).await?;
        info!(
            "Polling {} {} sources from {} to {}",
            sources.len(),
            entity_type,
            window.after,
            window.before
        );

        let query = TimeseriesQuery {
            after: window.after,
            before: window.before,
            bucket,
            op: op.to_string(),
        };

        let progress_bar = self
            .show_progress
            .then(|| Self::create_progress_bar(sources.len() as u64));

        let results: Vec<Result<TimeSeries>> = stream::iter(sources.iter())
            .map(|source| self.fetch(source, &query, progress_bar.as_ref()))
            .buffered(self.concurrency)
            .collect()
            .await;

        if let Some(pb) = progress_bar {
            pb.finish_with_message("Time series fetched");
        }

        results.into_iter().collect()
    }

    async fn fetch(
        &self,
        source: &TdmqSource,
        query: &TimeseriesQuery,
        progress_bar: Option<&ProgressBar>,
    ) -> Result<TimeSeries> {
        let response = self.client.timeseries(&source.tdmq_id, query).await?;
        let series = TimeSeries::from_response(source, response)?;
        debug!(
            "Fetched {} points for source {}",
            series.len(),
            series.source_id
        );

        if let Some(pb) = progress_bar {
            pb.inc(1);
        }
        Ok(series)
    }

    fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message("Fetching time series...");
        pb
    }
}
