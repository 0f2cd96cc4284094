use super::RecordSink;
use crate::app::services::tdmq::{Measure, TdmqClient};
use crate::error::Result;
use crate::models::Record;
use tracing::{info, warn};

/// Sink posting records to TDMQ as measures
#[derive(Debug, Clone)]
pub struct TdmqStorage {
    client: TdmqClient,
}

impl TdmqStorage {
    pub fn new(client: TdmqClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &TdmqClient {
        &self.client
    }
}

impl RecordSink for TdmqStorage {
    async fn write(&self, records: &[Record]) -> Result<usize> {
        let measures: Vec<Measure> = records
            .iter()
            .filter_map(|record| {
                let measure = Measure::from_record(record);
                if measure.is_none() {
                    warn!(
                        "Skipping record of {} without timestamp",
                        record.source_name()
                    );
                }
                measure
            })
            .collect();

        if measures.is_empty() {
            return Ok(0);
        }

        self.client.post_measures(&measures).await?;
        info!("Stored {} measures in TDMQ", measures.len());
        Ok(measures.len())
    }
}
