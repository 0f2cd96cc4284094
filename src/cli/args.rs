//! Command-line argument definitions
//!
//! Two subcommands: `convert` turns NGSI payloads into records and stores
//! them, `ingest` publishes aggregated TDMQ series to CKAN.

use crate::app::services::ingestion::TimeDelta;
use crate::constants::ENTITY_TYPES;
use crate::error::{IngestionError, Result};
use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the TDM ingestion tools
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tdm-ingestion",
    version,
    about = "Convert NGSI sensor messages and publish TDMQ time series to CKAN",
    long_about = "Converts FIWARE NGSI context messages into normalized sensor records \
                  stored in TDMQ or in Parquet/CSV files, and publishes aggregated TDMQ \
                  time series as CKAN datastore resources."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Convert NGSI messages into records
    Convert(ConvertArgs),
    /// Publish aggregated TDMQ time series to CKAN
    Ingest(IngestArgs),
}

/// Arguments for the convert command
#[derive(Debug, Clone, Parser)]
pub struct ConvertArgs {
    /// Files or glob patterns with one NGSI message per line
    ///
    /// Reads standard input when no input is given.
    #[arg(value_name = "INPUT")]
    pub inputs: Vec<String>,

    /// Reuse one sensor descriptor per sensor name
    #[arg(long = "cached", help = "Share sensor descriptors between records")]
    pub cached: bool,

    /// TDMQ base URL to post measures to
    #[arg(long = "tdmq-url", alias = "tdmq_url", value_name = "URL")]
    pub tdmq_url: Option<String>,

    /// Write records to a Parquet or CSV file
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Configuration file (defaults to the user config directory)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Enable verbose logging (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,
}

impl ConvertArgs {
    pub fn get_log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Arguments for the ingest command
#[derive(Debug, Clone, Parser)]
pub struct IngestArgs {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    #[arg(long = "tdmq-url", alias = "tdmq_url", value_name = "URL")]
    pub tdmq_url: Option<String>,

    /// Aggregation bucket in seconds
    #[arg(long = "bucket", value_name = "SECONDS")]
    pub bucket: f64,

    /// Aggregation operation, e.g. avg, sum
    #[arg(long = "op", value_name = "OP")]
    pub op: String,

    /// Relative window before now: today, 1h, 1d, 1w, 1m
    #[arg(
        long = "time-delta-before",
        alias = "time_delta_before",
        value_name = "DELTA",
        conflicts_with_all = ["before", "after"]
    )]
    pub time_delta_before: Option<TimeDelta>,

    /// Window end (RFC 3339 or YYYY-MM-DD)
    #[arg(long = "before", value_name = "TIME")]
    pub before: Option<String>,

    /// Window start (RFC 3339 or YYYY-MM-DD)
    #[arg(long = "after", value_name = "TIME")]
    pub after: Option<String>,

    #[arg(
        long = "entity-type",
        alias = "entity_type",
        value_name = "TYPE",
        value_parser = PossibleValuesParser::new(ENTITY_TYPES.iter().copied())
    )]
    pub entity_type: String,

    #[arg(long = "ckan-url", alias = "ckan_url", value_name = "URL")]
    pub ckan_url: Option<String>,

    #[arg(long = "ckan-api-key", alias = "ckan_api_key", value_name = "KEY")]
    pub ckan_api_key: Option<String>,

    #[arg(long = "ckan-dataset", alias = "ckan_dataset", value_name = "DATASET")]
    pub ckan_dataset: String,

    /// Resource name; strftime fields are expanded with the window start
    /// when a time delta is used
    #[arg(long = "ckan-resource", alias = "ckan_resource", value_name = "NAME")]
    pub ckan_resource: String,

    /// Resource description; %{after} and %{before} are replaced by the
    /// window dates when a time delta is used
    #[arg(
        long = "ckan-description",
        alias = "ckan_description",
        value_name = "TEXT",
        default_value = ""
    )]
    pub ckan_description: String,

    /// Replace an existing resource with the same name
    #[arg(long = "upsert")]
    pub upsert: bool,

    /// With 1w or 1m deltas, delete the daily (and for 1m weekly) resources
    /// the new resource covers
    #[arg(long = "prune")]
    pub prune: bool,

    /// Configuration file (defaults to the user config directory)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Hide the progress bar while polling TDMQ
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl IngestArgs {
    pub fn get_log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }

    /// Validate argument combinations clap cannot express
    pub fn validate(&self) -> Result<()> {
        if self.time_delta_before.is_none() && (self.before.is_none() || self.after.is_none()) {
            return Err(IngestionError::configuration(
                "Either --time-delta-before or both --before and --after are required",
            ));
        }

        if !(self.bucket.is_finite() && self.bucket > 0.0) {
            return Err(IngestionError::configuration(format!(
                "--bucket must be a positive number of seconds, got {}",
                self.bucket
            )));
        }

        if self.ckan_resource.trim().is_empty() {
            return Err(IngestionError::configuration(
                "--ckan-resource must not be empty",
            ));
        }

        Ok(())
    }
}
