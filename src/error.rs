//! Error handling for ingestion operations.
//!
//! Provides the crate-level error type covering configuration, I/O,
//! sink/source HTTP failures and file output, plus the conversion error
//! re-exported from the NGSI converter.

use std::path::PathBuf;
use thiserror::Error;

pub use crate::app::services::ngsi_converter::ConversionError;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("{service} request to {endpoint} failed with status {status}: {body}")]
    Api {
        service: &'static str,
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("CKAN action {action} failed: {message}")]
    CkanAction { action: String, message: String },

    #[error("Resource '{name}' already exists in dataset '{dataset}' (use --upsert to replace it)")]
    ResourceExists { dataset: String, name: String },

    #[error("Unsupported output format for file: {path}")]
    UnsupportedOutput { path: PathBuf },

    #[error("File writer task failed: {0}")]
    WriterTask(#[from] tokio::task::JoinError),

    #[error("Processing interrupted: {reason}")]
    Interrupted { reason: String },
}

impl IngestionError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn interrupted(reason: impl Into<String>) -> Self {
        Self::Interrupted {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestionError>;
