//! File sink writing records in long format through Polars
//!
//! One row per (record, property) with columns `timestamp`, `source`,
//! `category`, `subcategory`, `latitude`, `longitude`, `property`, `value`.
//! A record without values still gets one row, with null `property` and
//! `value`, so every written record can be found in the file.

use super::RecordSink;
use crate::error::{IngestionError, Result};
use crate::models::{Geometry, Record};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Parquet,
    Csv,
}

impl OutputFormat {
    /// Format implied by a file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("parquet") => Ok(OutputFormat::Parquet),
            Some("csv") => Ok(OutputFormat::Csv),
            _ => Err(IngestionError::UnsupportedOutput {
                path: path.to_path_buf(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
    format: OutputFormat,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = OutputFormat::from_path(&path)?;
        Ok(Self { path, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn write_dataframe(path: &Path, format: OutputFormat, mut df: DataFrame) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;

        match format {
            OutputFormat::Parquet => {
                ParquetWriter::new(file)
                    .with_compression(ParquetCompression::Snappy)
                    .with_statistics(StatisticsOptions::full())
                    .finish(&mut df)?;
            }
            OutputFormat::Csv => {
                CsvWriter::new(&mut file)
                    .include_header(true)
                    .finish(&mut df)?;
            }
        }
        Ok(())
    }
}

impl RecordSink for FileSink {
    /// Writes the whole batch to the file, replacing previous content
    async fn write(&self, records: &[Record]) -> Result<usize> {
        let df = records_to_dataframe(records)?;
        debug!("Writing {} rows to {}", df.height(), self.path.display());

        let path = self.path.clone();
        let format = self.format;
        tokio::task::spawn_blocking(move || Self::write_dataframe(&path, format, df)).await??;

        info!(
            "Wrote {} records to {}",
            records.len(),
            self.path.display()
        );
        Ok(records.len())
    }
}

/// Long-format frame of a record batch; missing timestamps stay null
pub fn records_to_dataframe(records: &[Record]) -> Result<DataFrame> {
    let rows = records.iter().map(|r| r.values.len().max(1)).sum();

    let mut timestamps: Vec<Option<i64>> = Vec::with_capacity(rows);
    let mut sources: Vec<&str> = Vec::with_capacity(rows);
    let mut categories: Vec<&str> = Vec::with_capacity(rows);
    let mut subcategories: Vec<&str> = Vec::with_capacity(rows);
    let mut latitudes: Vec<f64> = Vec::with_capacity(rows);
    let mut longitudes: Vec<f64> = Vec::with_capacity(rows);
    let mut properties: Vec<Option<&str>> = Vec::with_capacity(rows);
    let mut values: Vec<Option<f64>> = Vec::with_capacity(rows);

    for record in records {
        let source = &record.source;
        let Geometry::Point {
            latitude,
            longitude,
        } = source.geometry;

        let measurements: Vec<(Option<&str>, Option<f64>)> = if record.values.is_empty() {
            vec![(None, None)]
        } else {
            record
                .values
                .iter()
                .map(|(property, value)| (Some(property.as_str()), Some(*value)))
                .collect()
        };

        for (property, value) in measurements {
            timestamps.push(record.timestamp.map(|t| t.timestamp_millis()));
            sources.push(&source.name);
            categories.push(&source.entity_type.category);
            subcategories.push(&source.entity_type.subcategory);
            latitudes.push(latitude);
            longitudes.push(longitude);
            properties.push(property);
            values.push(value);
        }
    }

    let timestamp = Series::new("timestamp".into(), timestamps)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

    let df = DataFrame::new(vec![
        Column::from(timestamp),
        Column::new("source".into(), sources),
        Column::new("category".into(), categories),
        Column::new("subcategory".into(), subcategories),
        Column::new("latitude".into(), latitudes),
        Column::new("longitude".into(), longitudes),
        Column::new("property".into(), properties),
        Column::new("value".into(), values),
    ])?;
    Ok(df)
}
