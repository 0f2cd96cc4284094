//! Convert command: NGSI payloads to records
//!
//! Reads newline-delimited payloads from files or stdin, converts them and
//! hands the records to TDMQ, a file, or stdout as JSON lines.

use super::shared::{load_configuration, setup_logging};
use crate::app::services::ngsi_converter::NgsiConverter;
use crate::app::services::storage::{FileSink, RecordSink, TdmqStorage};
use crate::app::services::tdmq::TdmqClient;
use crate::cli::args::ConvertArgs;
use crate::config::ServicePathTable;
use crate::error::Result;
use crate::models::Record;
use anyhow::Context;
use colored::*;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertSummary {
    pub messages: usize,
    pub records: usize,
    pub stored_in_tdmq: Option<usize>,
    pub written_to_file: Option<usize>,
}

impl ConvertSummary {
    pub fn skipped(&self) -> usize {
        self.messages.saturating_sub(self.records)
    }
}

pub async fn run_convert(args: ConvertArgs) -> anyhow::Result<ConvertSummary> {
    setup_logging(args.get_log_level());
    debug!("Command line arguments: {:?}", args);

    let mut config = load_configuration(args.config_file.as_deref())?;
    if let Some(url) = &args.tdmq_url {
        config = config.with_tdmq_url(url.clone());
    }
    config.validate()?;

    let payloads = if args.inputs.is_empty() {
        info!("Reading NGSI messages from stdin");
        read_lines(tokio::io::stdin()).await?
    } else {
        read_inputs(&args.inputs).await?
    };

    let records = convert_payloads(args.cached, config.service_paths.clone(), &payloads)?;
    let mut summary = ConvertSummary {
        messages: payloads.len(),
        records: records.len(),
        ..Default::default()
    };

    if args.tdmq_url.is_some() || (args.output.is_none() && config.tdmq.url.is_some()) {
        let client = TdmqClient::new(config.require_tdmq_url()?, config.http.timeout())?;
        let stored = TdmqStorage::new(client)
            .write(&records)
            .await
            .context("Failed to store measures in TDMQ")?;
        summary.stored_in_tdmq = Some(stored);
    }

    if let Some(path) = &args.output {
        let sink = FileSink::new(path.clone())?;
        let written = sink
            .write(&records)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        summary.written_to_file = Some(written);
    }

    if summary.stored_in_tdmq.is_none() && summary.written_to_file.is_none() {
        write_json_lines(&records).await?;
    }

    print_summary(&summary, args.output.as_ref());
    Ok(summary)
}

/// Convert with a fresh descriptor per record, or one shared per sensor name
pub fn convert_payloads(
    cached: bool,
    service_paths: ServicePathTable,
    payloads: &[String],
) -> Result<Vec<Record>> {
    let records = if cached {
        NgsiConverter::cached(service_paths).convert(payloads)?
    } else {
        NgsiConverter::new(service_paths).convert(payloads)?
    };
    Ok(records)
}

/// Non-blank lines of every file matching the given paths or glob patterns
pub async fn read_inputs(patterns: &[String]) -> anyhow::Result<Vec<String>> {
    let mut payloads = Vec::new();

    for path in expand_patterns(patterns)? {
        debug!("Reading {}", path.display());
        let file = tokio::fs::File::open(&path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let lines = read_lines(file)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        info!("Read {} messages from {}", lines.len(), path.display());
        payloads.extend(lines);
    }

    Ok(payloads)
}

fn expand_patterns(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        let before = paths.len();
        for entry in glob::glob(pattern).with_context(|| format!("Invalid pattern '{}'", pattern))? {
            let path = entry.context("Failed to read matched path")?;
            if path.is_file() {
                paths.push(path);
            }
        }
        if paths.len() == before {
            anyhow::bail!("No input files match '{}'", pattern);
        }
    }

    Ok(paths)
}

async fn read_lines<R>(reader: R) -> std::io::Result<Vec<String>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut payloads = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if !line.trim().is_empty() {
            payloads.push(line);
        }
    }
    Ok(payloads)
}

async fn write_json_lines(records: &[Record]) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    for record in records {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        stdout.write_all(line.as_bytes()).await?;
    }
    stdout.flush().await?;
    Ok(())
}

fn print_summary(summary: &ConvertSummary, output: Option<&PathBuf>) {
    eprintln!();
    eprintln!("{}", "Conversion Summary".bold().green());
    eprintln!("{}", "==================".green());
    eprintln!("Messages read:     {}", summary.messages.to_string().cyan());
    eprintln!("Records converted: {}", summary.records.to_string().cyan());

    let skipped = summary.skipped();
    if skipped > 0 {
        eprintln!("Messages skipped:  {}", skipped.to_string().yellow());
    } else {
        eprintln!("Messages skipped:  {}", "0".green());
    }

    if let Some(stored) = summary.stored_in_tdmq {
        eprintln!("Stored in TDMQ:    {}", stored.to_string().cyan());
    }
    if let (Some(written), Some(path)) = (summary.written_to_file, output) {
        eprintln!(
            "Written to file:   {} ({})",
            written.to_string().cyan(),
            path.display()
        );
    }
}
