//! Ingest command: TDMQ time series to CKAN

use super::shared::{load_configuration, setup_logging};
use crate::app::services::ckan::{CkanClient, CkanStorage};
use crate::app::services::ingestion::{IngestionJob, IngestionReport, TimeWindow};
use crate::app::services::tdmq::{TdmqClient, TdmqConsumer};
use crate::cli::args::IngestArgs;
use crate::config::IngestionConfig;
use crate::error::{IngestionError, Result};
use chrono::{DateTime, Utc};
use colored::*;
use std::time::Instant;
use tracing::{debug, info};

pub async fn run_ingest(args: IngestArgs) -> anyhow::Result<IngestionReport> {
    let start_time = Instant::now();
    setup_logging(args.get_log_level());
    info!(
        "Ingesting {} into CKAN dataset {}",
        args.entity_type, args.ckan_dataset
    );

    args.validate()?;
    let config = apply_cli_overrides(load_configuration(args.config_file.as_deref())?, &args);
    config.validate()?;

    let job = build_job(&args, Utc::now())?;
    debug!("Ingestion window {} to {}", job.window.after, job.window.before);

    let tdmq = TdmqClient::new(config.require_tdmq_url()?, config.http.timeout())?;
    let consumer = TdmqConsumer::new(tdmq)
        .with_concurrency(config.tdmq.poll_concurrency())
        .with_progress(!args.quiet);

    let (ckan_url, api_key) = config.require_ckan()?;
    let storage = CkanStorage::new(CkanClient::new(ckan_url, api_key, config.http.timeout())?);

    let report = job.run(&consumer, &storage).await?;
    print_report(&report, &job, start_time);
    Ok(report)
}

fn apply_cli_overrides(mut config: IngestionConfig, args: &IngestArgs) -> IngestionConfig {
    if let Some(url) = &args.tdmq_url {
        config.tdmq.url = Some(url.clone());
    }
    if let Some(url) = &args.ckan_url {
        config.ckan.url = Some(url.clone());
    }
    if let Some(key) = &args.ckan_api_key {
        config.ckan.api_key = Some(key.clone());
    }
    config
}

/// Job described by the arguments, with relative windows evaluated at `now`
pub fn build_job(args: &IngestArgs, now: DateTime<Utc>) -> Result<IngestionJob> {
    let window = match (args.time_delta_before, &args.after, &args.before) {
        (Some(delta), _, _) => delta.window(now)?,
        (None, Some(after), Some(before)) => TimeWindow::from_bounds(after, before)?,
        _ => {
            return Err(IngestionError::configuration("No ingestion window given"));
        }
    };

    let job = IngestionJob {
        entity_type: args.entity_type.clone(),
        bucket: args.bucket,
        op: args.op.clone(),
        window,
        period: args.time_delta_before,
        dataset: args.ckan_dataset.clone(),
        resource: args.ckan_resource.clone(),
        description: args.ckan_description.clone(),
        upsert: args.upsert,
        prune: args.prune,
    };

    // Reject a bad resource pattern before anything is fetched
    job.resource_name()?;
    Ok(job)
}

fn print_report(report: &IngestionReport, job: &IngestionJob, start_time: Instant) {
    println!();
    println!("{}", "Ingestion Summary".bold().green());
    println!("{}", "=================".green());
    println!("Entity type: {}", job.entity_type.cyan());
    println!("Window:      {} to {}", job.window.after, job.window.before);
    println!(
        "Resource:    {}/{}",
        job.dataset,
        report.resource_name.cyan()
    );
    println!("Sources:     {}", report.sources.to_string().cyan());
    if report.rows > 0 {
        println!("Rows:        {}", report.rows.to_string().cyan());
    } else {
        println!("Rows:        {}", "0 (nothing written)".yellow());
    }
    if report.pruned > 0 {
        println!("Pruned:      {}", report.pruned.to_string().yellow());
    }
    println!(
        "Elapsed:     {}",
        indicatif::HumanDuration(start_time.elapsed())
    );
}
