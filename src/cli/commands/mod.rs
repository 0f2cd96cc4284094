//! Command implementations for the CLI
//!
//! Each command lives in its own module:
//! - `convert`: NGSI payloads to records in TDMQ, a file or stdout
//! - `ingest`: aggregated TDMQ series to a CKAN resource

pub mod convert;
pub mod ingest;
pub mod shared;

pub use convert::ConvertSummary;

use crate::cli::args::{Args, Commands};

/// Dispatch to the subcommand handler
pub async fn run(args: Args) -> anyhow::Result<()> {
    match args.command {
        Some(Commands::Convert(convert_args)) => {
            convert::run_convert(convert_args).await?;
        }
        Some(Commands::Ingest(ingest_args)) => {
            ingest::run_ingest(ingest_args).await?;
        }
        None => anyhow::bail!("No command given (use convert or ingest)"),
    }
    Ok(())
}
