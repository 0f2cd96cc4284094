use clap::{CommandFactory, Parser};
use std::process;
use tdm_ingestion::cli::{args::Args, commands};

fn main() {
    let args = Args::parse();

    // Without a subcommand, show help
    if args.command.is_none() {
        if let Err(e) = Args::command().print_help() {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
        println!();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        tokio::select! {
            result = commands::run(args) => result,
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => {
                        eprintln!("\nReceived CTRL+C, shutting down...");
                        Err(tdm_ingestion::IngestionError::interrupted("Interrupted by user").into())
                    }
                    Err(e) => Err(anyhow::anyhow!("Failed to install CTRL+C handler: {}", e)),
                }
            }
        }
    });

    if let Err(error) = result {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }
}
