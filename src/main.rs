//! Command-line interface for rds-sync
//!
//! # Usage Examples
//!
//! ## Extraction
//! ```bash
//! # Extract every configured table once
//! rds-sync extract \
//!   --bucket test.complete.food-delivery \
//!   --mysql-host food.cluster.example.com \
//!   --tables location,customer
//! ```
//!
//! ## Log summaries
//! ```bash
//! # Summarize a subscription event saved to a file
//! rds-sync parse-logs --event event.json --summary-bucket my-log-bucket
//!
//! # Or read it from stdin
//! cat event.json | rds-sync parse-logs
//! ```
//!
//! ## Lambda
//! ```bash
//! # Serve the extraction function inside the Lambda runtime
//! rds-sync lambda extract
//!
//! # Serve the log summary function
//! rds-sync lambda parse-logs
//! ```

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use rds_sync::config::{ExtractOpts, LogSummaryOpts, RetryOpts, SourceOpts};
use rds_sync::extract::Extractor;
use rds_sync::logs::{load_event, LogSummaryWriter};
use rds_sync::response::InvocationResponse;
use rds_sync::secrets::SsmSecretProvider;
use rds_sync_storage::S3Store;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rds-sync")]
#[command(about = "Incremental MySQL to S3 extraction and CloudWatch log summaries")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract rows changed since the last run into CSV artifacts
    Extract {
        #[command(flatten)]
        extract: ExtractOpts,

        #[command(flatten)]
        source: SourceOpts,

        #[command(flatten)]
        retry: RetryOpts,
    },

    /// Summarize a CloudWatch Logs subscription event
    #[command(name = "parse-logs")]
    ParseLogs {
        /// Event JSON file, or "-" for stdin
        #[arg(long, default_value = "-")]
        event: String,

        #[command(flatten)]
        summary: LogSummaryOpts,

        #[command(flatten)]
        retry: RetryOpts,
    },

    /// Run a function inside the Lambda runtime
    Lambda {
        #[command(subcommand)]
        function: LambdaFunction,
    },
}

#[derive(Subcommand)]
enum LambdaFunction {
    /// Serve extraction invocations
    Extract {
        #[command(flatten)]
        extract: ExtractOpts,

        #[command(flatten)]
        source: SourceOpts,

        #[command(flatten)]
        retry: RetryOpts,
    },

    /// Serve CloudWatch Logs subscription invocations
    #[command(name = "parse-logs")]
    ParseLogs {
        #[command(flatten)]
        summary: LogSummaryOpts,

        #[command(flatten)]
        retry: RetryOpts,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            extract,
            source,
            retry,
        } => {
            let extractor = build_extractor(extract, source, &retry).await;
            let response = extractor.invoke(Utc::now().naive_utc()).await;
            finish(response)?;
        }
        Commands::ParseLogs {
            event,
            summary,
            retry,
        } => {
            let raw = load_event(&event)?;
            let writer = build_log_writer(&summary, &retry).await;
            let response = writer.handle_raw_event(raw, Utc::now()).await;
            finish(response)?;
        }
        Commands::Lambda { function } => match function {
            LambdaFunction::Extract {
                extract,
                source,
                retry,
            } => {
                let extractor = build_extractor(extract, source, &retry).await;
                rds_sync::lambda::run_extract(extractor)
                    .await
                    .map_err(|e| anyhow::anyhow!("Lambda runtime failed: {e}"))?;
            }
            LambdaFunction::ParseLogs { summary, retry } => {
                let writer = build_log_writer(&summary, &retry).await;
                rds_sync::lambda::run_parse_logs(writer)
                    .await
                    .map_err(|e| anyhow::anyhow!("Lambda runtime failed: {e}"))?;
            }
        },
    }

    Ok(())
}

async fn build_extractor(
    extract: ExtractOpts,
    source: SourceOpts,
    retry: &RetryOpts,
) -> Extractor<S3Store> {
    let policy = retry.policy();
    let store = S3Store::from_env().await;
    let secrets = SsmSecretProvider::from_env(policy.operation_timeout).await;
    Extractor::new(store, Arc::new(secrets), extract, source, policy)
}

async fn build_log_writer(summary: &LogSummaryOpts, retry: &RetryOpts) -> LogSummaryWriter<S3Store> {
    let store = S3Store::from_env().await;
    LogSummaryWriter::new(store, summary.target(), retry.policy())
}

fn finish(response: InvocationResponse) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&response).context("Failed to render response")?;
    println!("{json}");
    if !response.is_success() {
        anyhow::bail!("Invocation failed with status {}", response.status_code);
    }
    Ok(())
}
