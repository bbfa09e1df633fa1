//! Unload step: exports a query to object storage, partitioned by a column.
//!
//! Reads the lambda event (`CLUSTER_ID`, `SQL_QUERY`, `S3_PATH`, `REDSHIFT_ROLE`,
//! `PARTITION_BY_COLUMN`) from `--event` or stdin and prints `{"status", "s3_path"}`.

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use sales_forecast_pipeline::logging;
use sales_forecast_pipeline::unload::{
    handle_event, HttpDataApiClient, PollMode, TriggerConfig, UnloadEvent,
};

#[derive(Parser, Debug)]
#[command(about = "Run a partitioned UNLOAD through the data API and wait for it")]
struct Args {
    /// JSON event file, read from stdin when omitted
    #[arg(short, long)]
    event: Option<PathBuf>,

    /// Data API endpoint
    #[arg(long, env = "DATA_API_ENDPOINT")]
    endpoint: String,

    /// Bearer token sent to the endpoint
    #[arg(long, env = "DATA_API_TOKEN")]
    token: Option<String>,

    /// TOML file with poll settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Poll until the statement finishes instead of reporting after the first wait
    #[arg(long)]
    until_terminal: bool,

    #[arg(long)]
    poll_interval_secs: Option<f64>,

    /// Give up after this many seconds
    #[arg(long)]
    timeout_secs: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    logging::init("sales_forecast_pipeline=info,unload=info");

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TriggerConfig::from_file(path)
            .with_context(|| format!("Failed to load config {path:?}"))?,
        None => TriggerConfig::default(),
    };
    if args.until_terminal {
        config.mode = PollMode::UntilTerminal;
    }
    if let Some(secs) = args.poll_interval_secs {
        config.poll_interval = Duration::try_from_secs_f64(secs)?;
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout = Some(Duration::try_from_secs_f64(secs)?);
    }
    config.validate()?;

    let raw = match &args.event {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event {path:?}"))?,
        None => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            raw
        }
    };
    let event: UnloadEvent = serde_json::from_str(&raw).context("Invalid unload event")?;

    let client = HttpDataApiClient::new(args.endpoint, args.token.as_deref())?;
    let response = handle_event(client, config, event)?;

    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
