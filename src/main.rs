//! E2E Harness - service readiness gate
//!
//! Waits for the services under test to report healthy before a suite runs.
//! Exits with status 1 when any service fails to become ready.

use clap::Parser;
use e2e_harness::config::HarnessConfig;
use e2e_harness::health::ServiceReadinessAggregator;
use e2e_harness::logging::{init_subscriber, LogFormat};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// E2E Harness - wait for the services under test to become ready
#[derive(Parser, Debug)]
#[command(name = "e2e-harness")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a YAML configuration file (environment variables are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,

    /// Override the per-service readiness budget in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Override the delay between health checks in milliseconds
    #[arg(long)]
    interval_millis: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let format = if args.json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    if let Err(e) = init_subscriber(&args.log_level, format) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    info!("Starting E2E Harness v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => {
            let config = HarnessConfig::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => HarnessConfig::from_env()?,
    };

    if let Some(timeout) = args.timeout_secs {
        config.readiness.timeout_secs = timeout;
    }
    if let Some(interval) = args.interval_millis {
        config.readiness.interval_millis = interval;
    }
    config.validate()?;

    let services = &config.services;
    info!(
        auth = %services.auth,
        user = %services.user,
        message_broker = %services.message_broker,
        notification = %services.notification,
        mailpit = %services.mailpit,
        "Service URLs"
    );

    let aggregator = ServiceReadinessAggregator::from_config(&config.readiness);
    aggregator
        .await_services(&config.readiness_targets(), config.readiness.timeout())
        .await?;

    Ok(())
}
