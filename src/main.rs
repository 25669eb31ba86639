//! sysalert - host resource monitor with rate-limited email alerts.
//!
//! Samples CPU, memory, disk and network usage, classifies each sample
//! against warning / critical thresholds, and emails at most one alert per
//! level per re-send interval.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use sysalert::logging::{init_logging, LogRotation};
use sysalert::selftest::run_self_test;
use sysalert::shutdown::wait_for_signal;
use sysalert::{EmailNotifier, JsonHistoryStore, Monitor, MonitorConfig, SystemCollector};
use tracing::{error, info};

/// Host resource monitor with threshold alerts
#[derive(Parser, Debug)]
#[command(name = "sysalert")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Check each component once and exit (0 = all passed, 1 = failure)
    #[arg(long)]
    test: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match MonitorConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            if init_logging(None, LogRotation::default()).is_ok() {
                error!(path = %args.config.display(), error = %e, "monitor failed to start");
            } else {
                eprintln!("Error: failed to load {}: {}", args.config.display(), e);
            }
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(config.log_file.as_deref(), config.log_rotation()) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    if args.test {
        info!("running component self test");
        let mut collector = SystemCollector::new(&config.collector, &config.critical_processes);
        let mut store = JsonHistoryStore::new(&config.history.dir);
        return if run_self_test(&config, &mut collector, &mut store) {
            info!("all checks passed");
            ExitCode::SUCCESS
        } else {
            error!("self test failed");
            ExitCode::FAILURE
        };
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = format_args!("{:#}", e), "monitor failed to start");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: MonitorConfig) -> Result<()> {
    let notifier = EmailNotifier::new(&config.email).context("Invalid email configuration")?;
    let collector = SystemCollector::new(&config.collector, &config.critical_processes);
    let store = JsonHistoryStore::new(&config.history.dir);

    let mut monitor = Monitor::new(&config, collector, notifier, store);
    monitor
        .run(async {
            wait_for_signal().await;
        })
        .await;

    info!("monitor stopped");
    Ok(())
}
