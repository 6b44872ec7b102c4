//! # Roam Logger
//!
//! Tags radio detection events with GPS fixes and logs them to rotating CSV
//! files on the device's storage mount.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load and validate the TOML configuration
//!    - Set up logging (console, plus a daily rolling file if configured)
//!    - Open the GPS serial port and the detection event source
//!
//! 2. **Main Loop**
//!    - Decode RMC sentences from the GPS into the latest fix
//!    - Filter each detection event, enrich it with the latest fix and append
//!      it to the BLE or WIFI logfile, rotating on the configured period
//!    - Report errors and keep going
//!
//! 3. **Graceful Shutdown**
//!    - Ctrl+C, SIGTERM or end of both input streams
//!    - Flush and close the open logfiles
//!
//! # Examples
//!
//! ```bash
//! raddec-decoder | roam-logger --config /etc/roam-logger.toml
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use roam_logger::config::{Config, LoggingConfig};
use roam_logger::logfile::{EventRouter, FsStorage, LogfileRotator, SystemClock};
use roam_logger::pipeline::{Pipeline, TracingReporter};
use roam_logger::raddec::source::open_event_source;
use roam_logger::raddec::MinRssiFilter;
use roam_logger::serial::open_gps;

/// File name prefix of the rolling diagnostic log
const DIAGNOSTIC_LOG_NAME: &str = "roam-logger.log";

/// Command line arguments
#[derive(Debug, Parser)]
#[command(version, about = "GPS-tagged radio detection logger")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    config: PathBuf,

    /// Validate the configuration and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;

    let _log_guard = init_logging(&config.logging);

    if args.check_config {
        info!("Configuration {} is valid", args.config.display());
        return Ok(());
    }

    info!("Roam Logger v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut gps = open_gps(&config.gps)?;
    let mut events = open_event_source(&config.events.source).await?;

    let storage = FsStorage::new(&config.logfile.storage_path);
    info!(
        "Logging to {} every {} minutes",
        storage.root().display(),
        config.logfile.rotation_period_minutes
    );
    let rotator = LogfileRotator::new(storage, &config.logfile);
    let router = EventRouter::new(rotator, SystemClock, config.logfile.delimiter_char());

    let mut pipeline = Pipeline::new(
        router,
        Box::new(MinRssiFilter::new(config.events.min_rssi)),
        Box::new(TracingReporter::default()),
        Duration::from_millis(config.gps.retry_interval_ms),
    );

    info!("Press Ctrl+C to exit");
    pipeline
        .run(&mut gps, events.as_mut(), shutdown_signal())
        .await;

    Ok(())
}

/// Resolve on Ctrl+C or, on Unix, SIGTERM from a service manager
///
/// A signal whose handler cannot be installed never resolves, so the
/// pipeline then runs until its inputs end.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

/// Initialize console logging and, if a directory is configured, a daily
/// rolling log file
///
/// `RUST_LOG` overrides the configured level. The returned guard must be
/// held until exit so buffered file output is flushed.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file_layer, guard) = if config.directory.is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(&config.directory, DIAGNOSTIC_LOG_NAME);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        let args = Args::try_parse_from(["roam-logger"]).unwrap();
        assert_eq!(args.config, PathBuf::from("config/default.toml"));
        assert!(!args.check_config);
    }

    #[test]
    fn test_config_and_check_flags() {
        let args =
            Args::try_parse_from(["roam-logger", "-c", "/etc/roam.toml", "--check-config"]).unwrap();
        assert_eq!(args.config, PathBuf::from("/etc/roam.toml"));
        assert!(args.check_config);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sigterm_resolves_shutdown_signal() {
        let shutdown = tokio::spawn(shutdown_signal());
        // Let the handler install before raising
        tokio::time::sleep(Duration::from_millis(50)).await;

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), shutdown)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_shipped_config_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.gps.baud_rate, 4800);
        assert_eq!(config.logfile.rotation_period_minutes, 60);
    }
}
