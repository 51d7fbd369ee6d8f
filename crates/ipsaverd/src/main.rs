// # ipsaverd - Public IP Status Daemon
//
// Thin integration layer: all monitoring logic lives in ipsaver-core.
//
// The ipsaverd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Opening the status file and the HTTP fetcher
// 4. Running the monitor until the process is stopped
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `IPSAVER_BASE_DIR` (required): existing directory (typically a cloud-sync
//   folder) that holds `ipStatus.txt`
// - `IPSAVER_LOG_LEVEL`: trace, debug, info, warn or error (default: info)
//
// Lookup endpoints and the hourly interval are fixed.
//
// ## Example
//
// ```bash
// export IPSAVER_BASE_DIR="$HOME/OneDrive"
// ipsaverd
// ```

use anyhow::{Context, Result};
use ipsaver_core::{FileStatusStore, IpMonitor, MonitorConfig, MonitorEvent};
use ipsaver_http::HttpAddressFetcher;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

const BASE_DIR_VAR: &str = "IPSAVER_BASE_DIR";
const LOG_LEVEL_VAR: &str = "IPSAVER_LOG_LEVEL";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IpsaverExitCode {
    /// Clean shutdown (signal received)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<IpsaverExitCode> for ExitCode {
    fn from(code: IpsaverExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    base_dir: PathBuf,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_dir = lookup(BASE_DIR_VAR)
            .filter(|dir| !dir.trim().is_empty())
            .with_context(|| {
                format!(
                    "{} is required. Set it to the directory that should hold the status file, \
                    e.g. export {}=$HOME/OneDrive",
                    BASE_DIR_VAR, BASE_DIR_VAR
                )
            })?;

        Ok(Self {
            base_dir: PathBuf::from(base_dir),
            log_level: lookup(LOG_LEVEL_VAR).unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if !self.base_dir.is_dir() {
            anyhow::bail!(
                "{} does not name an existing directory: {}",
                BASE_DIR_VAR,
                self.base_dir.display()
            );
        }

        self.tracing_level()?;
        Ok(())
    }

    fn tracing_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "{} '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                LOG_LEVEL_VAR,
                self.log_level
            ),
        }
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return IpsaverExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return IpsaverExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = config.tracing_level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return IpsaverExitCode::ConfigError.into();
    }

    info!("Starting ipsaverd daemon");
    info!("Base directory: {}", config.base_dir.display());

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return IpsaverExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let (monitor, events) = match build_monitor(&config).await {
            Ok(parts) => parts,
            Err(e) => {
                error!("Startup failed: {:#}", e);
                return IpsaverExitCode::ConfigError;
            }
        };

        if let Err(e) = run_daemon(monitor, events).await {
            error!("Daemon error: {:#}", e);
            IpsaverExitCode::RuntimeError
        } else {
            IpsaverExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Resolve the status file and wire the monitor together
async fn build_monitor(config: &Config) -> Result<(IpMonitor, mpsc::Receiver<MonitorEvent>)> {
    let status_path = ipsaver_core::config::status_file_path(&config.base_dir)?;
    let store = FileStatusStore::open(&status_path).await?;
    info!("Status file: {}", store.path().display());

    let fetcher = HttpAddressFetcher::new()?;
    let monitor_config = MonitorConfig::default();
    info!(
        "Lookup services: {} (IPv4), {} (IPv6)",
        monitor_config.ipv4_url, monitor_config.ipv6_url
    );

    let parts = IpMonitor::new(Box::new(fetcher), Box::new(store), monitor_config)?;
    Ok(parts)
}

/// Run the monitor until a shutdown signal arrives
async fn run_daemon(monitor: IpMonitor, mut events: mpsc::Receiver<MonitorEvent>) -> Result<()> {
    let drain = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!("Monitor event: {:?}", event);
        }
    });

    let outcome = tokio::select! {
        _ = monitor.run() => Err(anyhow::anyhow!("Monitor loop exited unexpectedly")),
        signal = wait_for_shutdown() => signal.map(|name| {
            info!("Received shutdown signal: {}", name);
            info!("Shutting down daemon");
        }),
    };

    drain.abort();
    outcome
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// No in-flight cycle is preserved; the status file is only ever replaced
/// by an atomic rename, so stopping mid-cycle cannot corrupt it.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for CTRL-C")?;
    Ok("SIGINT")
}
