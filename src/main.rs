//! svc-host
//!
//! Hosts a heartbeat application with the lifecycle runners: as a console
//! process it stops on Ctrl+C / SIGTERM, under a service control manager it
//! stops on the Stop and Shutdown commands.
//!
//! ```text
//! svc-host [--config host.toml] [--mode auto|foreground|managed]
//!     → load config → init logging → register SIGHUP handler
//!     → Lifecycle::from_config → run(heartbeat) → wait for worker
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use clap::Parser;
use tokio::task::JoinHandle;

use svc_host::config::{load_config, HostConfig, RunMode};
use svc_host::lifecycle::{Lifecycle, Runner, Shutdown};
use svc_host::observability::init_logging;
use svc_host::{BoxError, Environment, Service};

#[derive(Parser)]
#[command(name = "svc-host")]
#[command(
    about = "Run a heartbeat service in the foreground or under a service control manager",
    long_about = None
)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured run mode.
    #[arg(short, long)]
    mode: Option<RunMode>,

    /// Seconds between heartbeats.
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    interval_secs: u64,
}

/// Logs a heartbeat on a background task until stopped.
struct Heartbeat {
    interval: Duration,
    shutdown: Shutdown,
    managed: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Heartbeat {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            shutdown: Shutdown::new(),
            managed: AtomicBool::new(false),
            worker: Mutex::new(None),
        }
    }

    fn take_worker(&self) -> Option<JoinHandle<()>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl Service for Heartbeat {
    fn init(&self, env: &dyn Environment) -> Result<(), BoxError> {
        self.managed.store(env.is_managed(), Ordering::SeqCst);
        tracing::info!(managed = env.is_managed(), "Heartbeat initialized");
        Ok(())
    }

    fn start(&self) -> Result<(), BoxError> {
        let mut listener = self.shutdown.subscribe();
        let interval = self.interval;
        let managed = self.managed.load(Ordering::SeqCst);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut beats: u64 = 0;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        beats += 1;
                        tracing::info!(beats, managed, "Heartbeat");
                    }
                    _ = listener.wait() => {
                        tracing::info!(beats, "Heartbeat worker exiting");
                        break;
                    }
                }
            }
        });

        *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    fn stop(&self) -> Result<(), BoxError> {
        tracing::info!("Heartbeat stopping");
        self.shutdown.trigger();
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HostConfig::default(),
    };
    if let Some(mode) = cli.mode {
        config.service.mode = mode;
    }

    init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        service = %config.service.name,
        mode = ?config.service.mode,
        signals = ?config.service.signals,
        "svc-host starting"
    );

    #[cfg(unix)]
    svc_host::notify(svc_host::Signal::Hangup, |sig| {
        tracing::info!(signal = %sig, "Reload requested");
        Ok(())
    })?;

    let app = Arc::new(Heartbeat::new(Duration::from_secs(cli.interval_secs)));
    let lifecycle = Lifecycle::from_config(&config.service);
    let result = lifecycle.run(app.clone(), &config.service.signals).await;

    if let Some(worker) = app.take_worker() {
        let _ = worker.await;
    }

    match result {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Service exited with an error");
            Err(e.into())
        }
    }
}
