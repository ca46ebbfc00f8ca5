//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Foreground (foreground.rs):
//!     init → start → subscribe(shutdown set ∪ registry) → dispatch → stop
//!
//! Managed service (managed.rs):
//!     interactive? ──no──▶ chdir → init → control manager
//!                  │         → handler(start … stop)
//!                  └─yes─▶ init → start → dispatch (dispatch.rs) → stop
//!
//! Signals (dispatch.rs):
//!     registered signal → handler, keep looping
//!     shutdown signal   → stop, return its result
//! ```
//!
//! # Design Decisions
//! - Both runners share the same call shape behind [`Runner`]
//! - The runner is picked at startup from configuration, not at compile time
//! - `stop` is invoked at most once per run

pub mod dispatch;
pub mod foreground;
pub mod managed;
pub mod shutdown;

use std::future::Future;
use std::sync::Arc;

use crate::config::schema::{RunMode, ServiceConfig};
use crate::error::RunResult;
use crate::service::Service;
use crate::signal::Signal;

pub use dispatch::ShutdownSet;
pub use foreground::ForegroundRunner;
pub use managed::{ServiceHandler, ServiceRunner};
pub use shutdown::Shutdown;

/// Drives a [`Service`] through init, start, dispatch and stop.
pub trait Runner {
    /// Run `service` until it is told to stop.
    ///
    /// `signals` overrides the runner's default shutdown signals. Signals in
    /// the registry are always subscribed as well.
    fn run<S: Service>(
        &self,
        service: Arc<S>,
        signals: &[Signal],
    ) -> impl Future<Output = RunResult>;
}

/// One of the two runners, chosen at startup.
pub enum Lifecycle {
    Foreground(ForegroundRunner),
    Managed(ServiceRunner),
}

impl Lifecycle {
    /// Runner for `mode`; the service name only matters to the managed runner.
    pub fn new(mode: RunMode, name: &str) -> Self {
        if mode.is_managed() {
            Lifecycle::Managed(ServiceRunner::new(name))
        } else {
            Lifecycle::Foreground(ForegroundRunner::new())
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        match Self::new(config.mode, &config.name) {
            Lifecycle::Managed(runner) => {
                Lifecycle::Managed(runner.with_chdir_to_executable(config.chdir_to_executable))
            }
            other => other,
        }
    }

    pub fn is_managed_runner(&self) -> bool {
        matches!(self, Lifecycle::Managed(_))
    }
}

impl Runner for Lifecycle {
    async fn run<S: Service>(&self, service: Arc<S>, signals: &[Signal]) -> RunResult {
        match self {
            Lifecycle::Foreground(runner) => runner.run(service, signals).await,
            Lifecycle::Managed(runner) => runner.run(service, signals).await,
        }
    }
}
