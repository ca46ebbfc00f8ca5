//! Service host library.
//!
//! Runs one application body unmodified either as a foreground process
//! reacting to OS signals or as a service driven by a service control
//! manager.
//!
//! ```text
//!   registry::notify(SIGHUP, handler)        (optional, before running)
//!              │
//!              ▼
//!   Lifecycle / ForegroundRunner / ServiceRunner ::run(app, signals)
//!              │
//!              ├─ init(env) ─ start ─ dispatch signals ─ stop
//!              └─ init(env) ─ control manager ─ start … Stop/Shutdown ─ stop
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod platform;
pub mod registry;
pub mod service;
pub mod signal;

use std::sync::Arc;

pub use config::{HostConfig, RunMode};
pub use error::{BoxError, ControlError, ReservedSignal, RunError, RunResult};
pub use lifecycle::{ForegroundRunner, Lifecycle, Runner, ServiceRunner, Shutdown};
pub use registry::{notify, SignalRegistry};
pub use service::{Environment, RunEnvironment, Service};
pub use signal::Signal;

/// Run `service` with the runner native to this platform.
///
/// Blocks until a shutdown signal or a stop command arrives and returns the
/// outcome of the run.
pub async fn run<S: Service>(service: Arc<S>, signals: &[Signal]) -> RunResult {
    let config = config::ServiceConfig::default();
    Lifecycle::new(RunMode::Auto, &config.name).run(service, signals).await
}
