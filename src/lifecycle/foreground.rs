//! Foreground runner: an ordinary process reacting to OS signals.
//!
//! # Data Flow
//! ```text
//! init(env: managed=false) → start → subscribe(shutdown set) → dispatch → stop
//! ```

use std::sync::Arc;

use super::dispatch::{dispatch, ShutdownSet, FOREGROUND_DEFAULTS};
use super::Runner;
use crate::error::{RunError, RunResult};
use crate::platform::{default_signal_source, SignalSource};
use crate::registry::SignalRegistry;
use crate::service::{RunEnvironment, Service};
use crate::signal::Signal;

/// Runs a [`Service`] as a foreground process.
pub struct ForegroundRunner {
    registry: Arc<SignalRegistry>,
    source: Arc<dyn SignalSource>,
}

impl ForegroundRunner {
    /// Runner using the process-wide registry and OS signal delivery.
    pub fn new() -> Self {
        Self {
            registry: SignalRegistry::global(),
            source: default_signal_source(),
        }
    }

    pub fn with_registry(mut self, registry: Arc<SignalRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_signal_source(mut self, source: Arc<dyn SignalSource>) -> Self {
        self.source = source;
        self
    }

    pub fn registry(&self) -> &Arc<SignalRegistry> {
        &self.registry
    }
}

impl Default for ForegroundRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner for ForegroundRunner {
    /// Blocks until one of `signals` (SIGINT and SIGTERM when empty) arrives.
    async fn run<S: Service>(&self, service: Arc<S>, signals: &[Signal]) -> RunResult {
        let env = RunEnvironment::foreground();
        service.init(&env).map_err(RunError::Init)?;
        tracing::debug!(managed = false, "Service initialized");

        service.start().map_err(RunError::Start)?;
        tracing::info!("Service started");

        let shutdown = ShutdownSet::resolve(signals, &FOREGROUND_DEFAULTS, &self.registry);
        dispatch(&*service, &self.registry, &*self.source, &shutdown).await
    }
}
