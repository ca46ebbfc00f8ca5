//! Custom signal handler registry.
//!
//! # Responsibilities
//! - Map non-reserved signals to caller-supplied handlers
//! - Reject the reserved shutdown signals
//! - Expose its keys so runners subscribe to every registered signal
//!
//! # Design Decisions
//! - One table per registry, keyed by signal; a later registration overwrites
//! - Populated before a run starts, read-only while dispatching
//! - A process-wide instance is created lazily; runners accept an isolated one

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::error::{BoxError, ReservedSignal};
use crate::signal::Signal;

/// A custom signal handler.
///
/// Runs synchronously on the dispatch loop, so it must return promptly.
/// Its errors are logged and otherwise ignored.
pub type SignalHandler = Arc<dyn Fn(Signal) -> Result<(), BoxError> + Send + Sync>;

static GLOBAL: OnceLock<Arc<SignalRegistry>> = OnceLock::new();

/// Table of custom signal handlers.
#[derive(Default)]
pub struct SignalRegistry {
    handlers: RwLock<HashMap<Signal, SignalHandler>>,
}

impl SignalRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by runners unless one is injected.
    pub fn global() -> Arc<SignalRegistry> {
        GLOBAL.get_or_init(|| Arc::new(SignalRegistry::new())).clone()
    }

    /// Register `handler` for `signal`, replacing any previous handler.
    pub fn register<F>(&self, signal: Signal, handler: F) -> Result<(), ReservedSignal>
    where
        F: Fn(Signal) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let signal = signal.canonical();
        if signal.is_reserved() {
            return Err(ReservedSignal(signal));
        }

        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(signal, Arc::new(handler));

        tracing::debug!(signal = %signal, "Signal handler registered");
        Ok(())
    }

    /// Look up the handler for `signal`, matched by signal number.
    pub fn lookup(&self, signal: Signal) -> Option<SignalHandler> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&signal)
            .cloned()
    }

    /// Every signal that currently has a handler.
    pub fn signals(&self) -> BTreeSet<Signal> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }
}

impl fmt::Debug for SignalRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalRegistry")
            .field("signals", &self.signals())
            .finish()
    }
}

/// Register a handler in the process-wide registry.
pub fn notify<F>(signal: Signal, handler: F) -> Result<(), ReservedSignal>
where
    F: Fn(Signal) -> Result<(), BoxError> + Send + Sync + 'static,
{
    SignalRegistry::global().register(signal, handler)
}
