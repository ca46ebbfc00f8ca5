//! Shutdown-set resolution and the signal dispatch loop.
//!
//! # Responsibilities
//! - Compute the signals a run subscribes to (explicit or default, plus
//!   every registered signal)
//! - Route each delivered signal to its registered handler or to `stop`
//!
//! # Design Decisions
//! - Registry consulted first: a registered signal never triggers shutdown
//! - Handlers run inline on the loop and their errors are logged only
//! - The loop returns right after `stop`, so `stop` runs at most once

use std::collections::BTreeSet;

use crate::error::{RunError, RunResult};
use crate::platform::SignalSource;
use crate::registry::SignalRegistry;
use crate::service::Service;
use crate::signal::Signal;

/// Shutdown signals when none are given to a foreground run.
pub const FOREGROUND_DEFAULTS: [Signal; 2] = [Signal::Interrupt, Signal::Terminate];

/// Shutdown signals when none are given to an interactive managed-model run.
pub const MANAGED_DEFAULTS: [Signal; 1] = [Signal::Interrupt];

/// The signals one run subscribes to. Fixed for the duration of the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownSet {
    signals: BTreeSet<Signal>,
}

impl ShutdownSet {
    /// `explicit` (or `defaults` when empty) joined with the registry's keys.
    pub fn resolve(explicit: &[Signal], defaults: &[Signal], registry: &SignalRegistry) -> Self {
        let base = if explicit.is_empty() { defaults } else { explicit };
        let mut signals: BTreeSet<Signal> = base.iter().map(|sig| sig.canonical()).collect();
        signals.extend(registry.signals());
        Self { signals }
    }

    pub fn contains(&self, signal: Signal) -> bool {
        self.signals.contains(&signal)
    }

    pub fn signals(&self) -> &BTreeSet<Signal> {
        &self.signals
    }
}

/// Subscribe to `shutdown` and dispatch until a shutdown signal arrives.
///
/// Returns the result of `service.stop()`, or [`RunError::SignalsClosed`]
/// if the source stops delivering first.
pub(crate) async fn dispatch(
    service: &dyn Service,
    registry: &SignalRegistry,
    source: &dyn SignalSource,
    shutdown: &ShutdownSet,
) -> RunResult {
    let mut deliveries = source
        .subscribe(shutdown.signals())
        .map_err(RunError::Subscribe)?;

    tracing::info!(signals = ?shutdown.signals(), "Waiting for signals");

    while let Some(sig) = deliveries.recv().await {
        if let Some(handler) = registry.lookup(sig) {
            tracing::debug!(signal = %sig, "Dispatching signal to registered handler");
            if let Err(e) = handler(sig) {
                tracing::warn!(signal = %sig, error = %e, "Signal handler failed");
            }
        } else if shutdown.contains(sig) {
            tracing::info!(signal = %sig, "Shutdown signal received, stopping service");
            return service.stop().map_err(RunError::Stop);
        }
    }

    tracing::warn!("Signal stream closed before a shutdown signal arrived");
    Err(RunError::SignalsClosed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let registry = SignalRegistry::new();
        let set = ShutdownSet::resolve(&[], &FOREGROUND_DEFAULTS, &registry);
        assert_eq!(
            set.signals(),
            &BTreeSet::from([Signal::Interrupt, Signal::Terminate])
        );

        let set = ShutdownSet::resolve(&[], &MANAGED_DEFAULTS, &registry);
        assert_eq!(set.signals(), &BTreeSet::from([Signal::Interrupt]));
    }

    #[test]
    fn test_explicit_replaces_defaults() {
        let registry = SignalRegistry::new();
        let set = ShutdownSet::resolve(&[Signal::Quit], &FOREGROUND_DEFAULTS, &registry);
        assert!(set.contains(Signal::Quit));
        assert!(!set.contains(Signal::Interrupt));
        assert!(!set.contains(Signal::Terminate));
    }

    #[test]
    fn test_registry_keys_joined() {
        let registry = SignalRegistry::new();
        registry.register(Signal::Hangup, |_| Ok(())).unwrap();
        registry.register(Signal::User1, |_| Ok(())).unwrap();

        let explicit = [Signal::Terminate, Signal::Terminate];
        let set = ShutdownSet::resolve(&explicit, &FOREGROUND_DEFAULTS, &registry);
        assert_eq!(
            set.signals(),
            &BTreeSet::from([Signal::Terminate, Signal::Hangup, Signal::User1])
        );
    }

    #[test]
    fn test_numbered_aliases_collapse() {
        let registry = SignalRegistry::new();
        registry
            .register(Signal::Raw(Signal::Hangup.raw_value()), |_| Ok(()))
            .unwrap();

        let explicit = [Signal::Terminate, Signal::Raw(Signal::Terminate.raw_value())];
        let set = ShutdownSet::resolve(&explicit, &FOREGROUND_DEFAULTS, &registry);

        assert_eq!(set.signals().len(), 2);
        assert!(set.contains(Signal::Hangup));
        assert!(set.contains(Signal::Terminate));
        assert!(set
            .signals()
            .iter()
            .all(|sig| !matches!(sig, Signal::Raw(_))));
    }

    #[test]
    fn test_empty_registry_is_still_a_set() {
        let registry = SignalRegistry::new();
        let set = ShutdownSet::resolve(&[Signal::Quit], &[], &registry);
        assert_eq!(set.signals().len(), 1);
        assert!(ShutdownSet::default().signals().is_empty());
    }
}
