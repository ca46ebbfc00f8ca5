//! Error types for running a hosted service.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::signal::Signal;

/// Error type returned by hosted applications and signal handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Attempted to register a handler for a reserved shutdown signal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("signal {0} is reserved for shutdown")]
pub struct ReservedSignal(pub Signal);

/// Failures of the platform service-control runtime itself.
#[derive(Debug, Error)]
pub enum ControlError {
    /// No service control manager exists on this platform.
    #[error("service control manager is not available on this platform")]
    Unsupported,

    /// The platform runtime reported a failure.
    #[error("service control manager error: {0}")]
    Platform(String),
}

/// The Run Outcome: why a run ended unsuccessfully.
#[derive(Debug, Error)]
pub enum RunError {
    /// Could not determine whether the process runs interactively.
    #[error("failed to query session type: {0}")]
    Environment(#[source] io::Error),

    /// Could not move into the executable's directory.
    #[error("failed to change working directory to {path:?}: {source}")]
    WorkingDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The hosted application's `init` failed.
    #[error("init failed: {0}")]
    Init(#[source] BoxError),

    /// The hosted application's `start` failed.
    #[error("start failed: {0}")]
    Start(#[source] BoxError),

    /// The hosted application's `stop` failed.
    #[error("stop failed: {0}")]
    Stop(#[source] BoxError),

    /// Subscribing to OS signal delivery failed.
    #[error("failed to subscribe to signals: {0}")]
    Subscribe(#[source] io::Error),

    /// The signal stream ended before any shutdown signal arrived.
    #[error("signal stream closed before a shutdown signal was received")]
    SignalsClosed,

    /// The control manager dropped its request stream before asking to stop.
    #[error("service control manager closed the request stream")]
    ControlClosed,

    /// The control manager runtime failed.
    #[error(transparent)]
    Control(#[from] ControlError),
}

/// Result type for a run.
pub type RunResult = Result<(), RunError>;
