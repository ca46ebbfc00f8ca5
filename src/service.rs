//! The hosted application contract.

use crate::error::BoxError;

/// An application hosted by a runner.
///
/// `init` is called once the runner knows whether the process is managed by
/// a service control manager, then `start`, then `stop` when a shutdown
/// signal or a stop command arrives. `init` and `start` must not block:
/// long-running work belongs on tasks or threads the application spawns.
/// `stop` may perform bounded graceful-shutdown work before returning.
///
/// Under the managed-service model `start` and `stop` run on a thread owned
/// by the control manager, hence `Send + Sync`. That thread has the caller's
/// tokio runtime entered, so `tokio::spawn` works from either callback.
pub trait Service: Send + Sync + 'static {
    fn init(&self, env: &dyn Environment) -> Result<(), BoxError>;

    fn start(&self) -> Result<(), BoxError>;

    fn stop(&self) -> Result<(), BoxError>;
}

/// Information about the environment the application runs in.
pub trait Environment {
    /// Whether the process runs under service control manager supervision.
    fn is_managed(&self) -> bool;
}

/// The environment a runner hands to [`Service::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunEnvironment {
    managed: bool,
}

impl RunEnvironment {
    pub fn foreground() -> Self {
        Self { managed: false }
    }

    pub fn managed(managed: bool) -> Self {
        Self { managed }
    }
}

impl Environment for RunEnvironment {
    fn is_managed(&self) -> bool {
        self.managed
    }
}
