//! OS primitives behind injectable seams.
//!
//! # Data Flow
//! ```text
//! Foreground model:
//!     SignalSource::subscribe(set) → mpsc::UnboundedReceiver<Signal> → dispatch loop
//!
//! Managed-service model:
//!     ControlManager::is_interactive() → managed?
//!     ControlManager::run(name, handler)
//!         → platform thread calls handler.execute(requests, status)
//!         → ChangeRequest stream in, Status stream out
//! ```
//!
//! # Design Decisions
//! - Runners only talk to these traits; tests script both event sources
//! - The control protocol mirrors the SCM's: status updates out, commands in

pub mod control;
pub mod signals;
#[cfg(windows)]
pub mod windows;

use std::collections::BTreeSet;
use std::io;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::ControlError;
use crate::signal::Signal;

pub use control::{
    Accepts, ChangeRequest, Command, ControlHandler, ControlManager, ExitStatus, State, Status,
};
pub use signals::OsSignals;

/// Delivers OS signals.
pub trait SignalSource: Send + Sync {
    /// Start delivering exactly the signals in `signals`.
    ///
    /// Called from within a tokio runtime. The stream ends when the source
    /// can no longer deliver signals.
    fn subscribe(
        &self,
        signals: &BTreeSet<Signal>,
    ) -> io::Result<mpsc::UnboundedReceiver<Signal>>;
}

/// Control manager for platforms without one.
///
/// Always reports an interactive session, so runners take the foreground
/// path and never call [`ControlManager::run`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NoControlManager;

impl ControlManager for NoControlManager {
    fn is_interactive(&self) -> io::Result<bool> {
        Ok(true)
    }

    fn run(&self, _name: &str, _handler: Box<dyn ControlHandler>) -> Result<(), ControlError> {
        Err(ControlError::Unsupported)
    }
}

/// The control manager of the current platform.
pub fn default_control_manager() -> Arc<dyn ControlManager> {
    #[cfg(windows)]
    {
        Arc::new(windows::WindowsControlManager)
    }
    #[cfg(not(windows))]
    {
        Arc::new(NoControlManager)
    }
}

/// The signal source of the current platform.
pub fn default_signal_source() -> Arc<dyn SignalSource> {
    Arc::new(OsSignals)
}
