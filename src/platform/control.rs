//! Service control manager protocol.
//!
//! # State Transitions
//! ```text
//! StartPending → Running → StopPending → Stopped
//! StartPending → Stopped (start failed)
//! ```

use std::io;
use std::ops::BitOr;
use std::sync::mpsc::{Receiver, Sender};
use std::time::Duration;

use crate::error::ControlError;

/// Service state reported to the control manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Stopped,
    StartPending,
    StopPending,
    Running,
    ContinuePending,
    PausePending,
    Paused,
}

/// Set of commands the service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Accepts(u32);

impl Accepts {
    pub const NONE: Accepts = Accepts(0);
    pub const STOP: Accepts = Accepts(1);
    pub const SHUTDOWN: Accepts = Accepts(1 << 1);
    pub const PAUSE_CONTINUE: Accepts = Accepts(1 << 2);

    pub const fn union(self, other: Accepts) -> Accepts {
        Accepts(self.0 | other.0)
    }

    pub fn contains(self, other: Accepts) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for Accepts {
    type Output = Accepts;

    fn bitor(self, rhs: Accepts) -> Accepts {
        self.union(rhs)
    }
}

/// A status update sent to the control manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Status {
    pub state: State,
    pub accepts: Accepts,
    pub checkpoint: u32,
    pub wait_hint: Duration,
}

impl Status {
    pub fn new(state: State) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    pub fn with_accepts(mut self, accepts: Accepts) -> Self {
        self.accepts = accepts;
        self
    }
}

/// A command issued by the control manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Interrogate,
    Stop,
    Shutdown,
    Pause,
    Continue,
    ParamChange,
    /// Any other control code.
    Other(u32),
}

/// A command together with the status the control manager last saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRequest {
    pub command: Command,
    pub current_status: Status,
}

/// Terminal result of a control handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    /// Whether `code` is service specific rather than a system error code.
    pub service_specific: bool,
    pub code: u32,
}

impl ExitStatus {
    pub const SUCCESS: ExitStatus = ExitStatus {
        service_specific: false,
        code: 0,
    };

    pub fn failure(code: u32) -> Self {
        Self {
            service_specific: true,
            code,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// The callback surface the control manager drives.
pub trait ControlHandler: Send {
    /// Run the service until it stops.
    ///
    /// Invoked on a thread supplied by the control manager. Status updates
    /// go out on `status`; commands arrive on `requests`.
    fn execute(
        self: Box<Self>,
        requests: Receiver<ChangeRequest>,
        status: Sender<Status>,
    ) -> ExitStatus;
}

/// The platform's service-control runtime.
pub trait ControlManager: Send + Sync {
    /// Whether the process runs in an interactive session rather than under
    /// the control manager.
    fn is_interactive(&self) -> io::Result<bool>;

    /// Hand control to the runtime, blocking until the service stopped.
    fn run(&self, name: &str, handler: Box<dyn ControlHandler>) -> Result<(), ControlError>;
}
