//! Managed-service runner.
//!
//! # Responsibilities
//! - Decide between the control-manager path and the interactive fallback
//! - Bridge `start`/`stop` to the control manager's command protocol
//! - Carry `start`/`stop` errors from the control thread back to the caller
//!
//! # State Transitions (control-manager path)
//! ```text
//! StartPending → Running → StopPending → terminated (code 0)
//! StartPending → terminated (code 1)            start failed
//! Running → StopPending → terminated (code 2)   stop failed
//! ```
//!
//! # Design Decisions
//! - A captured start/stop error wins over the runtime's own failure
//! - The captured error lives behind a mutex: the handler runs on a thread
//!   owned by the control manager
//! - Interactive runs fall back to the foreground dispatch loop, defaulting
//!   to SIGINT only

use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;

use super::dispatch::{dispatch, ShutdownSet, MANAGED_DEFAULTS};
use super::Runner;
use crate::error::{ControlError, RunError, RunResult};
use crate::platform::{
    default_control_manager, default_signal_source, Accepts, ChangeRequest, Command, ControlHandler,
    ControlManager, ExitStatus, SignalSource, State, Status,
};
use crate::registry::SignalRegistry;
use crate::service::{Environment, RunEnvironment, Service};
use crate::signal::Signal;

/// Commands accepted while running.
pub const ACCEPTED: Accepts = Accepts::STOP.union(Accepts::SHUTDOWN);

/// Exit code when `start` fails.
pub const START_FAILED: u32 = 1;
/// Exit code when `stop` fails.
pub const STOP_FAILED: u32 = 2;
/// Exit code when the request stream closes before a stop command.
pub const CONTROL_CLOSED: u32 = 3;

/// Runs a [`Service`] under a service control manager, or interactively
/// when launched from a console.
pub struct ServiceRunner {
    name: String,
    registry: Arc<SignalRegistry>,
    source: Arc<dyn SignalSource>,
    control: Arc<dyn ControlManager>,
    chdir_to_executable: bool,
}

impl ServiceRunner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: SignalRegistry::global(),
            source: default_signal_source(),
            control: default_control_manager(),
            chdir_to_executable: true,
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

    pub fn with_control_manager(mut self, control: Arc<dyn ControlManager>) -> Self {
        self.control = control;
        self
    }

    /// Whether a managed run first moves into the executable's directory.
    pub fn with_chdir_to_executable(mut self, enabled: bool) -> Self {
        self.chdir_to_executable = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn run_managed(&self, service: Arc<dyn Service>) -> RunResult {
        let captured = Arc::new(CapturedError::default());
        let handler = ServiceHandler::new(service, captured.clone());
        let control = self.control.clone();
        let name = self.name.clone();

        tracing::info!(service = %name, "Handing control to the service control manager");
        let outcome = tokio::task::spawn_blocking(move || control.run(&name, Box::new(handler)))
            .await
            .map_err(|e| ControlError::Platform(format!("control manager thread failed: {}", e)))?;

        if let Some(err) = captured.take() {
            return Err(err);
        }
        outcome.map_err(RunError::from)
    }
}

impl Runner for ServiceRunner {
    async fn run<S: Service>(&self, service: Arc<S>, signals: &[Signal]) -> RunResult {
        let interactive = self.control.is_interactive().map_err(RunError::Environment)?;
        let env = RunEnvironment::managed(!interactive);

        if env.is_managed() && self.chdir_to_executable {
            chdir_to_executable()?;
        }

        service.init(&env).map_err(RunError::Init)?;
        tracing::debug!(managed = env.is_managed(), "Service initialized");

        if env.is_managed() {
            return self.run_managed(service).await;
        }

        service.start().map_err(RunError::Start)?;
        tracing::info!("Service started");

        let shutdown = ShutdownSet::resolve(signals, &MANAGED_DEFAULTS, &self.registry);
        dispatch(&*service, &self.registry, &*self.source, &shutdown).await
    }
}

/// The control-manager callback: drives `start` and `stop` from commands.
pub struct ServiceHandler {
    service: Arc<dyn Service>,
    captured: Arc<CapturedError>,
    runtime: Option<Handle>,
}

impl ServiceHandler {
    fn new(service: Arc<dyn Service>, captured: Arc<CapturedError>) -> Self {
        Self {
            service,
            captured,
            runtime: Handle::try_current().ok(),
        }
    }
}

impl ControlHandler for ServiceHandler {
    fn execute(
        self: Box<Self>,
        requests: Receiver<ChangeRequest>,
        status: Sender<Status>,
    ) -> ExitStatus {
        let _runtime = self.runtime.as_ref().map(Handle::enter);

        let _ = status.send(Status::new(State::StartPending));
        if let Err(e) = self.service.start() {
            tracing::error!(error = %e, "Service failed to start");
            self.captured.set(RunError::Start(e));
            return ExitStatus::failure(START_FAILED);
        }

        let _ = status.send(Status::new(State::Running).with_accepts(ACCEPTED));
        tracing::info!("Service running");

        loop {
            let Ok(request) = requests.recv() else {
                tracing::warn!("Control request stream closed before a stop command");
                self.captured.set(RunError::ControlClosed);
                return ExitStatus::failure(CONTROL_CLOSED);
            };

            match request.command {
                Command::Interrogate => {
                    let _ = status.send(request.current_status);
                }
                Command::Stop | Command::Shutdown => {
                    tracing::info!(command = ?request.command, "Stop requested by control manager");
                    let _ = status.send(Status::new(State::StopPending));
                    if let Err(e) = self.service.stop() {
                        tracing::error!(error = %e, "Service failed to stop");
                        self.captured.set(RunError::Stop(e));
                        return ExitStatus::failure(STOP_FAILED);
                    }
                    return ExitStatus::SUCCESS;
                }
                other => {
                    tracing::debug!(command = ?other, "Ignoring control command");
                }
            }
        }
    }
}

/// A start/stop error handed from the control thread to the caller.
#[derive(Debug, Default)]
struct CapturedError {
    slot: Mutex<Option<RunError>>,
}

impl CapturedError {
    fn set(&self, err: RunError) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(err);
    }

    fn take(&self) -> Option<RunError> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

fn chdir_to_executable() -> RunResult {
    let exe = std::env::current_exe().map_err(|source| RunError::WorkingDirectory {
        path: PathBuf::new(),
        source,
    })?;
    let dir = executable_dir(&exe);
    std::env::set_current_dir(&dir).map_err(|source| RunError::WorkingDirectory {
        path: dir.clone(),
        source,
    })?;
    tracing::debug!(dir = %dir.display(), "Working directory set to executable directory");
    Ok(())
}

fn executable_dir(exe: &Path) -> PathBuf {
    match exe.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executable_dir() {
        assert_eq!(
            executable_dir(Path::new("/opt/svc/bin/svc-host")),
            PathBuf::from("/opt/svc/bin")
        );
        assert_eq!(executable_dir(Path::new("svc-host")), PathBuf::from("."));
    }

    #[test]
    fn test_captured_error_take_once() {
        let captured = CapturedError::default();
        assert!(captured.take().is_none());

        captured.set(RunError::ControlClosed);
        assert!(matches!(captured.take(), Some(RunError::ControlClosed)));
        assert!(captured.take().is_none());
    }

    #[test]
    fn test_accepted_commands() {
        assert!(ACCEPTED.contains(Accepts::STOP));
        assert!(ACCEPTED.contains(Accepts::SHUTDOWN));
        assert!(!ACCEPTED.contains(Accepts::PAUSE_CONTINUE));
    }
}
