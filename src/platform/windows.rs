//! Windows Service Control Manager bridge.
//!
//! # Responsibilities
//! - Detect whether the process was launched by the SCM
//! - Run the service dispatcher and forward SCM controls to a [`ControlHandler`]
//! - Report the handler's status updates back to the SCM
//!
//! # Design Decisions
//! - Session 0 means non-interactive (services never run in a user session)
//! - The dispatcher entry point is a static fn, so the pending handler is
//!   parked in a static slot for the duration of one `run`

use std::ffi::OsString;
use std::io;
use std::sync::{mpsc, Arc, Mutex, PoisonError};

use windows_service::service::{
    ServiceControl, ServiceControlAccept, ServiceExitCode, ServiceState, ServiceStatus, ServiceType,
};
use windows_service::service_control_handler::{self, ServiceControlHandlerResult};
use windows_service::{define_windows_service, service_dispatcher};
use windows_sys::Win32::System::RemoteDesktop::ProcessIdToSessionId;
use windows_sys::Win32::System::Threading::GetCurrentProcessId;

use super::control::{
    Accepts, ChangeRequest, Command, ControlHandler, ControlManager, State, Status,
};
use crate::error::ControlError;

struct Pending {
    name: String,
    handler: Box<dyn ControlHandler>,
}

static PENDING: Mutex<Option<Pending>> = Mutex::new(None);
static FAILURE: Mutex<Option<String>> = Mutex::new(None);

define_windows_service!(ffi_service_main, service_main);

/// [`ControlManager`] backed by the Windows SCM.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsControlManager;

impl ControlManager for WindowsControlManager {
    fn is_interactive(&self) -> io::Result<bool> {
        let mut session_id: u32 = 0;
        // SAFETY: `session_id` is a valid, writable u32 for the duration of the call.
        let ok = unsafe { ProcessIdToSessionId(GetCurrentProcessId(), &mut session_id) };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(session_id != 0)
    }

    fn run(&self, name: &str, handler: Box<dyn ControlHandler>) -> Result<(), ControlError> {
        *FAILURE.lock().unwrap_or_else(PoisonError::into_inner) = None;
        *PENDING.lock().unwrap_or_else(PoisonError::into_inner) = Some(Pending {
            name: name.to_string(),
            handler,
        });

        let result = service_dispatcher::start(name, ffi_service_main);
        PENDING.lock().unwrap_or_else(PoisonError::into_inner).take();
        result.map_err(|e| ControlError::Platform(e.to_string()))?;

        match FAILURE.lock().unwrap_or_else(PoisonError::into_inner).take() {
            Some(msg) => Err(ControlError::Platform(msg)),
            None => Ok(()),
        }
    }
}

fn service_main(_arguments: Vec<OsString>) {
    let pending = PENDING.lock().unwrap_or_else(PoisonError::into_inner).take();
    let Some(Pending { name, handler }) = pending else {
        tracing::error!("Service dispatcher started without a pending handler");
        return;
    };

    if let Err(e) = bridge(&name, handler) {
        tracing::error!(service = %name, error = %e, "Service control bridge failed");
        *FAILURE.lock().unwrap_or_else(PoisonError::into_inner) = Some(e.to_string());
    }
}

fn bridge(name: &str, handler: Box<dyn ControlHandler>) -> windows_service::Result<()> {
    let (request_tx, request_rx) = mpsc::channel::<ChangeRequest>();
    let (status_tx, status_rx) = mpsc::channel::<Status>();
    let current = Arc::new(Mutex::new(Status::default()));

    let seen = current.clone();
    let handle = service_control_handler::register(name, move |control| {
        let command = match control {
            ServiceControl::Interrogate => Command::Interrogate,
            ServiceControl::Stop => Command::Stop,
            ServiceControl::Shutdown => Command::Shutdown,
            ServiceControl::Pause => Command::Pause,
            ServiceControl::Continue => Command::Continue,
            ServiceControl::Paramchange => Command::ParamChange,
            _ => return ServiceControlHandlerResult::NotImplemented,
        };
        let current_status = *seen.lock().unwrap_or_else(PoisonError::into_inner);
        match request_tx.send(ChangeRequest { command, current_status }) {
            Ok(()) => ServiceControlHandlerResult::NoError,
            Err(_) => ServiceControlHandlerResult::NotImplemented,
        }
    })?;

    let reporter = std::thread::spawn(move || {
        for status in status_rx {
            *current.lock().unwrap_or_else(PoisonError::into_inner) = status;
            let reported = to_windows(status, ServiceExitCode::Win32(0));
            if let Err(e) = handle.set_service_status(reported) {
                tracing::warn!(
                    error = %e,
                    state = ?status.state,
                    "Failed to report service status"
                );
            }
        }
    });

    let exit = handler.execute(request_rx, status_tx);
    let _ = reporter.join();

    let exit_code = if exit.service_specific {
        ServiceExitCode::ServiceSpecific(exit.code)
    } else {
        ServiceExitCode::Win32(exit.code)
    };
    handle.set_service_status(to_windows(Status::new(State::Stopped), exit_code))
}

fn to_windows(status: Status, exit_code: ServiceExitCode) -> ServiceStatus {
    let current_state = match status.state {
        State::Stopped => ServiceState::Stopped,
        State::StartPending => ServiceState::StartPending,
        State::StopPending => ServiceState::StopPending,
        State::Running => ServiceState::Running,
        State::ContinuePending => ServiceState::ContinuePending,
        State::PausePending => ServiceState::PausePending,
        State::Paused => ServiceState::Paused,
    };

    let mut controls_accepted = ServiceControlAccept::empty();
    if status.accepts.contains(Accepts::STOP) {
        controls_accepted |= ServiceControlAccept::STOP;
    }
    if status.accepts.contains(Accepts::SHUTDOWN) {
        controls_accepted |= ServiceControlAccept::SHUTDOWN;
    }
    if status.accepts.contains(Accepts::PAUSE_CONTINUE) {
        controls_accepted |= ServiceControlAccept::PAUSE_CONTINUE;
    }

    ServiceStatus {
        service_type: ServiceType::OWN_PROCESS,
        current_state,
        controls_accepted,
        exit_code,
        checkpoint: status.checkpoint,
        wait_hint: status.wait_hint,
        process_id: None,
    }
}

