//! Shared mocks for lifecycle integration tests.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use svc_host::platform::{
    ChangeRequest, Command, ControlHandler, ControlManager, ExitStatus, SignalSource, Status,
};
use svc_host::{BoxError, ControlError, Environment, Service, Signal};
use tokio::sync::mpsc as tokio_mpsc;

/// A hosted application that counts its lifecycle calls.
#[derive(Default)]
pub struct MockService {
    pub init_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
    pub managed_seen: Mutex<Option<bool>>,
    pub start_thread: Mutex<Option<ThreadId>>,
    fail_init: Option<&'static str>,
    fail_start: Option<&'static str>,
    fail_stop: Option<&'static str>,
    spawn_in_start: bool,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_init(mut self, msg: &'static str) -> Self {
        self.fail_init = Some(msg);
        self
    }

    pub fn fail_start(mut self, msg: &'static str) -> Self {
        self.fail_start = Some(msg);
        self
    }

    pub fn fail_stop(mut self, msg: &'static str) -> Self {
        self.fail_stop = Some(msg);
        self
    }

    /// Call `tokio::spawn` from `start`, as real applications do.
    pub fn spawn_in_start(mut self) -> Self {
        self.spawn_in_start = true;
        self
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.init_calls.load(Ordering::SeqCst),
            self.start_calls.load(Ordering::SeqCst),
            self.stop_calls.load(Ordering::SeqCst),
        )
    }

    pub fn managed_seen(&self) -> Option<bool> {
        *self.managed_seen.lock().unwrap()
    }
}

impl Service for MockService {
    fn init(&self, env: &dyn Environment) -> Result<(), BoxError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        *self.managed_seen.lock().unwrap() = Some(env.is_managed());
        match self.fail_init {
            Some(msg) => Err(msg.into()),
            None => Ok(()),
        }
    }

    fn start(&self) -> Result<(), BoxError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        *self.start_thread.lock().unwrap() = Some(thread::current().id());
        if self.spawn_in_start {
            drop(tokio::spawn(async {}));
        }
        match self.fail_start {
            Some(msg) => Err(msg.into()),
            None => Ok(()),
        }
    }

    fn stop(&self) -> Result<(), BoxError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_stop {
            Some(msg) => Err(msg.into()),
            None => Ok(()),
        }
    }
}

/// A signal source that replays a fixed script, then ends the stream.
///
/// Like the OS, it only delivers signals that were subscribed.
#[derive(Default)]
pub struct ScriptedSignals {
    script: Vec<Signal>,
    fail: bool,
    subscribed: Mutex<Option<BTreeSet<Signal>>>,
}

impl ScriptedSignals {
    pub fn new(script: &[Signal]) -> Arc<Self> {
        Arc::new(Self {
            script: script.to_vec(),
            ..Self::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn subscribed(&self) -> Option<BTreeSet<Signal>> {
        self.subscribed.lock().unwrap().clone()
    }
}

impl SignalSource for ScriptedSignals {
    fn subscribe(
        &self,
        signals: &BTreeSet<Signal>,
    ) -> io::Result<tokio_mpsc::UnboundedReceiver<Signal>> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::Unsupported, "no signals here"));
        }
        *self.subscribed.lock().unwrap() = Some(signals.clone());

        let (tx, rx) = tokio_mpsc::unbounded_channel();
        for sig in &self.script {
            if signals.contains(sig) {
                tx.send(*sig).unwrap();
            }
        }
        Ok(rx)
    }
}

/// A control manager that runs the handler on its own thread and feeds it
/// a fixed command script.
#[derive(Default)]
pub struct ScriptedControl {
    interactive: bool,
    query_fails: bool,
    platform_error: Option<String>,
    commands: Vec<ChangeRequest>,
    pub statuses: Mutex<Vec<Status>>,
    pub exit: Mutex<Option<ExitStatus>>,
    pub handler_thread: Mutex<Option<ThreadId>>,
}

impl ScriptedControl {
    /// Non-interactive session replaying `commands`.
    pub fn managed(commands: &[Command]) -> Self {
        Self {
            commands: commands
                .iter()
                .map(|&command| ChangeRequest {
                    command,
                    current_status: Status::default(),
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn interactive() -> Self {
        Self {
            interactive: true,
            ..Self::default()
        }
    }

    pub fn query_fails() -> Self {
        Self {
            query_fails: true,
            ..Self::default()
        }
    }

    pub fn with_requests(mut self, requests: Vec<ChangeRequest>) -> Self {
        self.commands = requests;
        self
    }

    pub fn with_platform_error(mut self, msg: &str) -> Self {
        self.platform_error = Some(msg.to_string());
        self
    }

    pub fn statuses(&self) -> Vec<Status> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn exit(&self) -> Option<ExitStatus> {
        *self.exit.lock().unwrap()
    }
}

impl ControlManager for ScriptedControl {
    fn is_interactive(&self) -> io::Result<bool> {
        if self.query_fails {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "session query denied"));
        }
        Ok(self.interactive)
    }

    fn run(&self, _name: &str, handler: Box<dyn ControlHandler>) -> Result<(), ControlError> {
        let (request_tx, request_rx) = mpsc::channel();
        let (status_tx, status_rx) = mpsc::channel();
        for request in &self.commands {
            request_tx.send(*request).unwrap();
        }
        drop(request_tx);

        let worker = thread::spawn(move || {
            let id = thread::current().id();
            (id, handler.execute(request_rx, status_tx))
        });
        let (id, exit) = worker
            .join()
            .map_err(|_| ControlError::Platform("handler panicked".into()))?;

        *self.handler_thread.lock().unwrap() = Some(id);
        *self.statuses.lock().unwrap() = status_rx.try_iter().collect();
        *self.exit.lock().unwrap() = Some(exit);

        if let Some(msg) = &self.platform_error {
            return Err(ControlError::Platform(msg.clone()));
        }
        if !exit.is_success() {
            return Err(ControlError::Platform(format!("service exited with code {}", exit.code)));
        }
        Ok(())
    }
}
