//! OS signal delivery via tokio.
//!
//! # Responsibilities
//! - Install a tokio signal listener per requested signal
//! - Forward every delivery into one channel
//!
//! # Design Decisions
//! - One forwarding task per signal; tasks end when the receiver is dropped
//! - Windows maps interrupt to Ctrl+C, quit to Ctrl+Break, terminate to
//!   console close; other signals are unsupported there

use std::collections::BTreeSet;
use std::future::Future;
use std::io;

use tokio::sync::mpsc;

use super::SignalSource;
use crate::signal::Signal;

/// Production [`SignalSource`] backed by `tokio::signal`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSignals;

impl SignalSource for OsSignals {
    fn subscribe(
        &self,
        signals: &BTreeSet<Signal>,
    ) -> io::Result<mpsc::UnboundedReceiver<Signal>> {
        let (tx, rx) = mpsc::unbounded_channel();

        for &sig in signals {
            let listener = listen(sig)?;
            tokio::spawn(forward(sig, listener, tx.clone()));
        }

        Ok(rx)
    }
}

/// One OS signal stream; `None` once it can no longer deliver.
trait Listener: Send + 'static {
    fn recv(&mut self) -> impl Future<Output = Option<()>> + Send;
}

/// Send `sig` for every delivery until the listener ends or `tx` closes.
async fn forward<L: Listener>(sig: Signal, mut listener: L, tx: mpsc::UnboundedSender<Signal>) {
    loop {
        tokio::select! {
            delivered = listener.recv() => {
                if delivered.is_none() || tx.send(sig).is_err() {
                    break;
                }
            }
            _ = tx.closed() => {
                tracing::debug!(signal = %sig, "Signal receiver dropped, forwarding stopped");
                break;
            }
        }
    }
}

#[cfg(unix)]
impl Listener for tokio::signal::unix::Signal {
    fn recv(&mut self) -> impl Future<Output = Option<()>> + Send {
        tokio::signal::unix::Signal::recv(self)
    }
}

#[cfg(unix)]
fn listen(sig: Signal) -> io::Result<tokio::signal::unix::Signal> {
    use tokio::signal::unix::{signal, SignalKind};

    signal(SignalKind::from_raw(sig.raw_value()))
}

#[cfg(windows)]
fn listen(sig: Signal) -> io::Result<WindowsListener> {
    use tokio::signal::windows;

    match sig.canonical() {
        Signal::Interrupt => windows::ctrl_c().map(WindowsListener::CtrlC),
        Signal::Quit => windows::ctrl_break().map(WindowsListener::CtrlBreak),
        Signal::Terminate => windows::ctrl_close().map(WindowsListener::CtrlClose),
        other => Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("{} cannot be delivered on Windows", other),
        )),
    }
}

#[cfg(windows)]
enum WindowsListener {
    CtrlC(tokio::signal::windows::CtrlC),
    CtrlBreak(tokio::signal::windows::CtrlBreak),
    CtrlClose(tokio::signal::windows::CtrlClose),
}

#[cfg(windows)]
impl Listener for WindowsListener {
    async fn recv(&mut self) -> Option<()> {
        match self {
            WindowsListener::CtrlC(l) => l.recv().await,
            WindowsListener::CtrlBreak(l) => l.recv().await,
            WindowsListener::CtrlClose(l) => l.recv().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// A signal that is never delivered.
    struct Silent;

    impl Listener for Silent {
        async fn recv(&mut self) -> Option<()> {
            std::future::pending().await
        }
    }

    /// Delivers once, then ends.
    struct Once(bool);

    impl Listener for Once {
        async fn recv(&mut self) -> Option<()> {
            std::mem::replace(&mut self.0, false).then_some(())
        }
    }

    #[tokio::test]
    async fn test_forwarding_ends_when_receiver_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(forward(Signal::User1, Silent, tx));

        drop(rx);

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("forwarding task outlived its receiver")
            .unwrap();
    }

    #[tokio::test]
    async fn test_forwarding_ends_with_listener() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(forward(Signal::Hangup, Once(true), tx));

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rx.recv().await, Some(Signal::Hangup));
        assert_eq!(rx.recv().await, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_delivers_subscribed_signal() {
        let source = OsSignals;
        let mut rx = source
            .subscribe(&BTreeSet::from([Signal::User2]))
            .unwrap();

        let pid = std::process::id();
        std::process::Command::new("kill")
            .args(["-USR2", &pid.to_string()])
            .status()
            .unwrap();

        let received = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(received, Some(Signal::User2));
    }
}
