//! Portable signal identity.
//!
//! # Responsibilities
//! - Name the signals a hosted application can subscribe to
//! - Parse and print the conventional `SIGxxx` spelling (config files, logs)
//! - Mark the reserved shutdown signals (SIGINT, SIGTERM)
//!
//! # Design Decisions
//! - Named variants for the common signals, `Raw` for everything else
//! - Identity is the OS signal number: `Raw(2)` is `Interrupt` on unix
//! - Ordered by number so signal sets iterate deterministically

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A signal identity.
///
/// Equality, ordering and hashing go through [`Signal::raw_value`], so a
/// `Raw(n)` whose number has a name is the same signal as that name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Signal {
    /// SIGINT (Ctrl+C).
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// SIGHUP.
    Hangup,
    /// SIGQUIT (Ctrl+Break on Windows).
    Quit,
    /// SIGUSR1.
    User1,
    /// SIGUSR2.
    User2,
    /// SIGALRM.
    Alarm,
    /// SIGCHLD.
    Child,
    /// SIGPIPE.
    Pipe,
    /// SIGWINCH.
    WindowChange,
    /// Any other signal, by number.
    Raw(i32),
}

/// Signals that always trigger shutdown and can never carry a custom handler.
pub const RESERVED: [Signal; 2] = [Signal::Interrupt, Signal::Terminate];

const NAMES: [(Signal, &str); 10] = [
    (Signal::Interrupt, "SIGINT"),
    (Signal::Terminate, "SIGTERM"),
    (Signal::Hangup, "SIGHUP"),
    (Signal::Quit, "SIGQUIT"),
    (Signal::User1, "SIGUSR1"),
    (Signal::User2, "SIGUSR2"),
    (Signal::Alarm, "SIGALRM"),
    (Signal::Child, "SIGCHLD"),
    (Signal::Pipe, "SIGPIPE"),
    (Signal::WindowChange, "SIGWINCH"),
];

impl Signal {
    /// The signal for OS number `n`, named when the platform names it.
    pub fn from_raw(n: i32) -> Signal {
        NAMES
            .iter()
            .map(|&(sig, _)| sig)
            .find(|sig| sig.raw_value() == n)
            .unwrap_or(Signal::Raw(n))
    }

    /// The OS signal number.
    pub fn raw_value(self) -> i32 {
        match self {
            Signal::Raw(n) => n,
            named => named_value(named),
        }
    }

    /// `self` with a named number replaced by its named variant.
    pub fn canonical(self) -> Signal {
        match self {
            Signal::Raw(n) => Signal::from_raw(n),
            named => named,
        }
    }

    /// Whether this signal is one of the reserved shutdown signals.
    pub fn is_reserved(self) -> bool {
        RESERVED.contains(&self)
    }
}

#[cfg(unix)]
fn named_value(sig: Signal) -> i32 {
    use tokio::signal::unix::SignalKind;

    let kind = match sig {
        Signal::Interrupt => SignalKind::interrupt(),
        Signal::Terminate => SignalKind::terminate(),
        Signal::Hangup => SignalKind::hangup(),
        Signal::Quit => SignalKind::quit(),
        Signal::User1 => SignalKind::user_defined1(),
        Signal::User2 => SignalKind::user_defined2(),
        Signal::Alarm => SignalKind::alarm(),
        Signal::Child => SignalKind::child(),
        Signal::Pipe => SignalKind::pipe(),
        Signal::WindowChange => SignalKind::window_change(),
        Signal::Raw(n) => return n,
    };
    kind.as_raw_value()
}

// Linux numbering; only identity and config parsing depend on it here.
#[cfg(not(unix))]
fn named_value(sig: Signal) -> i32 {
    match sig {
        Signal::Hangup => 1,
        Signal::Interrupt => 2,
        Signal::Quit => 3,
        Signal::User1 => 10,
        Signal::User2 => 12,
        Signal::Pipe => 13,
        Signal::Alarm => 14,
        Signal::Terminate => 15,
        Signal::Child => 17,
        Signal::WindowChange => 28,
        Signal::Raw(n) => n,
    }
}

impl PartialEq for Signal {
    fn eq(&self, other: &Self) -> bool {
        self.raw_value() == other.raw_value()
    }
}

impl Eq for Signal {}

impl Hash for Signal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw_value().hash(state);
    }
}

impl PartialOrd for Signal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Signal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw_value().cmp(&other.raw_value())
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.canonical() {
            Signal::Raw(n) => write!(f, "SIG{}", n),
            named => {
                let name = NAMES
                    .iter()
                    .find(|(sig, _)| *sig == named)
                    .map(|(_, name)| *name)
                    .unwrap_or("SIG?");
                f.write_str(name)
            }
        }
    }
}

/// Error returned when a signal name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown signal: {0:?}")]
pub struct ParseSignalError(pub String);

impl FromStr for Signal {
    type Err = ParseSignalError;

    /// Accepts `SIGHUP`, `HUP`, `hup` and raw numbers (`10`, `SIG10`).
    /// A number the platform names parses to the named variant.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix("SIG").unwrap_or(&upper);

        if let Ok(n) = bare.parse::<i32>() {
            return if n > 0 {
                Ok(Signal::from_raw(n))
            } else {
                Err(ParseSignalError(s.to_string()))
            };
        }

        NAMES
            .iter()
            .find(|(_, name)| &name[3..] == bare)
            .map(|(sig, _)| *sig)
            .ok_or_else(|| ParseSignalError(s.to_string()))
    }
}

impl TryFrom<String> for Signal {
    type Error = ParseSignalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Signal> for String {
    fn from(sig: Signal) -> Self {
        sig.to_string()
    }
}
