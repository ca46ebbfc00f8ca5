//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the host.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::signal::Signal;

/// Root configuration for the service host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HostConfig {
    /// Runner selection and shutdown signals.
    pub service: ServiceConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Which runner hosts the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Managed-service runner on Windows, foreground runner elsewhere.
    #[default]
    Auto,
    /// Always the foreground runner.
    Foreground,
    /// Always the managed-service runner (falls back to signals when
    /// launched interactively).
    Managed,
}

impl RunMode {
    pub fn is_managed(self) -> bool {
        match self {
            RunMode::Auto => cfg!(windows),
            RunMode::Foreground => false,
            RunMode::Managed => true,
        }
    }
}

impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(RunMode::Auto),
            "foreground" => Ok(RunMode::Foreground),
            "managed" => Ok(RunMode::Managed),
            other => Err(format!("unknown run mode: {}", other)),
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Name registered with the service control manager.
    pub name: String,

    /// Runner selection.
    pub mode: RunMode,

    /// Explicit shutdown signals (empty = runner defaults).
    pub signals: Vec<Signal>,

    /// Move into the executable's directory before a managed run.
    pub chdir_to_executable: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "svc-host".to_string(),
            mode: RunMode::Auto,
            signals: Vec::new(),
            chdir_to_executable: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default tracing filter; `RUST_LOG` takes precedence.
    pub log_filter: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "svc_host=info".to_string(),
            json_logs: false,
        }
    }
}
