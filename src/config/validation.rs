//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Service names the control manager accepts
//! - No duplicate shutdown signals
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HostConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::BTreeSet;

use thiserror::Error;

use crate::config::schema::HostConfig;
use crate::signal::Signal;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("service.name must not be empty")]
    EmptyServiceName,

    #[error("service.name {0:?} must not contain path separators")]
    InvalidServiceName(String),

    #[error("service.signals lists {0} more than once")]
    DuplicateSignal(Signal),

    #[error("observability.log_filter must not be empty")]
    EmptyLogFilter,
}

/// Check a parsed configuration.
pub fn validate_config(config: &HostConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let name = config.service.name.trim();
    if name.is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    } else if name.contains(['/', '\\']) {
        errors.push(ValidationError::InvalidServiceName(config.service.name.clone()));
    }

    let mut seen = BTreeSet::new();
    for &sig in &config.service.signals {
        if !seen.insert(sig) {
            errors.push(ValidationError::DuplicateSignal(sig));
        }
    }

    if config.observability.log_filter.trim().is_empty() {
        errors.push(ValidationError::EmptyLogFilter);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&HostConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = HostConfig::default();
        config.service.name = "bad/name".into();
        config.service.signals = vec![Signal::Hangup, Signal::Quit, Signal::Hangup];
        config.observability.log_filter = "  ".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidServiceName("bad/name".into()),
                ValidationError::DuplicateSignal(Signal::Hangup),
                ValidationError::EmptyLogFilter,
            ]
        );
    }

    #[test]
    fn test_number_duplicates_name() {
        let mut config = HostConfig::default();
        let term = Signal::Terminate.raw_value();
        config.service.signals = vec![Signal::Terminate, Signal::Raw(term)];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::DuplicateSignal(Signal::Terminate)]);
    }

    #[test]
    fn test_reserved_signals_allowed_as_shutdown() {
        let mut config = HostConfig::default();
        config.service.signals = vec![Signal::Interrupt, Signal::Terminate];
        assert!(validate_config(&config).is_ok());
    }
}
