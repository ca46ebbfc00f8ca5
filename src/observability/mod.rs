//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Runners and the control bridge produce:
//!     → tracing events (lifecycle transitions, signals, control commands)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, human or JSON)
//! ```
//!
//! # Design Decisions
//! - Structured fields (`signal`, `command`, `service`) on every event
//! - The library only emits events; installing a subscriber is the binary's job

pub mod logging;

pub use logging::init_logging;
