//! # Feature: Notification Diagnostics
//!
//! Tools for finding out why a reminder did not show up: a persisted debug
//! log, listeners that record deliveries and taps, a scheduling probe and a
//! health check.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Listener registry is owned by the caller instead of being global
//! - 1.1.0: Comprehensive test
//! - 1.0.0: Initial release

pub mod health;
pub mod listeners;
pub mod log_sink;
pub mod probe;

pub use health::{HealthCheck, HealthIssue};
pub use listeners::{ListenerRegistry, MonitoringOutcome};
pub use log_sink::LogSink;
pub use probe::{ComprehensiveReport, DebugPlan, ProbeKind, ProbeStep, SchedulingProbe};
