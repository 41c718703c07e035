//! Snapfeed Application Orchestration Layer
//!
//! This crate contains business logic use cases and the session guard runtime.

pub mod diagnostics;
pub mod retry;
pub mod usecases;

pub use diagnostics::{DiagnosticLog, LogLevel, LogRecord};
pub use retry::{retry_with_backoff, Classify, FailureClass, RetryPolicy};
pub use usecases::session_guard::{GuardConfig, GuardDeps, GuardError, GuardHandle, SessionGuard};
