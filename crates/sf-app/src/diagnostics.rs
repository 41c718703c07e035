//! In-session diagnostics log.
//!
//! A bounded FIFO of recent log records kept in memory for "send diagnostics"
//! style dumps. Nothing is persisted; the buffer dies with the process.

use std::collections::VecDeque;
use std::fmt::Display;
use std::sync::{Mutex, OnceLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Target used when diagnostics records are mirrored to `tracing`.
///
/// The diagnostics tracing layer skips this target so mirrored records are not stored twice.
pub const MIRROR_TARGET: &str = "diagnostics";

pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub platform: &'static str,
}

struct Ring {
    capacity: usize,
    records: VecDeque<LogRecord>,
}

impl Ring {
    fn push(&mut self, record: LogRecord) {
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }
}

/// Ring buffer of the most recent log records. Oldest records are evicted first.
pub struct DiagnosticLog {
    ring: Mutex<Ring>,
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DiagnosticLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: Mutex::new(Ring {
                capacity,
                records: VecDeque::with_capacity(capacity),
            }),
        }
    }

    /// Process-wide instance.
    pub fn global() -> &'static DiagnosticLog {
        static GLOBAL: OnceLock<DiagnosticLog> = OnceLock::new();
        GLOBAL.get_or_init(DiagnosticLog::default)
    }

    fn ring(&self) -> std::sync::MutexGuard<'_, Ring> {
        // A panic while holding the lock cannot leave the deque half-updated.
        self.ring.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Change the capacity, evicting the oldest records if the buffer shrinks.
    pub fn set_capacity(&self, capacity: usize) {
        let mut ring = self.ring();
        ring.capacity = capacity.max(1);
        while ring.records.len() > ring.capacity {
            ring.records.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.ring().capacity
    }

    /// Append a record and mirror it to `tracing`.
    pub fn log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        error: Option<&dyn Display>,
        context: Option<&str>,
    ) {
        let record = LogRecord {
            level,
            message: message.into(),
            error: error.map(|e| e.to_string()),
            context: context.map(str::to_string),
            timestamp: Utc::now(),
            platform: std::env::consts::OS,
        };
        mirror(&record);
        self.record(record);
    }

    /// Append a prepared record without mirroring it.
    pub fn record(&self, record: LogRecord) {
        self.ring().push(record);
    }

    pub fn info(&self, message: impl Into<String>, context: Option<&str>) {
        self.log(LogLevel::Info, message, None, context);
    }

    pub fn warn(&self, message: impl Into<String>, error: Option<&dyn Display>, context: Option<&str>) {
        self.log(LogLevel::Warn, message, error, context);
    }

    pub fn error(&self, message: impl Into<String>, error: Option<&dyn Display>, context: Option<&str>) {
        self.log(LogLevel::Error, message, error, context);
    }

    /// Copy of the buffer, oldest first.
    pub fn records(&self) -> Vec<LogRecord> {
        self.ring().records.iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.ring().records.clear();
    }

    pub fn len(&self) -> usize {
        self.ring().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring().records.is_empty()
    }
}

fn mirror(record: &LogRecord) {
    let error = record.error.as_deref().unwrap_or("");
    let context = record.context.as_deref().unwrap_or("");
    match record.level {
        LogLevel::Info => {
            tracing::info!(target: MIRROR_TARGET, error, context, "{}", record.message)
        }
        LogLevel::Warn => {
            tracing::warn!(target: MIRROR_TARGET, error, context, "{}", record.message)
        }
        LogLevel::Error => {
            tracing::error!(target: MIRROR_TARGET, error, context, "{}", record.message)
        }
    }
}
