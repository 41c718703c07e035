//! Tracing layer feeding the in-session diagnostics buffer.
//!
//! WARN and ERROR events from every crate land in [`DiagnosticLog`], so a
//! diagnostics dump shows the failures that led up to it. Records the buffer
//! mirrors to tracing itself carry [`MIRROR_TARGET`] and are skipped.

use std::fmt;

use chrono::Utc;
use sf_app::diagnostics::{DiagnosticLog, LogLevel, LogRecord, MIRROR_TARGET};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

pub struct DiagnosticsLayer {
    log: &'static DiagnosticLog,
}

impl DiagnosticsLayer {
    pub fn new(log: &'static DiagnosticLog) -> Self {
        Self { log }
    }

    /// Layer writing into the process-wide buffer.
    pub fn global() -> Self {
        Self::new(DiagnosticLog::global())
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: String,
    error: Option<String>,
    fields: Vec<String>,
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "error" => self.error = Some(value.to_string()),
            name => self.fields.push(format!("{name}={value}")),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{value:?}"),
            "error" => self.error = Some(format!("{value:?}")),
            name => self.fields.push(format!("{name}={value:?}")),
        }
    }
}

impl<S: Subscriber> Layer<S> for DiagnosticsLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = if *metadata.level() == Level::ERROR {
            LogLevel::Error
        } else if *metadata.level() == Level::WARN {
            LogLevel::Warn
        } else {
            return;
        };
        if metadata.target() == MIRROR_TARGET {
            return;
        }

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let mut context = vec![metadata.target().to_string()];
        context.extend(visitor.fields);

        self.log.record(LogRecord {
            level,
            message: visitor.message,
            error: visitor.error,
            context: Some(context.join(" ")),
            timestamp: Utc::now(),
            platform: std::env::consts::OS,
        });
    }
}
