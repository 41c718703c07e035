//! Tracing configuration for Snapfeed
//!
//! One global subscriber, registered once at startup:
//!
//! - `EnvFilter`: `RUST_LOG` wins, otherwise debug builds log at debug, release at info
//! - stderr `fmt` layer (stdout is reserved for command output)
//! - non-blocking file layer under `<data_dir>/logs/` when the directory is writable
//! - Sentry layer when `SENTRY_DSN` is set
//! - [`DiagnosticsLayer`] copying warnings and errors into the diagnostics buffer

use std::{fs, io, path::Path, sync::OnceLock};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, prelude::*, registry};

use super::diagnostics_layer::DiagnosticsLayer;

const LOG_FILE_NAME: &str = "snapfeed.log";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static SENTRY_GUARD: OnceLock<sentry::ClientInitGuard> = OnceLock::new();

fn is_development() -> bool {
    cfg!(debug_assertions)
}

/// Default filter directives when `RUST_LOG` is not set.
pub fn build_filter_directives(is_dev: bool) -> Vec<String> {
    let crate_level = if is_dev { "debug" } else { "info" };
    vec![
        if is_dev { "debug" } else { "info" }.to_string(),
        // Connection pool chatter drowns the request logs
        "hyper_util=warn".to_string(),
        "reqwest=info".to_string(),
        "rustls=warn".to_string(),
        format!("sf_app={crate_level}"),
        format!("sf_infra={crate_level}"),
    ]
}

/// Register the global subscriber. `data_dir` enables file logging.
///
/// Returns `Err` if a global subscriber is already registered.
pub fn init_tracing_subscriber(data_dir: Option<&Path>) -> anyhow::Result<()> {
    let filter_directives = build_filter_directives(is_development());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter_directives.join(",")));

    let sentry_layer = if let Ok(dsn) = std::env::var("SENTRY_DSN") {
        let guard = sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                traces_sample_rate: 1.0,
                ..Default::default()
            },
        ));
        if SENTRY_GUARD.set(guard).is_err() {
            eprintln!("Sentry guard already initialized");
        }
        Some(sentry_tracing::layer())
    } else {
        None
    };

    let stderr_layer = fmt::layer()
        .with_timer(fmt::time::ChronoUtc::new(TIMESTAMP_FORMAT.to_string()))
        .with_level(true)
        .with_target(true)
        .with_ansi(cfg!(not(test)))
        .with_writer(BoxMakeWriter::new(io::stderr));

    let file_layer = match data_dir.map(build_file_writer).transpose() {
        Ok(writer) => writer.map(|writer| {
            fmt::layer()
                .with_timer(fmt::time::ChronoUtc::new(TIMESTAMP_FORMAT.to_string()))
                .with_level(true)
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .with_ansi(false)
                .with_writer(writer)
        }),
        Err(err) => {
            eprintln!("Failed to initialize file logging, continuing with stderr only: {err}");
            None
        }
    };

    registry()
        .with(env_filter)
        .with(sentry_layer)
        .with(DiagnosticsLayer::global())
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

fn build_file_writer(data_dir: &Path) -> anyhow::Result<NonBlocking> {
    let logs_dir = data_dir.join("logs");
    fs::create_dir_all(&logs_dir)?;

    let file_appender = tracing_appender::rolling::never(&logs_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    LOG_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Tracing log guard already initialized"))?;

    Ok(non_blocking)
}
