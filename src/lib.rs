pub mod aggregation;
pub mod cache;
pub mod calendar;
pub mod campaign;
pub mod core;
pub mod db;
pub mod details;
pub mod errors;
pub mod grid;
pub mod models;

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

pub use crate::core::ScorecardCore;
pub use crate::errors::{AppError, AppResult};

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

/// Daily-rolling JSON logs under `<data_dir>/logs`, filtered by
/// `RUST_LOG` with an `info` default.
pub fn init_tracing(data_dir: &Path) -> Result<(), String> {
    let log_dir = data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "scorecard.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())
}
