//! Console logging plus a JSON error log file.
//!
//! Console verbosity comes from `RUST_LOG` when set, otherwise from
//! [`AppEnv`] raised by the `-v` count: `production` logs at info, `test`
//! is silent, anything else logs at debug. Error events are always appended
//! to the error log as JSON lines, whatever the console level.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, Layer};

use crate::config::{AppEnv, RelayConfig};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("could not open error log {path}: {source}")]
    ErrorLog {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Init(#[from] TryInitError),
}

/// Console level for an environment and a `-v` count.
pub fn console_level(app_env: AppEnv, verbosity: u8) -> LevelFilter {
    let base = match app_env {
        AppEnv::Production => LevelFilter::INFO,
        AppEnv::Test => LevelFilter::OFF,
        AppEnv::Development => LevelFilter::DEBUG,
    };
    let raised = match verbosity {
        0 => LevelFilter::OFF,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    base.max(raised)
}

fn open_error_log(path: &Path) -> Result<File, LoggingError> {
    let wrap = |source| LoggingError::ErrorLog {
        path: path.display().to_string(),
        source,
    };
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(wrap)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(wrap)
}

pub fn init(config: &RelayConfig, verbosity: u8) -> Result<(), LoggingError> {
    let level = console_level(config.app_env, verbosity);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    let console = fmt::layer().with_filter(filter);
    let errors = fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(Arc::new(open_error_log(&config.error_log)?))
        .with_filter(LevelFilter::ERROR);

    tracing_subscriber::registry()
        .with(console)
        .with(errors)
        .try_init()?;

    tracing::info!("Logging level: {} silent: {}", level, level == LevelFilter::OFF);
    Ok(())
}
