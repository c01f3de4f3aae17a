//! Structured logging setup.

use crate::error::BridgeError;
use std::env;
use std::fs::{File, OpenOptions};
use std::io;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const ENV_TRACE: &str = "CBC_BRIDGE_TRACE";
const ENV_LOG_FORMAT: &str = "CBC_BRIDGE_LOG_FORMAT";
const ENV_LOG_FILE: &str = "CBC_BRIDGE_LOG_FILE";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Result<Self, BridgeError> {
        if raw.eq_ignore_ascii_case("pretty") {
            Ok(LogFormat::Pretty)
        } else if raw.eq_ignore_ascii_case("json") {
            Ok(LogFormat::Json)
        } else {
            Err(BridgeError::invalid_input(
                "init_logging",
                format!("invalid {ENV_LOG_FORMAT} {raw:?} (expected 'json' or 'pretty')"),
            ))
        }
    }
}

fn open_log_file(path: &str) -> Result<Mutex<File>, BridgeError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(Mutex::new)
        .map_err(|err| {
            BridgeError::invalid_input("init_logging", format!("failed to open log file: {err}"))
        })
}

fn map_init_err<E: std::fmt::Display>(err: E) -> BridgeError {
    BridgeError::invalid_input("init_logging", format!("failed to initialize logging: {err}"))
}

fn build_filter(level: &str) -> Result<EnvFilter, BridgeError> {
    if level.eq_ignore_ascii_case("off") {
        return Ok(EnvFilter::default().add_directive(LevelFilter::OFF.into()));
    }
    EnvFilter::try_new(level).map_err(|err| {
        BridgeError::invalid_input("init_logging", format!("invalid log filter: {err}"))
    })
}

/// Enable structured logging for the bridge.
///
/// When `level` is `None`, this reads `CBC_BRIDGE_TRACE` if set, otherwise
/// logging stays `off`. `CBC_BRIDGE_LOG_FORMAT` picks `pretty` (default) or
/// `json`; `CBC_BRIDGE_LOG_FILE` adds a file sink. Returns `Ok(false)` when a
/// global subscriber is already installed.
///
/// # Errors
///
/// Returns `InvalidInput` for an unparsable filter or format, or when the log
/// file cannot be opened.
pub fn init_logging(level: Option<&str>) -> Result<bool, BridgeError> {
    if tracing::dispatcher::has_been_set() {
        return Ok(false);
    }

    let level_value = level
        .map(str::to_string)
        .or_else(|| env::var(ENV_TRACE).ok())
        .unwrap_or_else(|| "off".to_string());
    let filter = build_filter(&level_value)?;
    let format = match env::var(ENV_LOG_FORMAT) {
        Ok(raw) => LogFormat::parse(&raw)?,
        Err(_) => LogFormat::Pretty,
    };
    let log_file = env::var(ENV_LOG_FILE).ok();

    match format {
        LogFormat::Json => {
            let stderr_layer = tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .json();
            let base = tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer);
            if let Some(path) = log_file {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(open_log_file(&path)?)
                    .with_ansi(false)
                    .json();
                base.with(file_layer).try_init().map_err(map_init_err)?;
            } else {
                base.try_init().map_err(map_init_err)?;
            }
        }
        LogFormat::Pretty => {
            let stderr_layer = tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .pretty();
            let base = tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer);
            if let Some(path) = log_file {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(open_log_file(&path)?)
                    .with_ansi(false)
                    .pretty();
                base.with(file_layer).try_init().map_err(map_init_err)?;
            } else {
                base.try_init().map_err(map_init_err)?;
            }
        }
    }

    Ok(true)
}
