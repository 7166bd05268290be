//! Structured logging for the panorama pipeline.
//!
//! Workers run on blocking threads and must never take a lock to log,
//! so the level gate is a single atomic load and each line is an
//! append-only write. Levels:
//! - ERROR: stage failures and unrecoverable task errors
//! - WARN: unexpected but recoverable conditions
//! - INFO: task lifecycle notifications (submitted, completed, swept)
//! - DEBUG: per-stage traces (dimensions, paths, progress updates)
//! - TRACE: very detailed traces (per-image loads, sweep internals)
//!
//! Debug mode can be enabled with `--debug` or `PANOVR_DEBUG=1`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Log levels for filtering messages, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

/// Initialize logging to `~/.panovr/panovr.log`.
///
/// `debug` (or `PANOVR_DEBUG=1` in the environment) raises the level
/// from INFO to DEBUG. The log file is truncated on startup.
pub fn init_with_debug(debug: bool) {
    let env_debug = std::env::var("PANOVR_DEBUG")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let level = if debug || env_debug {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let path = dirs::home_dir().map(|h| h.join(".panovr").join("panovr.log"));
    init_at(path, level);
}

/// Initialize logging to an explicit path (None disables file output).
pub fn init_at(path: Option<PathBuf>, level: LogLevel) {
    set_level(level);
    if let Some(path) = path {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = std::fs::write(&path, "");
        LOG_PATH.set(path).ok();
    }
}

/// Set the minimum log level for output.
pub fn set_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

/// Check whether a message at `level` would currently be written.
pub fn enabled(level: LogLevel) -> bool {
    level as u8 <= LOG_LEVEL.load(Ordering::Relaxed)
}

/// Append one line to the log file if `level` passes the filter.
pub fn write_line(level: LogLevel, msg: &str) {
    if !enabled(level) {
        return;
    }
    if let Some(path) = LOG_PATH.get() {
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            let _ = writeln!(file, "{} [{:5}] {}", timestamp, level.as_str(), msg);
        }
    }
}

/// Log macro for INFO level.
#[macro_export]
macro_rules! plog {
    ($($arg:tt)*) => {
        $crate::log::write_line($crate::log::LogLevel::Info, &format!($($arg)*))
    };
}

/// Log macro for ERROR level.
#[macro_export]
macro_rules! plog_error {
    ($($arg:tt)*) => {
        $crate::log::write_line($crate::log::LogLevel::Error, &format!($($arg)*))
    };
}

/// Log macro for WARN level.
#[macro_export]
macro_rules! plog_warn {
    ($($arg:tt)*) => {
        $crate::log::write_line($crate::log::LogLevel::Warn, &format!($($arg)*))
    };
}

/// Log macro for DEBUG level (only written in debug mode).
#[macro_export]
macro_rules! plog_debug {
    ($($arg:tt)*) => {
        $crate::log::write_line($crate::log::LogLevel::Debug, &format!($($arg)*))
    };
}

/// Log macro for TRACE level (very verbose).
#[macro_export]
macro_rules! plog_trace {
    ($($arg:tt)*) => {
        $crate::log::write_line($crate::log::LogLevel::Trace, &format!($($arg)*))
    };
}
