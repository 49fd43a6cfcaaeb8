//! Log sink for the `log` facade
//!
//! Writes `[LEVEL] target: message` lines to stderr, or to a log file when
//! one is given.

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use thiserror::Error;

/// Log levels, least to most verbose
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Nothing = 0,
    User = 1,
    Error = 2,
    Warning = 3,
    Info = 4,
    Debug = 5,
    All = 6,
}

impl LogLevel {
    /// Create a LogLevel from an integer
    pub fn from_i32(level: i32) -> Self {
        match level {
            0 => LogLevel::Nothing,
            1 => LogLevel::User,
            2 => LogLevel::Error,
            3 => LogLevel::Warning,
            4 => LogLevel::Info,
            5 => LogLevel::Debug,
            6 => LogLevel::All,
            _ => LogLevel::Info,
        }
    }

    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// Level for a count of `-v` flags; warnings are always shown
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => LogLevel::Warning,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::All,
        }
    }

    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Nothing => LevelFilter::Off,
            LogLevel::User | LogLevel::Error => LevelFilter::Error,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::All => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file {path}: {source}")]
    OpenFile {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("another logger is already installed")]
    AlreadySet,
}

// Log file handle; stderr when empty
static LOG_FILE: Mutex<Option<File>> = parking_lot::const_mutex(None);
static INSTALLED: AtomicBool = AtomicBool::new(false);
static LOGGER: Logger = Logger;

struct Logger;

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record.level(), record.target(), record.args());

        let mut guard = LOG_FILE.lock();
        match guard.as_mut() {
            Some(file) => {
                let _ = writeln!(file, "{}", line);
            }
            None => eprintln!("{}", line),
        }
    }

    fn flush(&self) {
        if let Some(file) = LOG_FILE.lock().as_mut() {
            let _ = file.flush();
        }
    }
}

fn format_line(level: log::Level, target: &str, args: &fmt::Arguments) -> String {
    format!("[{}] {}: {}", level, target, args)
}

/// Install the logger, or reconfigure it if already installed.
///
/// `log_file` is created (truncated) and receives every line from now on.
pub fn init(level: LogLevel, log_file: Option<&Path>) -> Result<(), LoggingError> {
    let file = log_file
        .map(|path| {
            File::create(path).map_err(|source| LoggingError::OpenFile {
                path: path.display().to_string(),
                source,
            })
        })
        .transpose()?;
    *LOG_FILE.lock() = file;

    if !INSTALLED.swap(true, Ordering::SeqCst) {
        log::set_logger(&LOGGER).map_err(|_| LoggingError::AlreadySet)?;
    }
    log::set_max_level(level.to_level_filter());
    Ok(())
}
