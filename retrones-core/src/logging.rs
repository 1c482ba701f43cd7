//! Logging.
//!
//! Records go through the `log` facade. When the frontend offers `GET_LOG_INTERFACE` they are
//! forwarded to its printf-style callback so they land in the frontend's own log; otherwise a
//! `simplelog` terminal logger at `Warn` is installed.

use std::ffi::{CString, c_void};
use std::sync::{Mutex, PoisonError};

use log::{Level, LevelFilter, Log, Metadata, Record};
use simplelog::{Config, SimpleLogger};

use crate::abi::{self, LogCallback, LogLevel, LogPrintfFn};

static HOST_PRINTF: Mutex<Option<LogPrintfFn>> = Mutex::new(None);

struct HostLogger;

static LOGGER: HostLogger = HostLogger;

fn host_level(level: Level) -> LogLevel {
    match level {
        Level::Error => LogLevel::Error,
        Level::Warn => LogLevel::Warn,
        Level::Info => LogLevel::Info,
        Level::Debug | Level::Trace => LogLevel::Debug,
    }
}

impl Log for HostLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let Some(printf) = *HOST_PRINTF.lock().unwrap_or_else(PoisonError::into_inner) else {
            return;
        };
        let Ok(message) = CString::new(format!("[retrones] {}", record.args())) else {
            return;
        };
        // SAFETY: the format consumes exactly one C string argument.
        unsafe { printf(host_level(record.level()), c"%s\n".as_ptr(), message.as_ptr()) };
    }

    fn flush(&self) {}
}

/// Install a logger. Safe to call on every `retro_set_environment`; the first logger installed
/// stays, but the frontend callback it forwards to is refreshed.
pub fn init(env: abi::EnvironmentFn) {
    let mut callback = LogCallback::default();
    // SAFETY: GET_LOG_INTERFACE fills a `retro_log_callback`.
    let supported = unsafe {
        env(
            abi::ENVIRONMENT_GET_LOG_INTERFACE,
            &mut callback as *mut LogCallback as *mut c_void,
        )
    };

    match callback.log.filter(|_| supported) {
        Some(printf) => {
            *HOST_PRINTF.lock().unwrap_or_else(PoisonError::into_inner) = Some(printf);
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(if cfg!(debug_assertions) {
                    LevelFilter::Debug
                } else {
                    LevelFilter::Info
                });
            }
        }
        None => {
            let _ = SimpleLogger::init(LevelFilter::Warn, Config::default());
        }
    }
}
