//! Process-global logging entry points
//!
//! The global logger is a snapshot cell: one `Arc<Logger>` swapped whole on
//! (re)initialization, read with a cheap clone on every call. Free functions
//! mirror every `Logger` method so call sites never thread a handle around.
//!
//! Use before `init` is a programming error: by default it panics; with
//! `panic_on_uninitialized` off, records are counted and discarded instead.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::core::caller::CacheStats;
use crate::core::config::LogConfig;
use crate::core::error::{LoggerError, Result};
use crate::core::field::Attrs;
use crate::core::level::LogLevel;
use crate::core::logger::Logger;
use crate::core::metrics::MetricsSnapshot;
use crate::core::safe_format::{SafeArg, SerializerStats};

static GLOBAL: RwLock<Option<Arc<Logger>>> = RwLock::new(None);
static PANIC_ON_UNINITIALIZED: AtomicBool = AtomicBool::new(true);
static MISSED: AtomicU64 = AtomicU64::new(0);

/// Install the global logger for `service`.
///
/// `level` overrides the configured threshold; an unparsable value falls
/// back to `Info` with a diagnostic on stderr. Re-initialization shuts the
/// previous logger down first, draining anything it still holds.
pub fn init(service: &str, service_id: &str, level: &str, mut config: LogConfig) -> Result<()> {
    match level.parse::<LogLevel>() {
        Ok(parsed) => config.level = parsed,
        Err(e) => {
            eprintln!("[logroute] {}, defaulting to info", e);
            config.level = LogLevel::Info;
        }
    }

    let logger = Arc::new(Logger::new(service, service_id, &config)?);
    PANIC_ON_UNINITIALIZED.store(config.panic_on_uninitialized, Ordering::Relaxed);

    let previous = GLOBAL.write().replace(logger);
    if let Some(previous) = previous {
        previous.shutdown();
    }
    Ok(())
}

/// Shut down and remove the global logger; safe to call when none is set.
pub fn close() {
    if let Some(logger) = GLOBAL.write().take() {
        logger.shutdown();
    }
}

pub fn is_initialized() -> bool {
    GLOBAL.read().is_some()
}

/// Records discarded because no logger was installed (non-panicking mode).
pub fn missed_count() -> u64 {
    MISSED.load(Ordering::Relaxed)
}

fn current() -> Option<Arc<Logger>> {
    GLOBAL.read().clone()
}

// The escalation path must not log; a panic or a counter bump is all that
// happens here.
fn on_uninitialized() {
    if PANIC_ON_UNINITIALIZED.load(Ordering::Relaxed) {
        panic!("logroute used before init(); call logroute::init() during startup");
    }
    MISSED.fetch_add(1, Ordering::Relaxed);
}

fn with_logger(f: impl FnOnce(&Logger)) {
    match current() {
        Some(logger) => f(&logger),
        None => on_uninitialized(),
    }
}

pub fn log(level: LogLevel, message: impl Into<String>) {
    let message = message.into();
    with_logger(|logger| logger.log(level, message));
}

pub fn debug(message: impl Into<String>) {
    log(LogLevel::Debug, message);
}

pub fn info(message: impl Into<String>) {
    log(LogLevel::Info, message);
}

pub fn warn(message: impl Into<String>) {
    log(LogLevel::Warn, message);
}

pub fn error(message: impl Into<String>) {
    log(LogLevel::Error, message);
}

pub fn fatal(message: impl Into<String>) {
    log(LogLevel::Fatal, message);
}

pub fn log_args(level: LogLevel, template: &str, args: &[&dyn SafeArg]) {
    with_logger(|logger| logger.log_args(level, template, args));
}

pub fn debug_args(template: &str, args: &[&dyn SafeArg]) {
    log_args(LogLevel::Debug, template, args);
}

pub fn info_args(template: &str, args: &[&dyn SafeArg]) {
    log_args(LogLevel::Info, template, args);
}

pub fn warn_args(template: &str, args: &[&dyn SafeArg]) {
    log_args(LogLevel::Warn, template, args);
}

pub fn error_args(template: &str, args: &[&dyn SafeArg]) {
    log_args(LogLevel::Error, template, args);
}

pub fn fatal_args(template: &str, args: &[&dyn SafeArg]) {
    log_args(LogLevel::Fatal, template, args);
}

pub fn log_with(level: LogLevel, message: impl Into<String>, attrs: Attrs) {
    let message = message.into();
    with_logger(|logger| logger.log_with(level, message, attrs));
}

pub fn debug_with(message: impl Into<String>, attrs: Attrs) {
    log_with(LogLevel::Debug, message, attrs);
}

pub fn info_with(message: impl Into<String>, attrs: Attrs) {
    log_with(LogLevel::Info, message, attrs);
}

pub fn warn_with(message: impl Into<String>, attrs: Attrs) {
    log_with(LogLevel::Warn, message, attrs);
}

pub fn error_with(message: impl Into<String>, attrs: Attrs) {
    log_with(LogLevel::Error, message, attrs);
}

pub fn fatal_with(message: impl Into<String>, attrs: Attrs) {
    log_with(LogLevel::Fatal, message, attrs);
}

/// Warning routed to the `emergency` sub-directory.
pub fn critical(message: impl Into<String>) {
    let message = message.into();
    with_logger(|logger| logger.critical(message));
}

/// Error routed to the `emergency` sub-directory.
pub fn disaster(message: impl Into<String>) {
    let message = message.into();
    with_logger(|logger| logger.disaster(message));
}

/// Log at error level and return the formatted message as an error value.
pub fn report_error(template: &str, args: &[&dyn SafeArg]) -> LoggerError {
    match current() {
        Some(logger) => logger.report_error(template, args),
        None => {
            on_uninitialized();
            LoggerError::NotInitialized
        }
    }
}

/// Re-aim the global level gate; unparsable levels fall back to `Info`.
pub fn update_level(level: &str) -> Result<LogLevel> {
    match current() {
        Some(logger) => {
            let result = logger.update_level(level);
            if let Err(e) = &result {
                eprintln!("[logroute] {}, defaulting to info", e);
            }
            result
        }
        None => Err(LoggerError::NotInitialized),
    }
}

pub fn check_level(level: &str) -> bool {
    current().map(|logger| logger.check_level(level)).unwrap_or(false)
}

pub fn flush() -> Result<()> {
    match current() {
        Some(logger) => logger.flush(),
        None => Err(LoggerError::NotInitialized),
    }
}

pub fn metrics() -> Option<MetricsSnapshot> {
    current().map(|logger| logger.metrics())
}

pub fn caller_cache_stats() -> Option<CacheStats> {
    current().map(|logger| logger.caller_cache_stats())
}

pub fn serializer_stats() -> Option<SerializerStats> {
    current().map(|logger| logger.serializer_stats())
}
