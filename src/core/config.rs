//! Logger configuration snapshot

use serde::{Deserialize, Serialize};

use super::level::LogLevel;

/// Output encoding for log records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Immutable configuration snapshot for a logger instance.
///
/// A running logger never mutates its config; reconfiguration means building
/// a new logger from a new snapshot and swapping it in whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LogConfig {
    /// Minimum level that passes the gate
    pub level: LogLevel,
    /// Prefix prepended to every text-encoded record
    pub prefix: String,
    /// Record encoding
    pub format: LogFormat,
    /// Base directory for log files
    pub directory: String,
    /// Capture and render caller file/line
    pub show_location: bool,
    /// Trim caller paths to their last two components
    pub relative_paths: bool,
    /// Mirror file output to stdout
    pub console: bool,
    /// Route every level into one file instead of one file per level
    pub single_file: bool,
    /// File name used in single-file mode
    pub single_file_name: String,
    /// Rotate the active file once it exceeds this many megabytes
    pub max_size_mb: u64,
    /// Numbered backups kept per file; older ones are pruned
    pub max_backups: usize,
    /// Backups older than this many days are pruned (0 disables)
    pub retention_days: u64,
    /// Gzip rotated backups
    pub compress: bool,
    /// Enqueue events to a worker thread instead of writing inline
    pub enable_async: bool,
    /// Bounded queue capacity in async mode
    pub async_buffer_size: usize,
    /// When the queue is full: drop the event instead of blocking
    pub async_drop_on_full: bool,
    /// Panic on use before initialization; false counts and discards
    pub panic_on_uninitialized: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            prefix: String::new(),
            format: LogFormat::Text,
            directory: "logs".to_string(),
            show_location: true,
            relative_paths: true,
            console: false,
            single_file: false,
            single_file_name: "all.log".to_string(),
            max_size_mb: 100,
            max_backups: 10,
            retention_days: 30,
            compress: true,
            enable_async: true,
            async_buffer_size: 10_000,
            async_drop_on_full: false,
            panic_on_uninitialized: true,
        }
    }
}

impl LogConfig {
    /// Validate configuration bounds before building a logger from it.
    pub fn validate(&self) -> crate::core::error::Result<()> {
        if self.directory.trim().is_empty() {
            return Err(crate::core::error::LoggerError::config(
                "LogConfig",
                "directory must not be empty",
            ));
        }
        if self.max_size_mb == 0 {
            return Err(crate::core::error::LoggerError::config(
                "LogConfig",
                "max-size-mb must be at least 1",
            ));
        }
        if self.enable_async && self.async_buffer_size == 0 {
            return Err(crate::core::error::LoggerError::config(
                "LogConfig",
                "async-buffer-size must be at least 1",
            ));
        }
        if self.single_file && self.single_file_name.trim().is_empty() {
            return Err(crate::core::error::LoggerError::config(
                "LogConfig",
                "single-file-name must not be empty",
            ));
        }
        Ok(())
    }
}
