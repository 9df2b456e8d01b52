//! # logroute
//!
//! An embeddable structured-logging pipeline: asynchronous ingestion over a
//! bounded queue, race-safe argument capture, cached caller resolution, and
//! multi-destination routing (per-level files, single-file mode, and
//! tag-driven sub-directories) with size-based rotation.
//!
//! ## Features
//!
//! - **Async pipeline**: bounded queue feeding one worker thread; shutdown
//!   drains every accepted event exactly once
//! - **Safe capture**: arguments are snapshotted on the calling thread; a
//!   contended shared map degrades to a summary instead of blocking
//! - **Caller cache**: skip depths memoized per call site by return address
//! - **Routing**: one file per level (or one unified file), with reserved
//!   attribute keys redirecting records into sub-directories
//! - **Rotation**: size-based with numbered, optionally gzipped backups and
//!   age-based pruning
//!
//! ## Quick start
//!
//! ```no_run
//! use logroute::{info, init, LogConfig};
//!
//! fn main() -> logroute::Result<()> {
//!     init("checkout", "svc-7", "info", LogConfig::default())?;
//!     info!("service started on port {}", 8080);
//!     logroute::close();
//!     Ok(())
//! }
//! ```
//!
//! ## Instance use
//!
//! The engine is an ordinary value; embed it directly when a process hosts
//! several independent logging contexts:
//!
//! ```no_run
//! use logroute::{LogConfig, Logger};
//!
//! # fn main() -> logroute::Result<()> {
//! let logger = Logger::new("ingest", "", &LogConfig::default())?;
//! logger.info("instance logger up");
//! logger.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod facade;
pub mod router;
pub mod sinks;

#[macro_use]
mod macros;

pub use crate::core::{
    Attrs, CacheStats, CallerInfo, FieldValue, LogConfig, LogEvent, LogFormat, LogLevel, Logger,
    LoggerError, MetricsSnapshot, Result, SafeArg, SafeBytes, SafeErr, SafeValue, SerializerStats,
};
pub use facade::{
    check_level, close, critical, debug, debug_args, debug_with, disaster, error, error_args,
    error_with, fatal, fatal_args, fatal_with, flush, info, info_args, info_with, init,
    is_initialized, log, log_args, log_with, report_error, update_level, warn, warn_args,
    warn_with,
};

/// Commonly used items
pub mod prelude {
    pub use crate::core::{
        Attrs, FieldValue, LogConfig, LogFormat, LogLevel, Logger, LoggerError, Result, SafeArg,
    };
}
