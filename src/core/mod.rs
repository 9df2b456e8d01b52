//! Core logging types and machinery

pub mod caller;
pub mod config;
pub mod encoder;
pub mod error;
pub mod event;
pub mod field;
pub mod level;
pub mod logger;
pub mod metrics;
pub mod pipeline;
pub mod safe_format;

pub use caller::{CacheStats, SkipCache};
pub use config::{LogConfig, LogFormat};
pub use error::{LoggerError, Result};
pub use event::{CallerInfo, LogEvent};
pub use field::{Attrs, FieldValue};
pub use level::{LevelGate, LogLevel};
pub use logger::Logger;
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use pipeline::{AsyncPipeline, SubmitPolicy};
pub use safe_format::{SafeArg, SafeBytes, SafeErr, SafeFormatter, SafeValue, SerializerStats};
