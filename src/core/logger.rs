//! The logger engine
//!
//! A `Logger` wires the level gate, the router, the safe formatter, the
//! caller cache, and (in async mode) the ingestion pipeline into one value.
//! Everything observable about a record is fixed on the calling thread:
//! message formatting, argument capture, caller resolution, and the
//! timestamp all happen before the event is enqueued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::caller::{CacheStats, SkipCache};
use super::config::LogConfig;
use super::error::{LoggerError, Result};
use super::event::LogEvent;
use super::field::Attrs;
use super::level::{LevelGate, LogLevel};
use super::metrics::{MetricsSnapshot, PipelineMetrics};
use super::pipeline::{AsyncPipeline, SubmitPolicy};
use super::safe_format::{SafeArg, SafeFormatter, SerializerStats};
use crate::router::Router;

pub struct Logger {
    config: LogConfig,
    gate: Arc<LevelGate>,
    router: Arc<Router>,
    pipeline: Option<AsyncPipeline>,
    skip_cache: SkipCache,
    formatter: SafeFormatter,
    metrics: Arc<PipelineMetrics>,
    shut_down: AtomicBool,
}

impl Logger {
    /// Build a logger for `service` (optionally namespaced by `service_id`)
    /// from a validated configuration snapshot.
    pub fn new(service: &str, service_id: &str, config: &LogConfig) -> Result<Self> {
        config.validate()?;

        let gate = Arc::new(LevelGate::new(config.level));
        let metrics = Arc::new(PipelineMetrics::new());
        let router = Arc::new(Router::new(
            service,
            service_id,
            config,
            Arc::clone(&gate),
            Arc::clone(&metrics),
        )?);

        let pipeline = if config.enable_async {
            let policy = if config.async_drop_on_full {
                SubmitPolicy::DropOnFull
            } else {
                SubmitPolicy::Block
            };
            let worker_router = Arc::clone(&router);
            Some(AsyncPipeline::start_with_metrics(
                config.async_buffer_size,
                policy,
                Arc::clone(&metrics),
                move |event| worker_router.dispatch(&event),
            )?)
        } else {
            None
        };

        Ok(Self {
            config: config.clone(),
            gate,
            router,
            pipeline,
            skip_cache: SkipCache::new(),
            formatter: SafeFormatter::new(),
            metrics,
            shut_down: AtomicBool::new(false),
        })
    }

    fn emit(&self, level: LogLevel, message: String, attrs: Attrs) {
        if !self.gate.enabled(level) || self.shut_down.load(Ordering::Acquire) {
            return;
        }

        let caller = if self.config.show_location {
            self.skip_cache.capture()
        } else {
            None
        };
        let event = LogEvent::new(level, message)
            .with_attrs(attrs)
            .with_caller(caller);

        match &self.pipeline {
            Some(pipeline) => {
                // queue-full and stopped errors are already counted and
                // reported by the pipeline itself
                let _ = pipeline.submit(event);
            }
            None => {
                self.metrics.record_submitted();
                self.router.dispatch(&event);
                self.metrics.record_processed();
            }
        }

        if level == LogLevel::Fatal {
            let _ = self.flush();
        }
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(level, message.into(), Vec::new());
    }

    /// Format `template` with safely captured `args` and log the result.
    pub fn log_args(&self, level: LogLevel, template: &str, args: &[&dyn SafeArg]) {
        if !self.gate.enabled(level) {
            return;
        }
        let message = self.formatter.format(template, args);
        self.emit(level, message, Vec::new());
    }

    /// Log with structured attributes; reserved routing keys redirect the
    /// record to a sub-directory.
    pub fn log_with(&self, level: LogLevel, message: impl Into<String>, attrs: Attrs) {
        self.emit(level, message.into(), attrs);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }

    pub fn debug_args(&self, template: &str, args: &[&dyn SafeArg]) {
        self.log_args(LogLevel::Debug, template, args);
    }

    pub fn info_args(&self, template: &str, args: &[&dyn SafeArg]) {
        self.log_args(LogLevel::Info, template, args);
    }

    pub fn warn_args(&self, template: &str, args: &[&dyn SafeArg]) {
        self.log_args(LogLevel::Warn, template, args);
    }

    pub fn error_args(&self, template: &str, args: &[&dyn SafeArg]) {
        self.log_args(LogLevel::Error, template, args);
    }

    pub fn fatal_args(&self, template: &str, args: &[&dyn SafeArg]) {
        self.log_args(LogLevel::Fatal, template, args);
    }

    pub fn debug_with(&self, message: impl Into<String>, attrs: Attrs) {
        self.log_with(LogLevel::Debug, message, attrs);
    }

    pub fn info_with(&self, message: impl Into<String>, attrs: Attrs) {
        self.log_with(LogLevel::Info, message, attrs);
    }

    pub fn warn_with(&self, message: impl Into<String>, attrs: Attrs) {
        self.log_with(LogLevel::Warn, message, attrs);
    }

    pub fn error_with(&self, message: impl Into<String>, attrs: Attrs) {
        self.log_with(LogLevel::Error, message, attrs);
    }

    pub fn fatal_with(&self, message: impl Into<String>, attrs: Attrs) {
        self.log_with(LogLevel::Fatal, message, attrs);
    }

    /// Log a warning routed to the `emergency` sub-directory for operator
    /// attention.
    pub fn critical(&self, message: impl Into<String>) {
        if !self.gate.enabled(LogLevel::Warn) || self.shut_down.load(Ordering::Acquire) {
            return;
        }
        let event = LogEvent::new(LogLevel::Warn, message.into()).with_route_tag("emergency");
        self.submit_event(event);
    }

    /// Log an error routed to the `emergency` sub-directory.
    pub fn disaster(&self, message: impl Into<String>) {
        if !self.gate.enabled(LogLevel::Error) || self.shut_down.load(Ordering::Acquire) {
            return;
        }
        let event = LogEvent::new(LogLevel::Error, message.into()).with_route_tag("emergency");
        self.submit_event(event);
    }

    /// Format, log at error level, and hand the same text back as an error
    /// value for the caller to propagate.
    pub fn report_error(&self, template: &str, args: &[&dyn SafeArg]) -> LoggerError {
        let message = self.formatter.format(template, args);
        self.emit(LogLevel::Error, message.clone(), Vec::new());
        LoggerError::Other(message)
    }

    fn submit_event(&self, event: LogEvent) {
        match &self.pipeline {
            Some(pipeline) => {
                let _ = pipeline.submit(event);
            }
            None => {
                self.metrics.record_submitted();
                self.router.dispatch(&event);
                self.metrics.record_processed();
            }
        }
    }

    /// Re-aim the level gate at runtime. An unparsable level falls back to
    /// `Info` and the parse error is returned.
    pub fn update_level(&self, level: &str) -> Result<LogLevel> {
        self.gate.set_from_str(level)
    }

    /// Would a record at this textual level currently be written?
    pub fn check_level(&self, level: &str) -> bool {
        self.gate.check_str(level)
    }

    pub fn level(&self) -> LogLevel {
        self.gate.threshold()
    }

    pub fn flush(&self) -> Result<()> {
        self.router.flush()
    }

    /// Drain the pipeline and close every route. Idempotent; once shut down
    /// the logger silently discards further records.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(pipeline) = &self.pipeline {
            pipeline.shutdown();
        }
        self.router.close();
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn caller_cache_stats(&self) -> CacheStats {
        self.skip_cache.stats()
    }

    pub fn serializer_stats(&self) -> SerializerStats {
        self.formatter.stats()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown();
    }
}
