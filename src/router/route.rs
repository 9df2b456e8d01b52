//! A single routing destination

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::error::Result;
use crate::core::level::LogLevel;
use crate::sinks::{Sink, TeeSink};

/// Identity of a route: a level bucket (`None` in single-file mode, where
/// every level shares one route) plus an optional sub-directory tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub level: Option<LogLevel>,
    pub tag: Option<String>,
}

/// One destination: a sink behind a mutex, closed exactly once.
pub struct Route {
    key: RouteKey,
    path: PathBuf,
    sink: Mutex<TeeSink>,
    closed: AtomicBool,
}

impl Route {
    pub fn new(key: RouteKey, path: PathBuf, sink: TeeSink) -> Self {
        Self {
            key,
            path,
            sink: Mutex::new(sink),
            closed: AtomicBool::new(false),
        }
    }

    pub fn key(&self) -> &RouteKey {
        &self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(crate::core::error::LoggerError::sink(
                self.path.display().to_string(),
                "route is closed",
            ));
        }
        self.sink.lock().write(bytes)
    }

    pub fn flush(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(());
        }
        self.sink.lock().flush()
    }

    /// Flush and release the sink. Later calls are no-ops.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.sink.lock().close()
    }
}
