//! Event-to-destination routing
//!
//! The router owns every destination the logger can write to. Standard routes
//! (one per level, or a single unified one) are built once at construction;
//! tagged sub-routes are created lazily when an event carries a routing tag
//! and cached for the logger's lifetime.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::config::LogConfig;
use crate::core::encoder::{self, Encoder};
use crate::core::error::{LoggerError, Result};
use crate::core::event::LogEvent;
use crate::core::level::{LevelGate, LogLevel};
use crate::core::metrics::PipelineMetrics;
use crate::sinks::{RotatingFileSink, RotationPolicy, TeeSink};

use super::route::{Route, RouteKey};

pub struct Router {
    base_dir: PathBuf,
    single_file: bool,
    file_name: String,
    mirror_console: bool,
    policy: RotationPolicy,
    encoder: Box<dyn Encoder>,
    gate: Arc<LevelGate>,
    metrics: Arc<PipelineMetrics>,
    /// Per-level routes, or one unified route in single-file mode
    standard: Vec<Arc<Route>>,
    /// Tagged sub-routes keyed by resolved file path
    sub_routes: Mutex<HashMap<PathBuf, Arc<Route>>>,
}

impl Router {
    /// Build the router and open every standard route under
    /// `directory/[service_id]/[service_name]`.
    pub fn new(
        service: &str,
        service_id: &str,
        config: &LogConfig,
        gate: Arc<LevelGate>,
        metrics: Arc<PipelineMetrics>,
    ) -> Result<Self> {
        let mut base_dir = PathBuf::from(&config.directory);
        if !service_id.is_empty() {
            base_dir.push(service_id);
        }
        if !service.is_empty() {
            base_dir.push(service);
        }
        std::fs::create_dir_all(&base_dir).map_err(|e| {
            LoggerError::io_operation(
                "creating log directory",
                base_dir.display().to_string(),
                e,
            )
        })?;

        let policy = RotationPolicy::from_config(config);
        let mut router = Self {
            base_dir,
            single_file: config.single_file,
            file_name: config.single_file_name.clone(),
            mirror_console: config.console,
            policy,
            encoder: encoder::from_config(config),
            gate,
            metrics,
            standard: Vec::new(),
            sub_routes: Mutex::new(HashMap::new()),
        };
        router.standard = router.open_standard_routes()?;
        Ok(router)
    }

    fn open_standard_routes(&self) -> Result<Vec<Arc<Route>>> {
        if self.single_file {
            let path = self.base_dir.join(&self.file_name);
            let route = self.open_route(
                RouteKey {
                    level: None,
                    tag: None,
                },
                path,
            )?;
            return Ok(vec![route]);
        }

        let mut routes = Vec::with_capacity(LogLevel::all().len());
        for level in LogLevel::all() {
            let path = self.base_dir.join(format!("{}.log", level.file_stem()));
            routes.push(self.open_route(
                RouteKey {
                    level: Some(level),
                    tag: None,
                },
                path,
            )?);
        }
        Ok(routes)
    }

    fn open_route(&self, key: RouteKey, path: PathBuf) -> Result<Arc<Route>> {
        let file = RotatingFileSink::open(&path, self.policy.clone())?;
        let sink = TeeSink::new(file, self.mirror_console);
        Ok(Arc::new(Route::new(key, path, sink)))
    }

    fn standard_route(&self, level: LogLevel) -> &Arc<Route> {
        if self.single_file {
            &self.standard[0]
        } else {
            &self.standard[level as usize]
        }
    }

    /// File name an event for `level` lands in.
    fn file_name_for(&self, level: LogLevel) -> String {
        if self.single_file {
            self.file_name.clone()
        } else {
            format!("{}.log", level.file_stem())
        }
    }

    /// Resolve (opening and caching if needed) the sub-route for a tag.
    ///
    /// The tag names a sub-directory under the base; if that directory cannot
    /// be created the event falls back to the base directory itself.
    fn sub_route(&self, tag: &str, level: LogLevel) -> Result<Arc<Route>> {
        let tag_dir = self.base_dir.join(tag);
        let dir = match std::fs::create_dir_all(&tag_dir) {
            Ok(()) => tag_dir,
            Err(e) => {
                eprintln!(
                    "[logroute] cannot create tag directory {}: {}, using base directory",
                    tag_dir.display(),
                    e
                );
                self.base_dir.clone()
            }
        };
        let path = dir.join(self.file_name_for(level));

        let mut cache = self.sub_routes.lock();
        if let Some(route) = cache.get(&path) {
            return Ok(Arc::clone(route));
        }
        let route = self.open_route(
            RouteKey {
                level: if self.single_file { None } else { Some(level) },
                tag: Some(tag.to_string()),
            },
            path.clone(),
        )?;
        cache.insert(path, Arc::clone(&route));
        Ok(route)
    }

    /// Encode and write one event to its destination.
    ///
    /// Events below the gate threshold produce zero writes. Sink failures
    /// are counted and reported once on stderr, never propagated as panics.
    pub fn dispatch(&self, event: &LogEvent) {
        if !self.gate.enabled(event.level) {
            return;
        }
        let bytes = self.encoder.encode(event);

        let result = match &event.route_tag {
            Some(tag) => match self.sub_route(tag, event.level) {
                Ok(route) => route.write(&bytes),
                Err(e) => Err(e),
            },
            None => self.standard_route(event.level).write(&bytes),
        };

        if let Err(e) = result {
            self.metrics.record_write_failure();
            eprintln!("[logroute] write failed: {}", e);
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn flush(&self) -> Result<()> {
        let mut first_err = None;
        for route in &self.standard {
            if let Err(e) = route.flush() {
                first_err.get_or_insert(e);
            }
        }
        for route in self.sub_routes.lock().values() {
            if let Err(e) = route.flush() {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Flush and close every route, standard and cached, exactly once.
    pub fn close(&self) {
        for route in &self.standard {
            if let Err(e) = route.close() {
                eprintln!("[logroute] close failed for {}: {}", route.path().display(), e);
            }
        }
        for route in self.sub_routes.lock().values() {
            if let Err(e) = route.close() {
                eprintln!("[logroute] close failed for {}: {}", route.path().display(), e);
            }
        }
    }
}
