//! Caller location capture with return-address skip memoization
//!
//! Resolving file/line for a log call means walking the stack past the
//! logging wrappers to the first application frame. Symbolizing frames on
//! every call is expensive; the number of wrapper frames between the capture
//! point and the application is stable per call site, so it is memoized keyed
//! by the immediate caller's return address. Repeat calls pay for one cheap
//! unsymbolized walk plus a map lookup.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::event::CallerInfo;

/// Frames to skip before the capture machinery itself becomes visible:
/// `trace` closure, `capture`, the logger method, the facade function.
const BASE_SKIP: usize = 4;

/// Frames scanned past `BASE_SKIP` when searching for wrapper frames.
const FRAME_SCAN_LIMIT: usize = 8;

/// Memoized call sites; the cache stops growing past this.
const CACHE_CAPACITY: usize = 1000;

/// Symbol fragments identifying internal wrapper frames to skip past.
const WRAPPER_MARKERS: [&str; 2] = ["logroute::facade", "logroute::core::logger"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

/// Skip-depth cache keyed by return address.
pub struct SkipCache {
    entries: Mutex<HashMap<usize, usize>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for SkipCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SkipCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::with_capacity(64)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Resolve the application caller of the current log call.
    ///
    /// Returns `None` when the stack is too shallow or symbols are missing;
    /// the record is still written, just without a location.
    pub fn capture(&self) -> Option<CallerInfo> {
        let mut ips: Vec<*mut std::ffi::c_void> = Vec::with_capacity(BASE_SKIP + FRAME_SCAN_LIMIT);
        backtrace::trace(|frame| {
            ips.push(frame.ip());
            ips.len() < BASE_SKIP + FRAME_SCAN_LIMIT
        });

        if ips.len() <= BASE_SKIP {
            return None;
        }
        let key = ips[BASE_SKIP] as usize;

        let skip = {
            let cached = self.entries.lock().get(&key).copied();
            match cached {
                Some(skip) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    skip
                }
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    let skip = Self::scan_for_skip(&ips);
                    let mut entries = self.entries.lock();
                    if entries.len() < CACHE_CAPACITY {
                        entries.insert(key, skip);
                    }
                    skip
                }
            }
        };

        let ip = *ips.get(skip.min(ips.len() - 1))?;
        Self::symbolize(ip)
    }

    /// Find the deepest internal wrapper frame within the scan window; the
    /// application caller sits one frame above it.
    fn scan_for_skip(ips: &[*mut std::ffi::c_void]) -> usize {
        let mut deepest_wrapper = None;
        let limit = ips.len().min(BASE_SKIP + FRAME_SCAN_LIMIT);
        for (idx, ip) in ips.iter().enumerate().take(limit).skip(BASE_SKIP) {
            let mut is_wrapper = false;
            backtrace::resolve(*ip, |symbol| {
                if let Some(name) = symbol.name() {
                    let name = name.to_string();
                    if WRAPPER_MARKERS.iter().any(|marker| name.contains(marker)) {
                        is_wrapper = true;
                    }
                }
            });
            if is_wrapper {
                deepest_wrapper = Some(idx);
            }
        }
        match deepest_wrapper {
            Some(idx) => (idx + 1).min(ips.len() - 1),
            None => BASE_SKIP,
        }
    }

    fn symbolize(ip: *mut std::ffi::c_void) -> Option<CallerInfo> {
        let mut info = None;
        backtrace::resolve(ip, |symbol| {
            if info.is_none() {
                if let (Some(file), Some(line)) = (symbol.filename(), symbol.lineno()) {
                    info = Some(CallerInfo {
                        file: file.to_string_lossy().into_owned(),
                        line,
                    });
                }
            }
        });
        info
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.entries.lock().len(),
        }
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}
