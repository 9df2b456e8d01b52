//! Log level definitions and the process-wide level gate

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Number of standard levels; sized for the gate's fast-path flag array.
pub const LEVEL_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 4,
}

impl LogLevel {
    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Lowercase name used for per-level log file names ("debug.log", ...).
    pub fn file_stem(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }

    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Debug => Blue,
            LogLevel::Info => Green,
            LogLevel::Warn => Yellow,
            LogLevel::Error => Red,
            LogLevel::Fatal => BrightRed,
        }
    }

    pub fn all() -> [LogLevel; LEVEL_COUNT] {
        [
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
            LogLevel::Fatal,
        ]
    }

    fn from_index(idx: u8) -> LogLevel {
        match idx {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            3 => LogLevel::Error,
            _ => LogLevel::Fatal,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = crate::core::error::LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            // The upper panic-ish levels of the wire format collapse into Fatal.
            "fatal" | "panic" | "dpanic" | "critical" => Ok(LogLevel::Fatal),
            _ => Err(crate::core::error::LoggerError::InvalidLevel(s.to_string())),
        }
    }
}

/// Process-wide atomic level threshold with per-level fast-path flags.
///
/// `enabled()` is the hot check on every log call: a single relaxed atomic
/// load of a precomputed flag, no lock, no allocation. The flags are
/// refreshed whenever the threshold changes; readers observe the update on
/// their next load (no stronger ordering is required).
pub struct LevelGate {
    threshold: AtomicU8,
    enabled: [AtomicBool; LEVEL_COUNT],
}

impl LevelGate {
    pub fn new(threshold: LogLevel) -> Self {
        let gate = Self {
            threshold: AtomicU8::new(threshold as u8),
            enabled: [
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
            ],
        };
        gate.refresh_flags(threshold);
        gate
    }

    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.enabled[level as usize].load(Ordering::Relaxed)
    }

    pub fn threshold(&self) -> LogLevel {
        LogLevel::from_index(self.threshold.load(Ordering::Relaxed))
    }

    pub fn set(&self, threshold: LogLevel) {
        self.threshold.store(threshold as u8, Ordering::Relaxed);
        self.refresh_flags(threshold);
    }

    /// Parse and apply a textual level. On parse failure the gate falls back
    /// to `Info` and the error is returned so the caller can report it
    /// through whatever diagnostic channel is available.
    pub fn set_from_str(&self, level: &str) -> crate::core::error::Result<LogLevel> {
        match level.parse::<LogLevel>() {
            Ok(parsed) => {
                self.set(parsed);
                Ok(parsed)
            }
            Err(e) => {
                self.set(LogLevel::Info);
                Err(e)
            }
        }
    }

    /// Check whether a textual level would currently pass the gate.
    pub fn check_str(&self, level: &str) -> bool {
        match level.parse::<LogLevel>() {
            Ok(parsed) => self.threshold() <= parsed,
            Err(_) => false,
        }
    }

    fn refresh_flags(&self, threshold: LogLevel) {
        for level in LogLevel::all() {
            self.enabled[level as usize].store(threshold <= level, Ordering::Relaxed);
        }
    }
}
