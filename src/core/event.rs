//! Log event structure

use super::field::{is_reserved_key, Attrs};
use super::level::LogLevel;
use chrono::{DateTime, Utc};

/// Resolved caller location. Absence of a `CallerInfo` on an event means the
/// location could not be determined (capture disabled or symbols missing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerInfo {
    pub file: String,
    pub line: u32,
}

/// A fully materialized log record, immutable once constructed.
///
/// The message and attributes are rendered on the producer thread before the
/// event leaves it, so an event can be read arbitrarily later by the pipeline
/// worker without synchronizing with the caller. The timestamp is captured at
/// construction, not at write time, so queue delay never skews reported time.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: String,
    pub attrs: Attrs,
    pub caller: Option<CallerInfo>,
    pub timestamp: DateTime<Utc>,
    /// Sub-path redirection derived from a reserved attribute key.
    pub route_tag: Option<String>,
}

impl LogEvent {
    /// Sanitize the message to prevent log injection: newlines, carriage
    /// returns, and tabs become escape sequences.
    fn sanitize_message(message: &str) -> String {
        if !message.contains(['\n', '\r', '\t']) {
            return message.to_string();
        }
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: LogLevel, message: impl AsRef<str>) -> Self {
        Self {
            level,
            message: Self::sanitize_message(message.as_ref()),
            attrs: Vec::new(),
            caller: None,
            timestamp: Utc::now(),
            route_tag: None,
        }
    }

    /// Attach attributes, extracting reserved routing keys.
    ///
    /// Reserved keys ("business", "folder", "directory") are stripped from
    /// the visible attributes and the last one's value becomes the routing
    /// tag. Empty tag values are ignored.
    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        let mut visible = Vec::with_capacity(attrs.len());
        for (key, value) in attrs {
            if is_reserved_key(&key) {
                let tag = value.to_string();
                if !tag.is_empty() && tag != "null" {
                    self.route_tag = Some(tag);
                }
            } else {
                visible.push((key, value));
            }
        }
        self.attrs = visible;
        self
    }

    pub fn with_caller(mut self, caller: Option<CallerInfo>) -> Self {
        self.caller = caller;
        self
    }

    /// Force a routing tag, bypassing attribute extraction.
    pub fn with_route_tag(mut self, tag: impl Into<String>) -> Self {
        self.route_tag = Some(tag.into());
        self
    }
}
