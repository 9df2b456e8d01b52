//! Record encoders
//!
//! An encoder turns a [`LogEvent`] into the bytes written to a sink. Each
//! event is encoded exactly once per dispatch; the same bytes go to the file
//! and, when mirroring is on, to the console.

use colored::Colorize;
use serde_json::json;

use super::config::{LogConfig, LogFormat};
use super::event::LogEvent;
use super::field::format_attrs;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub trait Encoder: Send + Sync {
    fn encode(&self, event: &LogEvent) -> Vec<u8>;
}

/// Build the encoder selected by the configuration.
pub fn from_config(config: &LogConfig) -> Box<dyn Encoder> {
    match config.format {
        LogFormat::Text => Box::new(TextEncoder {
            prefix: config.prefix.clone(),
            color: config.console,
            relative_paths: config.relative_paths,
        }),
        LogFormat::Json => Box::new(JsonEncoder {
            prefix: config.prefix.clone(),
            relative_paths: config.relative_paths,
        }),
    }
}

/// Trim a caller path to its last two components for display.
fn relative_caller(file: &str) -> String {
    let mut parts: Vec<&str> = file.rsplit(['/', '\\']).take(2).collect();
    parts.reverse();
    parts.join("/")
}

fn caller_display(event: &LogEvent, relative: bool) -> Option<String> {
    event.caller.as_ref().map(|caller| {
        let file = if relative {
            relative_caller(&caller.file)
        } else {
            caller.file.clone()
        };
        format!("{}:{}", file, caller.line)
    })
}

/// Human-readable line encoder:
/// `[prefix ]timestamp LEVEL [caller ]message[ | k=v ...]\n`
pub struct TextEncoder {
    prefix: String,
    color: bool,
    relative_paths: bool,
}

impl Encoder for TextEncoder {
    fn encode(&self, event: &LogEvent) -> Vec<u8> {
        let mut line = String::with_capacity(96 + event.message.len());

        if !self.prefix.is_empty() {
            line.push_str(&self.prefix);
            line.push(' ');
        }
        line.push_str(&event.timestamp.format(TIMESTAMP_FORMAT).to_string());
        line.push(' ');

        if self.color {
            line.push_str(&event.level.to_str().color(event.level.color_code()).to_string());
        } else {
            line.push_str(event.level.to_str());
        }
        line.push(' ');

        if let Some(caller) = caller_display(event, self.relative_paths) {
            line.push_str(&caller);
            line.push(' ');
        }
        line.push_str(&event.message);

        if !event.attrs.is_empty() {
            line.push_str(" | ");
            line.push_str(&format_attrs(&event.attrs));
        }
        line.push('\n');
        line.into_bytes()
    }
}

/// One JSON object per line with `time`, `level`, `caller`, `message` and
/// the attributes flattened in at top level.
pub struct JsonEncoder {
    prefix: String,
    relative_paths: bool,
}

impl Encoder for JsonEncoder {
    fn encode(&self, event: &LogEvent) -> Vec<u8> {
        let mut record = serde_json::Map::new();
        record.insert(
            "time".to_string(),
            json!(event.timestamp.format(TIMESTAMP_FORMAT).to_string()),
        );
        record.insert("level".to_string(), json!(event.level.file_stem()));
        if !self.prefix.is_empty() {
            record.insert("prefix".to_string(), json!(self.prefix));
        }
        if let Some(caller) = caller_display(event, self.relative_paths) {
            record.insert("caller".to_string(), json!(caller));
        }
        record.insert("message".to_string(), json!(event.message));
        for (key, value) in &event.attrs {
            record.insert(key.clone(), value.to_json_value());
        }

        let mut bytes = serde_json::Value::Object(record).to_string().into_bytes();
        bytes.push(b'\n');
        bytes
    }
}
