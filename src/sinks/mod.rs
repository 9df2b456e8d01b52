//! Byte sinks behind the router
//!
//! A sink owns one output destination. Routes serialize access to their sink
//! with a mutex, so sinks themselves are single-threaded and only need to be
//! `Send`.

mod console;
mod rotating_file;

pub use console::ConsoleSink;
pub use rotating_file::{RotatingFileSink, RotationPolicy};

use crate::core::error::Result;

/// Destination contract: ordered writes, explicit flush, exactly-once close.
pub trait Sink: Send {
    fn write(&mut self, bytes: &[u8]) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    /// Release the destination; further writes are errors.
    fn close(&mut self) -> Result<()>;
}

/// Mirrors every write to the console before the file sink, so both see the
/// exact same encoded bytes.
pub struct TeeSink {
    console: Option<ConsoleSink>,
    file: RotatingFileSink,
}

impl TeeSink {
    pub fn new(file: RotatingFileSink, mirror_console: bool) -> Self {
        Self {
            console: mirror_console.then(ConsoleSink::new),
            file,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }
}

impl Sink for TeeSink {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if let Some(console) = &mut self.console {
            // console trouble never blocks the file write
            let _ = console.write(bytes);
        }
        self.file.write(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(console) = &mut self.console {
            let _ = console.flush();
        }
        self.file.flush()
    }

    fn close(&mut self) -> Result<()> {
        if let Some(console) = &mut self.console {
            let _ = console.flush();
        }
        self.file.close()
    }
}
