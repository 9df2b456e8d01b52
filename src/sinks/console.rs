//! Stdout sink

use std::io::Write;

use super::Sink;
use crate::core::error::Result;

/// Writes records to stdout. Locking happens per write so interleaved lines
/// from multiple routes stay whole.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl Sink for ConsoleSink {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        std::io::stdout().flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.flush()
    }
}
