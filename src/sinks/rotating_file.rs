//! Size-rotating file sink with numbered backups
//!
//! The active file rotates once it would exceed the size limit: backups shift
//! up (`app.log.1` -> `app.log.2`, ...), the active file becomes `.1`
//! (gzipped when compression is on), and backups past the count or age limit
//! are pruned. A failed rotation degrades to continuing on the current file.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::Sink;
use crate::core::error::{LoggerError, Result};

/// Rotation policy, derived from the logger configuration
#[derive(Debug, Clone)]
pub struct RotationPolicy {
    pub max_size_bytes: u64,
    pub max_backups: usize,
    pub retention_days: u64,
    pub compress: bool,
}

impl RotationPolicy {
    pub fn from_config(config: &crate::core::config::LogConfig) -> Self {
        Self {
            max_size_bytes: config.max_size_mb * 1024 * 1024,
            max_backups: config.max_backups,
            retention_days: config.retention_days,
            compress: config.compress,
        }
    }
}

pub struct RotatingFileSink {
    path: PathBuf,
    policy: RotationPolicy,
    writer: Option<BufWriter<File>>,
    current_size: u64,
}

impl RotatingFileSink {
    /// Open (or create) the file at `path`, appending to existing content.
    pub fn open(path: impl Into<PathBuf>, policy: RotationPolicy) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    LoggerError::io_operation(
                        "creating log directory",
                        parent.display().to_string(),
                        e,
                    )
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LoggerError::io_operation("opening log file", path.display().to_string(), e)
            })?;
        let current_size = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            path,
            policy,
            writer: Some(BufWriter::new(file)),
            current_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn backup_exists(&self, index: usize) -> Option<PathBuf> {
        let plain = self.backup_path(index);
        if plain.exists() {
            return Some(plain);
        }
        let gz = PathBuf::from(format!("{}.gz", plain.display()));
        gz.exists().then_some(gz)
    }

    /// Shift backups up one slot, move the active file into slot 1, and
    /// reopen a fresh active file.
    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::io_operation("flushing before rotation", self.path.display().to_string(), e)
            })?;
        }

        // oldest first so each rename target is free
        if let Some(oldest) = self.backup_exists(self.policy.max_backups) {
            let _ = fs::remove_file(oldest);
        }
        for index in (1..self.policy.max_backups).rev() {
            if let Some(from) = self.backup_exists(index) {
                let suffix = from.extension().and_then(|e| e.to_str()) == Some("gz");
                let mut to = self.backup_path(index + 1);
                if suffix {
                    to = PathBuf::from(format!("{}.gz", to.display()));
                }
                let _ = fs::rename(&from, &to);
            }
        }

        let backup = self.backup_path(1);
        fs::rename(&self.path, &backup).map_err(|e| {
            LoggerError::io_operation("rotating log file", self.path.display().to_string(), e)
        })?;

        if self.policy.compress {
            if let Err(e) = compress_file(&backup) {
                eprintln!(
                    "[logroute] failed to compress backup {}: {}",
                    backup.display(),
                    e
                );
            }
        }
        self.prune_by_age();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                LoggerError::io_operation(
                    "reopening after rotation",
                    self.path.display().to_string(),
                    e,
                )
            })?;
        self.writer = Some(BufWriter::new(file));
        self.current_size = 0;
        Ok(())
    }

    /// Remove backups older than the retention window.
    fn prune_by_age(&self) {
        if self.policy.retention_days == 0 {
            return;
        }
        let cutoff = SystemTime::now() - Duration::from_secs(self.policy.retention_days * 86_400);
        for index in 1..=self.policy.max_backups {
            if let Some(backup) = self.backup_exists(index) {
                let expired = fs::metadata(&backup)
                    .and_then(|m| m.modified())
                    .map(|modified| modified < cutoff)
                    .unwrap_or(false);
                if expired {
                    let _ = fs::remove_file(backup);
                }
            }
        }
    }
}

impl Sink for RotatingFileSink {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if self.writer.is_none() {
            return Err(LoggerError::sink(
                self.path.display().to_string(),
                "sink is closed",
            ));
        }

        if self.current_size + bytes.len() as u64 > self.policy.max_size_bytes
            && self.current_size > 0
        {
            if let Err(e) = self.rotate() {
                // keep logging on the oversized file rather than lose records
                eprintln!("[logroute] rotation failed, continuing on current file: {}", e);
                if self.writer.is_none() {
                    let file = OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(&self.path)
                        .map_err(|e| {
                            LoggerError::io_operation(
                                "reopening log file",
                                self.path.display().to_string(),
                                e,
                            )
                        })?;
                    self.writer = Some(BufWriter::new(file));
                }
            }
        }

        match self.writer.as_mut() {
            Some(writer) => {
                writer.write_all(bytes).map_err(|e| {
                    LoggerError::io_operation("writing record", self.path.display().to_string(), e)
                })?;
                self.current_size += bytes.len() as u64;
                Ok(())
            }
            None => Err(LoggerError::sink(
                self.path.display().to_string(),
                "sink is closed",
            )),
        }
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush().map_err(|e| {
                LoggerError::io_operation("flushing sink", self.path.display().to_string(), e)
            })?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::io_operation("closing sink", self.path.display().to_string(), e)
            })?;
        }
        Ok(())
    }
}

/// Gzip `path` in place, replacing it with `path.gz`.
fn compress_file(path: &Path) -> Result<()> {
    let mut input = File::open(path)?;
    let gz_path = PathBuf::from(format!("{}.gz", path.display()));
    let output = File::create(&gz_path)?;
    let mut encoder = GzEncoder::new(output, Compression::default());

    let mut buffer = [0u8; 8192];
    loop {
        let read = input.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        encoder.write_all(&buffer[..read])?;
    }
    encoder.finish()?;
    fs::remove_file(path)?;
    Ok(())
}
