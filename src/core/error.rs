//! Error types for the logging core

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Event queue full
    #[error("Log queue full: {capacity} events buffered")]
    QueueFull { capacity: usize },

    /// Pipeline no longer accepting submissions
    #[error("Pipeline already stopped")]
    PipelineStopped,

    /// Invalid log level string
    #[error("Invalid log level: '{0}'")]
    InvalidLevel(String),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Sink error with path
    #[error("Sink error for '{path}': {message}")]
    SinkError { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    RotationError { path: String, message: String },

    /// Logger used before initialization
    #[error("Logger not initialized: call logroute::init() first")]
    NotInitialized,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a queue full error
    pub fn queue_full(capacity: usize) -> Self {
        LoggerError::QueueFull { capacity }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a sink error
    pub fn sink(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::SinkError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::RotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::queue_full(1000);
        assert!(matches!(err, LoggerError::QueueFull { .. }));

        let err = LoggerError::config("Router", "empty directory");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::sink("/var/log/app/info.log", "permission denied");
        assert!(matches!(err, LoggerError::SinkError { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::queue_full(100);
        assert_eq!(err.to_string(), "Log queue full: 100 events buffered");

        let err = LoggerError::rotation("/var/log/app.log", "disk full");
        assert_eq!(
            err.to_string(),
            "File rotation failed for '/var/log/app.log': disk full"
        );

        let err = LoggerError::InvalidLevel("verbose".to_string());
        assert_eq!(err.to_string(), "Invalid log level: 'verbose'");
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("opening sink", "cannot open log file", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("opening sink"));
        assert!(err.to_string().contains("cannot open log file"));
    }
}
