//! # Error Types
//!
//! Custom error types for Roam Logger using `thiserror`.

use thiserror::Error;

/// Main error type for Roam Logger
#[derive(Debug, Error)]
pub enum LoggerError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// GPS serial port errors
    #[error("Serial port error: {0}")]
    Serial(String),

    /// Detection event source transport errors
    #[error("Event source error: {0}")]
    EventSource(String),

    /// A detection event that could not be decoded
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// Failure to open, write or close one of the CSV logfiles
    #[error("Logfile error on {path}: {source}")]
    Logfile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl LoggerError {
    pub(crate) fn logfile(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Logfile {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for failures of an input transport (GPS port, event source)
    pub fn is_transport(&self) -> bool {
        matches!(self, LoggerError::Serial(_) | LoggerError::EventSource(_))
    }
}

/// Result type alias for Roam Logger
pub type Result<T> = std::result::Result<T, LoggerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_logfile_error_message_names_path() {
        let err = LoggerError::logfile(
            "roam-ble-940323-123519.csv",
            io::Error::new(io::ErrorKind::NotFound, "no such device"),
        );
        let msg = err.to_string();
        assert!(msg.contains("roam-ble-940323-123519.csv"));
        assert!(msg.contains("no such device"));
    }

    #[test]
    fn test_transport_classification() {
        assert!(LoggerError::Serial("gone".into()).is_transport());
        assert!(LoggerError::EventSource("eof".into()).is_transport());
        assert!(!LoggerError::MalformedEvent("line 3".into()).is_transport());
    }

    #[test]
    fn test_io_error_converts() {
        let err: LoggerError = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, LoggerError::Io(_)));
    }
}
