//! Error types for the log follower.

use thiserror::Error;

/// The main error type for log follower operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors when opening, reading or probing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The consumer was built from an incomplete or invalid configuration.
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// A file name does not match the configured date-time pattern.
    #[error("Cannot parse '{name}' with pattern '{pattern}'")]
    Parse { name: String, pattern: String },

    /// The active file disappeared and no successor is visible yet.
    #[error("File no longer exists: {path}")]
    FileNotFound { path: String },

    /// A resume offset points past the end of its file.
    #[error("Offset {offset} is beyond the end of {path} ({size} bytes)")]
    SeekOutOfRange { path: String, offset: u64, size: u64 },

    /// A checkpoint file could not be encoded or decoded.
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] serde_json::Error),
}

/// A convenient Result type for log follower operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_io_error_conversion() {
        let io_error = IoError::new(ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();

        match error {
            Error::Io(_) => {}
            _ => panic!("Expected Error::Io variant"),
        }

        assert!(error.to_string().contains("I/O error"));
        assert!(error.to_string().contains("File not found"));
    }

    #[test]
    fn test_checkpoint_error_conversion() {
        let json_error = serde_json::from_str::<u64>("not json").unwrap_err();
        let error: Error = json_error.into();

        assert!(matches!(error, Error::Checkpoint(_)));
        assert!(error.to_string().starts_with("Checkpoint error"));
    }

    #[test]
    fn test_config_error() {
        let error = Error::Config {
            message: "missing date-time layout".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Invalid configuration: missing date-time layout"
        );
    }

    #[test]
    fn test_parse_error() {
        let error = Error::Parse {
            name: "app.log".to_string(),
            pattern: "%Y%m%d%H.log".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Cannot parse 'app.log' with pattern '%Y%m%d%H.log'"
        );
    }

    #[test]
    fn test_file_not_found_error() {
        let error = Error::FileNotFound {
            path: "/path/to/missing/file.log".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "File no longer exists: /path/to/missing/file.log"
        );
    }

    #[test]
    fn test_seek_out_of_range_error() {
        let error = Error::SeekOutOfRange {
            path: "2024010110.log".to_string(),
            offset: 500,
            size: 42,
        };

        assert_eq!(
            error.to_string(),
            "Offset 500 is beyond the end of 2024010110.log (42 bytes)"
        );
    }

    #[test]
    fn test_error_chain_with_io_error() {
        let io_error = IoError::new(ErrorKind::PermissionDenied, "Access denied");
        let error: Error = io_error.into();

        match &error {
            Error::Io(inner) => {
                assert_eq!(inner.kind(), ErrorKind::PermissionDenied);
                assert_eq!(inner.to_string(), "Access denied");
            }
            _ => panic!("Expected Error::Io variant"),
        }
    }

    #[test]
    fn test_error_send_sync_traits() {
        // Errors travel inside LogLine across the worker boundary
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
