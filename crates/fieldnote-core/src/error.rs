//! Error types for fieldnote.

use thiserror::Error;

/// Result type alias using fieldnote's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for fieldnote operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(uuid::Uuid),

    /// A required permission is missing (location, microphone, notifications)
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Media upload failed, underlying cause preserved
    #[error("Upload error: {0}")]
    Upload(String),

    /// Audio device acquisition or stream failure
    #[error("Audio error: {0}")]
    Audio(String),

    /// Reverse geocoding failed
    #[error("Geocode error: {0}")]
    Geocode(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_note_not_found() {
        let id = Uuid::nil();
        let err = Error::NoteNotFound(id);
        assert_eq!(err.to_string(), format!("Note not found: {}", id));
    }

    #[test]
    fn test_error_display_permission_denied() {
        let err = Error::PermissionDenied("microphone".to_string());
        assert_eq!(err.to_string(), "Permission denied: microphone");
    }

    #[test]
    fn test_error_display_upload() {
        let err = Error::Upload("connection reset".to_string());
        assert_eq!(err.to_string(), "Upload error: connection reset");
    }

    #[test]
    fn test_error_display_audio() {
        let err = Error::Audio("no input device".to_string());
        assert_eq!(err.to_string(), "Audio error: no input device");
    }

    #[test]
    fn test_from_serde_json_error_preserves_message() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
