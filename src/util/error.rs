//! Error types for the EasyTransfer core.

use thiserror::Error;

/// Main error type for copy/paste geometry operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed face/vertex data during topology construction
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// Attribute sequence length does not match its domain cardinality
    #[error("Attribute '{name}' has {actual} values, expected {expected}")]
    AttributeLengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Invalid magic bytes at start of an interchange document
    #[error("Invalid interchange document: bad magic bytes")]
    InvalidMagic,

    /// Document declares a schema version newer than this reader supports
    #[error("Unsupported interchange schema version: {0}")]
    SchemaVersionUnsupported(u16),

    /// Required fields absent or data model invariants violated in a document
    #[error("Malformed interchange document: {0}")]
    MalformedDocument(String),

    /// Document is truncated
    #[error("Unexpected end of document at offset {0}")]
    UnexpectedEof(u64),

    /// Native object kind with no adapter mapping
    #[error("Unsupported geometry kind: {0}")]
    UnsupportedGeometryKind(String),

    /// Selection contained nothing to transfer
    #[error("Nothing to copy: selection is empty")]
    EmptySelection,

    /// Native object handle not present in the host document
    #[error("Object not found in host document: {0}")]
    ObjectNotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Create an invalid topology error.
    pub fn topology(msg: impl Into<String>) -> Self {
        Self::InvalidTopology(msg.into())
    }

    /// Create a malformed document error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedDocument(msg.into())
    }

    /// Create an unsupported geometry kind error.
    pub fn unsupported(kind: impl Into<String>) -> Self {
        Self::UnsupportedGeometryKind(kind.into())
    }
}

/// Result type alias for EasyTransfer operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::InvalidMagic;
        assert!(e.to_string().contains("magic"));

        let e = Error::AttributeLengthMismatch {
            name: "position".to_string(),
            expected: 4,
            actual: 3,
        };
        assert!(e.to_string().contains("position"));
        assert!(e.to_string().contains("4"));
        assert!(e.to_string().contains("3"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
