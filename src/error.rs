//! Error types for wikindex.
//!
//! All fallible library operations return [`Result`]. Construction-phase
//! errors are meant to abort the build; query-phase errors are scoped to a
//! single request by the caller.

use thiserror::Error;

/// The error type for all wikindex operations.
#[derive(Debug, Error)]
pub enum WikindexError {
    /// Underlying I/O failure (segment, shard, secondary index or title file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata or JSON-lines (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document dump could not be parsed.
    #[error("XML error: {0}")]
    Xml(String),

    /// On-disk index data is missing or malformed.
    #[error("Index error: {0}")]
    Index(String),

    /// The caller passed an invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A requested file or record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal invariant failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WikindexError {
    pub fn xml(msg: impl Into<String>) -> Self {
        WikindexError::Xml(msg.into())
    }

    pub fn index(msg: impl Into<String>) -> Self {
        WikindexError::Index(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        WikindexError::InvalidArgument(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        WikindexError::InvalidConfig(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        WikindexError::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        WikindexError::Internal(msg.into())
    }
}

impl From<quick_xml::Error> for WikindexError {
    fn from(err: quick_xml::Error) -> Self {
        WikindexError::Xml(err.to_string())
    }
}

/// Result type alias for wikindex operations.
pub type Result<T> = std::result::Result<T, WikindexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing shard");
        let err: WikindexError = io.into();
        assert!(matches!(err, WikindexError::Io(_)));
        assert!(err.to_string().contains("missing shard"));
    }

    #[test]
    fn test_helper_constructors() {
        assert_eq!(
            WikindexError::invalid_argument("count must be positive").to_string(),
            "Invalid argument: count must be positive"
        );
        assert!(matches!(
            WikindexError::index("bad posting"),
            WikindexError::Index(_)
        ));
    }
}
