//! Error types for the annotation client.
//!
//! Only [`AnnotationError::InvalidArgument`] ever escapes the public CRUD methods of
//! [`AnnotationClient`](crate::AnnotationClient). Every other variant describes an
//! operational failure that the client logs and converts into a degraded result
//! (`false`, an empty [`Graph`](crate::Graph) or the last server response).

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnnotationError>;

/// Errors produced while talking to an annotation server.
#[derive(Debug, Error)]
pub enum AnnotationError {
    /// The caller passed a malformed id, uri, content type or response.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Connection, timeout or other transport-level failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The server answered with a status the operation does not accept.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, lossily decoded
        body: String,
    },

    /// Bearer token acquisition failed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A response body could not be parsed as RDF.
    #[error("RDF parse error: {0}")]
    Parse(String),

    /// Client construction or logging setup failed.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON (de)serialization failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// URL parse failure.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

impl AnnotationError {
    /// Shorthand for building an [`AnnotationError::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        AnnotationError::InvalidArgument(message.into())
    }

    /// True for caller errors that are raised before any I/O.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, AnnotationError::InvalidArgument(_))
    }

    /// The HTTP status carried by a [`AnnotationError::Status`] error.
    pub fn status(&self) -> Option<u16> {
        match self {
            AnnotationError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AnnotationError {
    fn from(err: reqwest::Error) -> Self {
        AnnotationError::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accessor() {
        let err = AnnotationError::Status {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.status(), Some(500));
        assert!(!err.is_invalid_argument());
        assert_eq!(err.to_string(), "unexpected status 500: boom");
    }

    #[test]
    fn test_invalid_argument() {
        let err = AnnotationError::invalid("Invalid ID");
        assert!(err.is_invalid_argument());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_url_conversion() {
        let err: AnnotationError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, AnnotationError::Url(_)));
    }
}
