//! Error types for request translation.
//!
//! # Design
//! Every variant here is a client-input or start-up problem: none of them is
//! caused by the search indexer being unreachable, so none of them should
//! cause the host to drop its upstream connection. Transport failures are
//! reported by the host separately and never pass through `RelayError`.

use thiserror::Error;

/// Errors raised while turning an inbound hook request into an outbound one.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The input line was not a JSON object of the expected shape.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// The request path did not have exactly four segments.
    #[error("invalid path: /{}", .path.join("/"))]
    InvalidPath { path: Vec<String> },

    /// A forwarded header carried a value that is not legal on the wire.
    #[error("invalid value for header {name}")]
    InvalidHeader { name: String },

    /// The `method`/`verb` field named a method the relay does not forward.
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    /// The configured indexer URL cannot have path segments appended.
    #[error("invalid indexer url {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl RelayError {
    /// HTTP status reported back to CouchDB for this error.
    pub fn status(&self) -> u16 {
        match self {
            RelayError::MalformedRequest(_)
            | RelayError::InvalidPath { .. }
            | RelayError::InvalidHeader { .. } => 400,
            RelayError::UnsupportedMethod(_) => 405,
            RelayError::InvalidBaseUrl { .. } => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_path_display_shows_joined_path() {
        let err = RelayError::InvalidPath {
            path: vec!["mydb".to_string(), "_fti".to_string()],
        };
        assert_eq!(err.to_string(), "invalid path: /mydb/_fti");
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn invalid_header_is_a_client_error() {
        let err = RelayError::InvalidHeader {
            name: "Accept".to_string(),
        };
        assert_eq!(err.to_string(), "invalid value for header Accept");
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn unsupported_method_maps_to_405() {
        assert_eq!(RelayError::UnsupportedMethod("PATCH".into()).status(), 405);
    }
}
