//! Mercado Sync - client-side synchronization core for marketplace
//! messaging and disputes
//!
//! This library keeps two domain aggregates (conversations/messages and
//! disputes) consistent between a remote REST authority and an in-memory
//! local cache under unreliable network conditions. A UI layer drives the
//! stores through a small set of operations and observes the results
//! through read-only snapshots.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod retry;
pub mod store;
pub mod timefmt;
pub mod transport;
pub mod types;
pub mod typing;

#[cfg(test)]
pub(crate) mod testkit;

/// Result type alias for Mercado Sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP status codes the retry policy is allowed to reattempt
pub const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Error types for Mercado Sync operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Local validation failure, raised before any network call is made
    #[error("validation failed: {0}")]
    Validation(String),

    /// The request exceeded the transport timeout and was aborted
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Http {
        /// Numeric HTTP status code
        status: u16,
        /// Server-provided error message, or a synthesized `HTTP <status>: <reason>` text
        message: String,
        /// Optional machine-readable error code from the server
        code: Option<String>,
    },

    /// A response could not be decoded into the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Connection-level transport failure (DNS, refused connection, closed socket)
    #[error("transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Whether the retry policy may reattempt the failed request.
    ///
    /// Only timeouts and the fixed set of transient HTTP statuses qualify.
    /// Decode failures never qualify: retrying will not fix malformed data.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout => true,
            Error::Http { status, .. } => RETRYABLE_STATUSES.contains(status),
            _ => false,
        }
    }

    /// The HTTP status code carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Initialize the library with logging
pub fn init() {
    tracing_subscriber::fmt::init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_retryable() {
        assert!(Error::Timeout.is_retryable());
    }

    #[test]
    fn test_retryable_statuses() {
        for status in RETRYABLE_STATUSES {
            let err = Error::Http {
                status,
                message: "transient".to_string(),
                code: None,
            };
            assert!(err.is_retryable(), "status {} should be retryable", status);
        }
    }

    #[test]
    fn test_client_errors_not_retryable() {
        let not_found = Error::Http {
            status: 404,
            message: "not found".to_string(),
            code: None,
        };
        assert!(!not_found.is_retryable());

        let unauthorized = Error::Http {
            status: 401,
            message: "unauthorized".to_string(),
            code: Some("auth_required".to_string()),
        };
        assert!(!unauthorized.is_retryable());
    }

    #[test]
    fn test_decode_and_validation_not_retryable() {
        assert!(!Error::Decode("bad timestamp".to_string()).is_retryable());
        assert!(!Error::Validation("too short".to_string()).is_retryable());
        assert!(!Error::Transport("connection refused".to_string()).is_retryable());
    }

    #[test]
    fn test_status_accessor() {
        let err = Error::Http {
            status: 503,
            message: "unavailable".to_string(),
            code: None,
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(Error::Timeout.status(), None);
    }
}
