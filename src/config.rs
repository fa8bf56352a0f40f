//! API configuration
//!
//! This module holds the tunables and endpoint templates for the REST
//! authority, plus the credential provider the transport reads the bearer
//! token from.

use std::sync::{Arc, PoisonError, RwLock};

/// Transport and retry tunables
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL prefix for all endpoints (e.g., "http://localhost:9000/api")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Maximum retry attempts for idempotent requests
    pub max_retries: u32,
    /// Base delay between retry attempts in milliseconds
    pub retry_base_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000/api".to_string(),
            request_timeout_ms: 30_000,
            max_retries: 3,
            retry_base_delay_ms: 1000,
        }
    }
}

/// Endpoint path templates
pub mod endpoints {
    /// List or create conversations
    pub const CONVERSATIONS: &str = "/conversations";
    /// List disputes (optionally filtered) or create one
    pub const DISPUTES: &str = "/disputes";

    /// Fetch a single conversation
    pub fn conversation(id: &str) -> String {
        format!("/conversations/{}", id)
    }

    /// Mark a conversation as read
    pub fn conversation_read(id: &str) -> String {
        format!("/conversations/{}/read", id)
    }

    /// List or send messages within a conversation
    pub fn messages(conversation_id: &str) -> String {
        format!("/conversations/{}/messages", conversation_id)
    }

    /// Fetch or update a single dispute
    pub fn dispute(id: &str) -> String {
        format!("/disputes/{}", id)
    }

    /// Attach evidence files to a dispute
    pub fn dispute_evidence(id: &str) -> String {
        format!("/disputes/{}/evidence", id)
    }

    /// Add a comment to a dispute
    pub fn dispute_comments(id: &str) -> String {
        format!("/disputes/{}/comments", id)
    }
}

/// Source of the bearer credential attached to outgoing requests.
///
/// The transport reads the token once per request, so a token rotated
/// elsewhere in the process takes effect on the next call. Implementations
/// must never block.
pub trait CredentialProvider: Send + Sync {
    /// Current bearer token, or `None` when the caller is unauthenticated
    fn bearer_token(&self) -> Option<String>;
}

/// Fixed credential, handy for tests and one-shot tools
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    /// Create a provider that always returns the given token
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    /// Create a provider with no credential
    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

impl CredentialProvider for StaticCredentials {
    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Process-wide credential slot.
///
/// The token is written by the authentication layer (outside this crate) and
/// read here per request. Cloning shares the same underlying slot.
#[derive(Debug, Clone, Default)]
pub struct SharedCredentials {
    token: Arc<RwLock<Option<String>>>,
}

impl SharedCredentials {
    /// Create an empty credential slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored token
    pub fn set_token(&self, token: impl Into<String>) {
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(token.into());
    }

    /// Clear the stored token
    pub fn clear(&self) {
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}

impl CredentialProvider for SharedCredentials {
    fn bearer_token(&self) -> Option<String> {
        let guard = self.token.read().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }
}
