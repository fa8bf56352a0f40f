//! Dispute operations against the REST authority

use serde_json::json;

use super::wire;
use crate::config::endpoints;
use crate::retry::{with_retry, RetryPolicy};
use crate::transport::{Api, FilePart, MultipartForm};
use crate::types::{CreateDisputePayload, Dispute, DisputePatch, DisputeStatus};
use crate::{Error, Result};

/// Stateless client for dispute endpoints.
///
/// Listing, fetching and partial updates are idempotent and run under the
/// retry policy. Creation, evidence upload and comments run exactly once.
#[derive(Clone)]
pub struct DisputeClient<A: Api> {
    api: A,
    retry: RetryPolicy,
}

impl<A: Api> DisputeClient<A> {
    /// Create a client for the given transport
    pub fn new(api: A) -> Self {
        Self {
            api,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the retry policy for idempotent operations
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// List disputes, optionally filtered by status on the server side
    pub async fn list(&self, status: Option<DisputeStatus>) -> Result<Vec<Dispute>> {
        let path = match status {
            Some(status) => format!("{}?status={}", endpoints::DISPUTES, status.as_str()),
            None => endpoints::DISPUTES.to_string(),
        };
        let data = with_retry(&self.retry, || self.api.get(&path)).await?;
        wire::disputes_from_value(data)
    }

    /// Fetch a single dispute
    pub async fn get(&self, id: &str) -> Result<Dispute> {
        let path = endpoints::dispute(id);
        let data = with_retry(&self.retry, || self.api.get(&path)).await?;
        wire::dispute_from_value(data)
    }

    /// Create a dispute.
    ///
    /// The multipart form carries the business fields first (orderId,
    /// reason, description), then one entry per evidence file. Runs exactly
    /// once; a retry could file the dispute twice.
    pub async fn create(&self, payload: &CreateDisputePayload) -> Result<Dispute> {
        let mut form = MultipartForm::new()
            .text("orderId", payload.order_id.clone())
            .text("reason", payload.reason.as_str())
            .text("description", payload.description.clone());
        for part in &payload.evidence {
            form = form.file("evidence", part.clone());
        }

        let data = self.api.upload(endpoints::DISPUTES, form).await?;
        wire::dispute_from_value(data)
    }

    /// Partially update a dispute; returns the full updated record
    pub async fn update(&self, id: &str, patch: &DisputePatch) -> Result<Dispute> {
        let path = endpoints::dispute(id);
        let body = serde_json::to_value(patch)
            .map_err(|e| Error::Validation(format!("invalid dispute patch: {}", e)))?;
        let data = with_retry(&self.retry, || self.api.patch_json(&path, body.clone())).await?;
        wire::dispute_from_value(data)
    }

    /// Attach evidence files; returns the full updated record.
    ///
    /// The server appends a timeline event alongside the evidence, so the
    /// returned record is the only correct view. Runs exactly once.
    pub async fn add_evidence(&self, id: &str, files: Vec<FilePart>) -> Result<Dispute> {
        let mut form = MultipartForm::new();
        for part in files {
            form = form.file("evidence", part);
        }

        let data = self.api.upload(&endpoints::dispute_evidence(id), form).await?;
        wire::dispute_from_value(data)
    }

    /// Add a comment; returns the full updated record. Runs exactly once.
    pub async fn add_comment(&self, id: &str, comment: &str) -> Result<Dispute> {
        let data = self
            .api
            .post_json(
                &endpoints::dispute_comments(id),
                Some(json!({ "comment": comment })),
            )
            .await?;
        wire::dispute_from_value(data)
    }
}
