//! Dispute store
//!
//! Holds the dispute collection for an optional server-side status filter.
//! Creation is validated locally and prepends the new record; evidence,
//! comments and partial updates always replace the whole record with the
//! server's representation, because the server appends timeline events the
//! client cannot synthesize.

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error};

use crate::client::DisputeClient;
use crate::transport::{Api, FilePart};
use crate::types::{CreateDisputePayload, Dispute, DisputePatch, DisputeStatus};
use crate::Result;

/// Read-only view of the dispute store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputesSnapshot {
    /// Disputes, most recently created first
    pub disputes: Vec<Dispute>,
    /// Server-side status filter the collection was loaded with
    pub filter: Option<DisputeStatus>,
    /// Whether a fetch is in flight
    pub loading: bool,
    /// Message of the most recent failure, cleared on the next operation
    pub error: Option<String>,
}

#[derive(Default)]
struct State {
    disputes: Vec<Dispute>,
    filter: Option<DisputeStatus>,
    loading: bool,
    error: Option<String>,
    epoch: u64,
}

/// Owning in-memory cache of the dispute collection
pub struct DisputeStore<A: Api> {
    client: DisputeClient<A>,
    state: Mutex<State>,
    tx: watch::Sender<DisputesSnapshot>,
}

impl<A: Api> DisputeStore<A> {
    /// Create an empty store backed by the given client
    pub fn new(client: DisputeClient<A>) -> Self {
        let (tx, _) = watch::channel(DisputesSnapshot::default());
        Self {
            client,
            state: Mutex::new(State::default()),
            tx,
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> DisputesSnapshot {
        self.tx.borrow().clone()
    }

    /// Subscribe to snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<DisputesSnapshot> {
        self.tx.subscribe()
    }

    /// Fetch disputes for the given server-side filter.
    ///
    /// Changing the filter starts a fresh fetch and supersedes any fetch in
    /// flight for the previous filter; its response is discarded on arrival.
    /// Calling with the current filter while loading is a no-op.
    pub async fn load(&self, filter: Option<DisputeStatus>) {
        let epoch = {
            let mut state = self.state.lock().await;
            if state.loading && state.filter == filter {
                debug!("dispute load already in flight, ignoring");
                return;
            }
            if state.filter != filter {
                state.epoch += 1;
                state.filter = filter;
            }
            state.loading = true;
            state.error = None;
            self.publish(&state);
            state.epoch
        };

        let result = self.client.list(filter).await;

        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            debug!("discarding dispute fetch for a superseded filter");
            return;
        }
        state.loading = false;
        match result {
            Ok(disputes) => {
                state.disputes = disputes;
            }
            Err(e) => {
                error!("failed to load disputes: {}", e);
                state.error = Some(e.to_string());
            }
        }
        self.publish(&state);
    }

    /// Create a dispute.
    ///
    /// Validation runs locally first and fails without a network call. On
    /// success the new dispute is prepended, most recent first.
    pub async fn create(&self, payload: &CreateDisputePayload) -> Result<Dispute> {
        payload.validate()?;

        let epoch = self.begin().await;
        let result = self.client.create(payload).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(dispute) => {
                if state.epoch == epoch {
                    state.disputes.insert(0, dispute.clone());
                    self.publish(&state);
                }
                Ok(dispute)
            }
            Err(e) => {
                error!("failed to create dispute: {}", e);
                if state.epoch == epoch {
                    state.error = Some(e.to_string());
                    self.publish(&state);
                }
                Err(e)
            }
        }
    }

    /// Attach evidence files to a dispute.
    ///
    /// The record is replaced wholesale with the server's representation;
    /// the server also appends the matching timeline event.
    pub async fn add_evidence(&self, id: &str, files: Vec<FilePart>) -> Result<Dispute> {
        let epoch = self.begin().await;
        let result = self.client.add_evidence(id, files).await;
        self.commit_replace(epoch, result, "add evidence to").await
    }

    /// Add a comment to a dispute; the record is replaced wholesale
    pub async fn add_comment(&self, id: &str, comment: &str) -> Result<Dispute> {
        let epoch = self.begin().await;
        let result = self.client.add_comment(id, comment).await;
        self.commit_replace(epoch, result, "comment on").await
    }

    /// Request a partial update; the record is replaced wholesale.
    ///
    /// Status legality is enforced by the server; the store never advances
    /// a status locally.
    pub async fn update(&self, id: &str, patch: &DisputePatch) -> Result<Dispute> {
        let epoch = self.begin().await;
        let result = self.client.update(id, patch).await;
        self.commit_replace(epoch, result, "update").await
    }

    /// Reset the store; any in-flight operation is discarded on arrival
    pub async fn dispose(&self) {
        let mut state = self.state.lock().await;
        state.epoch += 1;
        state.disputes.clear();
        state.filter = None;
        state.loading = false;
        state.error = None;
        self.publish(&state);
    }

    async fn begin(&self) -> u64 {
        let mut state = self.state.lock().await;
        state.error = None;
        self.publish(&state);
        state.epoch
    }

    async fn commit_replace(
        &self,
        epoch: u64,
        result: Result<Dispute>,
        op: &str,
    ) -> Result<Dispute> {
        let mut state = self.state.lock().await;
        match result {
            Ok(dispute) => {
                if state.epoch == epoch {
                    match state.disputes.iter_mut().find(|d| d.id == dispute.id) {
                        Some(slot) => *slot = dispute.clone(),
                        None => debug!("response for dispute {} not in collection", dispute.id),
                    }
                    self.publish(&state);
                }
                Ok(dispute)
            }
            Err(e) => {
                error!("failed to {} dispute: {}", op, e);
                if state.epoch == epoch {
                    state.error = Some(e.to_string());
                    self.publish(&state);
                }
                Err(e)
            }
        }
    }

    fn publish(&self, state: &State) {
        self.tx.send_replace(DisputesSnapshot {
            disputes: state.disputes.clone(),
            filter: state.filter,
            loading: state.loading,
            error: state.error.clone(),
        });
    }
}
