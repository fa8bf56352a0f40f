//! Conversation list store

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, warn};

use crate::client::ConversationClient;
use crate::transport::Api;
use crate::types::{Conversation, ConversationPatch};

/// Read-only view of the conversation store.
///
/// Conversations are sorted by last activity, most recent first. Sorting
/// happens when the snapshot is built, not in the stored collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationsSnapshot {
    /// Conversations, most recently active first
    pub conversations: Vec<Conversation>,
    /// Whether a fetch is in flight
    pub loading: bool,
    /// Message of the most recent failure, cleared on the next operation
    pub error: Option<String>,
}

#[derive(Default)]
struct State {
    conversations: Vec<Conversation>,
    loading: bool,
    error: Option<String>,
    epoch: u64,
}

/// Owning in-memory cache of the conversation list.
///
/// The store is the exclusive owner of the collection; consumers receive
/// clones through [`snapshot`](Self::snapshot) and
/// [`subscribe`](Self::subscribe) and mutate only through the operations
/// below.
pub struct ConversationStore<A: Api> {
    client: ConversationClient<A>,
    state: Mutex<State>,
    tx: watch::Sender<ConversationsSnapshot>,
}

impl<A: Api> ConversationStore<A> {
    /// Create an empty store backed by the given client
    pub fn new(client: ConversationClient<A>) -> Self {
        let (tx, _) = watch::channel(ConversationsSnapshot::default());
        Self {
            client,
            state: Mutex::new(State::default()),
            tx,
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> ConversationsSnapshot {
        self.tx.borrow().clone()
    }

    /// Subscribe to snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<ConversationsSnapshot> {
        self.tx.subscribe()
    }

    /// Fetch the conversation list from the authority.
    ///
    /// A call while a fetch is already in flight is a no-op, so concurrent
    /// callers collapse into one request. On success the whole collection is
    /// replaced; on failure the previous collection is preserved and the
    /// error is recorded in the snapshot.
    pub async fn load(&self) {
        let epoch = {
            let mut state = self.state.lock().await;
            if state.loading {
                debug!("conversation load already in flight, ignoring");
                return;
            }
            state.loading = true;
            state.error = None;
            self.publish(&state);
            state.epoch
        };

        let result = self.client.list().await;

        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            debug!("discarding conversation fetch from a disposed generation");
            return;
        }
        state.loading = false;
        match result {
            Ok(conversations) => {
                state.conversations = conversations;
            }
            Err(e) => {
                error!("failed to load conversations: {}", e);
                state.error = Some(e.to_string());
            }
        }
        self.publish(&state);
    }

    /// Mark a conversation as read.
    ///
    /// The unread count is zeroed and the activity timestamp refreshed
    /// locally before the request resolves. A network failure is logged and
    /// the optimistic update stands; nothing is surfaced to the caller.
    pub async fn mark_read(&self, id: &str) {
        {
            let mut state = self.state.lock().await;
            if let Some(conv) = state.conversations.iter_mut().find(|c| c.id == id) {
                conv.unread_count = 0;
                conv.timestamp = Utc::now();
            }
            self.publish(&state);
        }

        if let Err(e) = self.client.mark_read(id).await {
            warn!("failed to mark conversation {} as read: {}", id, e);
        }
    }

    /// Merge a partial update into a conversation, locally only.
    ///
    /// Used by the messaging flow to reflect a sent message in the list
    /// summary without a round trip.
    pub async fn update_local(&self, id: &str, patch: ConversationPatch) {
        let mut state = self.state.lock().await;
        if let Some(conv) = state.conversations.iter_mut().find(|c| c.id == id) {
            if let Some(last_message) = patch.last_message {
                conv.last_message = last_message;
            }
            if let Some(timestamp) = patch.timestamp {
                conv.timestamp = timestamp;
            }
            if let Some(unread_count) = patch.unread_count {
                conv.unread_count = unread_count;
            }
            if let Some(is_online) = patch.is_online {
                conv.is_online = Some(is_online);
            }
            if let Some(last_seen) = patch.last_seen {
                conv.last_seen = Some(last_seen);
            }
        }
        self.publish(&state);
    }

    /// Reset the store; any in-flight fetch is discarded on arrival
    pub async fn dispose(&self) {
        let mut state = self.state.lock().await;
        state.epoch += 1;
        state.conversations.clear();
        state.loading = false;
        state.error = None;
        self.publish(&state);
    }

    fn publish(&self, state: &State) {
        let mut conversations = state.conversations.clone();
        conversations.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.tx.send_replace(ConversationsSnapshot {
            conversations,
            loading: state.loading,
            error: state.error.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::testkit::{fixtures, MockApi};
    use crate::Error;

    fn store(api: MockApi) -> ConversationStore<MockApi> {
        ConversationStore::new(ConversationClient::new(api, "u_me"))
    }

    fn unavailable() -> Error {
        Error::Http {
            status: 500,
            message: "boom".to_string(),
            code: None,
        }
    }

    #[tokio::test]
    async fn test_load_sorts_snapshot_by_recency() {
        let api = MockApi::new();
        api.expect(
            "GET /conversations",
            Ok(json!([
                fixtures::conversation("old", "2024-03-01T10:00:00Z", 0),
                fixtures::conversation("new", "2024-03-07T10:00:00Z", 2),
                fixtures::conversation("mid", "2024-03-04T10:00:00Z", 1),
            ])),
        );

        let store = store(api);
        store.load().await;

        let snapshot = store.snapshot();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.error, None);
        let ids: Vec<&str> = snapshot.conversations.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["new", "mid", "old"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_loads_issue_one_request() {
        let api = MockApi::new();
        api.set_delay(Duration::from_millis(50));
        api.expect(
            "GET /conversations",
            Ok(json!([fixtures::conversation("c1", "2024-03-05T12:30:00Z", 0)])),
        );

        let store = store(api.clone());
        tokio::join!(store.load(), store.load());

        assert_eq!(api.call_count(), 1);
        assert_eq!(store.snapshot().conversations.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_load_preserves_previous_collection() {
        let api = MockApi::new();
        api.expect(
            "GET /conversations",
            Ok(json!([fixtures::conversation("c1", "2024-03-05T12:30:00Z", 0)])),
        );
        // Transient failures on the refetch until the retry budget runs out
        for _ in 0..4 {
            api.expect("GET /conversations", Err(unavailable()));
        }

        let store = store(api);
        store.load().await;
        assert_eq!(store.snapshot().conversations.len(), 1);

        store.load().await;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.conversations.len(), 1, "previous data must survive");
        assert!(snapshot.error.is_some());
        assert!(!snapshot.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_read_is_optimistic_before_response() {
        let api = MockApi::new();
        api.expect(
            "GET /conversations",
            Ok(json!([fixtures::conversation("c1", "2024-03-05T12:30:00Z", 3)])),
        );

        let store = store(api.clone());
        store.load().await;

        api.set_delay(Duration::from_millis(100));
        api.expect("POST /conversations/c1/read", Ok(json!(null)));

        tokio::join!(store.mark_read("c1"), async {
            tokio::task::yield_now().await;
            // The zeroing is visible while the request is still in flight
            let snapshot = store.snapshot();
            assert_eq!(snapshot.conversations[0].unread_count, 0);
        });
    }

    #[tokio::test]
    async fn test_mark_read_failure_is_not_rolled_back() {
        let api = MockApi::new();
        api.expect(
            "GET /conversations",
            Ok(json!([fixtures::conversation("c1", "2024-03-05T12:30:00Z", 5)])),
        );
        api.expect(
            "POST /conversations/c1/read",
            Err(Error::Http {
                status: 404,
                message: "gone".to_string(),
                code: None,
            }),
        );

        let store = store(api);
        store.load().await;
        let before = store.snapshot().conversations[0].timestamp;

        store.mark_read("c1").await;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.conversations[0].unread_count, 0);
        assert!(snapshot.conversations[0].timestamp >= before);
        // Fire-and-forget: the failure is logged, not surfaced
        assert_eq!(snapshot.error, None);
    }

    #[tokio::test]
    async fn test_update_local_merges_without_network() {
        let api = MockApi::new();
        api.expect(
            "GET /conversations",
            Ok(json!([fixtures::conversation("c1", "2024-03-05T12:30:00Z", 0)])),
        );

        let store = store(api.clone());
        store.load().await;

        store
            .update_local(
                "c1",
                ConversationPatch {
                    last_message: Some("on my way".to_string()),
                    is_online: Some(true),
                    ..Default::default()
                },
            )
            .await;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.conversations[0].last_message, "on my way");
        assert_eq!(snapshot.conversations[0].is_online, Some(true));
        assert_eq!(api.call_count(), 1, "update_local must not hit the network");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_discards_in_flight_fetch() {
        let api = MockApi::new();
        api.set_delay(Duration::from_millis(50));
        api.expect(
            "GET /conversations",
            Ok(json!([fixtures::conversation("c1", "2024-03-05T12:30:00Z", 0)])),
        );

        let store = store(api);
        tokio::join!(store.load(), async {
            tokio::task::yield_now().await;
            store.dispose().await;
        });

        let snapshot = store.snapshot();
        assert!(snapshot.conversations.is_empty());
        assert!(!snapshot.loading);
    }
}
