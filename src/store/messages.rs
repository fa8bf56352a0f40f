//! Message store for the active conversation
//!
//! Holds the message sequence for exactly one conversation at a time.
//! Switching conversations bumps a request epoch; a response is committed
//! only when its captured epoch still matches, so a fetch for a previous
//! conversation is discarded on arrival rather than applied late.

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error};

use crate::client::{ConversationClient, DEFAULT_MESSAGE_LIMIT, DEFAULT_PAGE};
use crate::transport::{Api, FilePart};
use crate::types::Message;
use crate::Result;

/// Read-only view of the message store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesSnapshot {
    /// Active conversation, if any
    pub conversation_id: Option<String>,
    /// Messages in timestamp order, ties in arrival order
    pub messages: Vec<Message>,
    /// Whether a fetch is in flight
    pub loading: bool,
    /// Whether a send is in flight
    pub sending: bool,
    /// Message of the most recent failure, cleared on the next operation
    pub error: Option<String>,
}

#[derive(Default)]
struct State {
    conversation_id: Option<String>,
    messages: Vec<Message>,
    loading: bool,
    sending: bool,
    error: Option<String>,
    epoch: u64,
}

/// Owning in-memory cache of one conversation's messages
pub struct MessageStore<A: Api> {
    client: ConversationClient<A>,
    state: Mutex<State>,
    tx: watch::Sender<MessagesSnapshot>,
}

impl<A: Api> MessageStore<A> {
    /// Create an empty store backed by the given client
    pub fn new(client: ConversationClient<A>) -> Self {
        let (tx, _) = watch::channel(MessagesSnapshot::default());
        Self {
            client,
            state: Mutex::new(State::default()),
            tx,
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> MessagesSnapshot {
        self.tx.borrow().clone()
    }

    /// Subscribe to snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<MessagesSnapshot> {
        self.tx.subscribe()
    }

    /// Switch the active conversation.
    ///
    /// A no-op when the key is unchanged. Otherwise the sequence is cleared
    /// and the epoch bumped: responses still in flight for the previous
    /// conversation will not be applied.
    pub async fn set_conversation(&self, id: Option<&str>) {
        let mut state = self.state.lock().await;
        if state.conversation_id.as_deref() == id {
            return;
        }
        state.epoch += 1;
        state.conversation_id = id.map(str::to_string);
        state.messages.clear();
        state.loading = false;
        state.sending = false;
        state.error = None;
        self.publish(&state);
    }

    /// Fetch the first page of messages for the active conversation.
    ///
    /// A no-op while a fetch is in flight. Without an active conversation
    /// the sequence is simply cleared.
    pub async fn load(&self) {
        let (epoch, conversation_id) = {
            let mut state = self.state.lock().await;
            let Some(id) = state.conversation_id.clone() else {
                state.messages.clear();
                state.loading = false;
                self.publish(&state);
                return;
            };
            if state.loading {
                debug!("message load already in flight, ignoring");
                return;
            }
            state.loading = true;
            state.error = None;
            self.publish(&state);
            (state.epoch, id)
        };

        let result = self
            .client
            .list_messages(&conversation_id, DEFAULT_PAGE, DEFAULT_MESSAGE_LIMIT)
            .await;

        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            debug!(
                "discarding stale message fetch for conversation {}",
                conversation_id
            );
            return;
        }
        state.loading = false;
        match result {
            Ok(page) => {
                let mut messages = page.items;
                // Stable sort: equal timestamps keep arrival order
                messages.sort_by_key(|m| m.timestamp);
                state.messages = messages;
            }
            Err(e) => {
                error!(
                    "failed to load messages for conversation {}: {}",
                    conversation_id, e
                );
                state.error = Some(e.to_string());
            }
        }
        self.publish(&state);
    }

    /// Send a message in the active conversation.
    ///
    /// Returns `Ok(None)` without any network call when the text trims to
    /// empty, no conversation is active, or a send is already in flight
    /// (sends are serialized). On success the returned message is appended
    /// at the tail; the sequence is never re-sorted. On failure nothing is
    /// appended, the error is recorded and returned.
    pub async fn send(
        &self,
        text: &str,
        attachments: Vec<FilePart>,
    ) -> Result<Option<Message>> {
        let (epoch, conversation_id) = {
            let mut state = self.state.lock().await;
            let Some(id) = state.conversation_id.clone() else {
                return Ok(None);
            };
            if text.trim().is_empty() {
                return Ok(None);
            }
            if state.sending {
                debug!("send already in flight, ignoring");
                return Ok(None);
            }
            state.sending = true;
            state.error = None;
            self.publish(&state);
            (state.epoch, id)
        };

        let result = self
            .client
            .send_message(&conversation_id, text, attachments)
            .await;

        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            debug!("conversation changed during send, result not applied");
            return result.map(Some);
        }
        state.sending = false;
        match result {
            Ok(message) => {
                state.messages.push(message.clone());
                self.publish(&state);
                Ok(Some(message))
            }
            Err(e) => {
                error!("failed to send message: {}", e);
                state.error = Some(e.to_string());
                self.publish(&state);
                Err(e)
            }
        }
    }

    /// Append an externally delivered message, locally only.
    ///
    /// Messages for a conversation other than the active one are dropped.
    pub async fn append(&self, message: Message) {
        let mut state = self.state.lock().await;
        if state.conversation_id.as_deref() != Some(message.conversation_id.as_str()) {
            debug!(
                "dropping delivered message for inactive conversation {}",
                message.conversation_id
            );
            return;
        }
        state.messages.push(message);
        self.publish(&state);
    }

    /// Reset the store; any in-flight operation is discarded on arrival
    pub async fn dispose(&self) {
        let mut state = self.state.lock().await;
        state.epoch += 1;
        state.conversation_id = None;
        state.messages.clear();
        state.loading = false;
        state.sending = false;
        state.error = None;
        self.publish(&state);
    }

    fn publish(&self, state: &State) {
        self.tx.send_replace(MessagesSnapshot {
            conversation_id: state.conversation_id.clone(),
            messages: state.messages.clone(),
            loading: state.loading,
            sending: state.sending,
            error: state.error.clone(),
        });
    }
}
