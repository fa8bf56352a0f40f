//! Conversation and message operations against the REST authority

use serde_json::{json, Value};

use super::wire;
use crate::config::endpoints;
use crate::retry::{with_retry, RetryPolicy};
use crate::transport::{Api, FilePart, MultipartForm};
use crate::types::{Conversation, Message, Page};
use crate::Result;

/// Default page number for message listings
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size for message listings
pub const DEFAULT_MESSAGE_LIMIT: u32 = 50;

/// Stateless client for conversation and message endpoints.
///
/// Idempotent operations run under the retry policy; sends and creates run
/// exactly once because the transport gives no at-most-once guarantee.
///
/// # Example
/// ```rust,no_run
/// use mercado_sync::client::ConversationClient;
/// use mercado_sync::config::{ApiConfig, StaticCredentials};
/// use mercado_sync::transport::Transport;
///
/// # async fn example() -> mercado_sync::Result<()> {
/// let transport = Transport::new(ApiConfig::default(), StaticCredentials::anonymous())?;
/// let client = ConversationClient::new(transport, "u_me");
///
/// for conversation in client.list().await? {
///     println!("{}: {}", conversation.participant, conversation.last_message);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConversationClient<A: Api> {
    api: A,
    retry: RetryPolicy,
    current_user_id: String,
}

impl<A: Api> ConversationClient<A> {
    /// Create a client for the given transport and current user.
    ///
    /// The current user identity is what message ownership is computed
    /// against during response translation.
    pub fn new(api: A, current_user_id: impl Into<String>) -> Self {
        Self {
            api,
            retry: RetryPolicy::default(),
            current_user_id: current_user_id.into(),
        }
    }

    /// Override the retry policy for idempotent operations
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// List all conversations for the current user
    pub async fn list(&self) -> Result<Vec<Conversation>> {
        let data = with_retry(&self.retry, || self.api.get(endpoints::CONVERSATIONS)).await?;
        wire::conversations_from_value(data)
    }

    /// Fetch a single conversation
    pub async fn get(&self, id: &str) -> Result<Conversation> {
        let path = endpoints::conversation(id);
        let data = with_retry(&self.retry, || self.api.get(&path)).await?;
        wire::conversation_from_value(data)
    }

    /// Create a conversation with another participant.
    ///
    /// Runs exactly once; a retry could create a duplicate conversation.
    pub async fn create(
        &self,
        participant_id: &str,
        initial_message: Option<&str>,
    ) -> Result<Conversation> {
        let mut body = json!({ "participantId": participant_id });
        if let Some(text) = initial_message {
            body["initialMessage"] = Value::String(text.to_string());
        }

        let data = self
            .api
            .post_json(endpoints::CONVERSATIONS, Some(body))
            .await?;
        wire::conversation_from_value(data)
    }

    /// Mark a conversation as read
    pub async fn mark_read(&self, id: &str) -> Result<()> {
        let path = endpoints::conversation_read(id);
        with_retry(&self.retry, || self.api.post_json(&path, None)).await?;
        Ok(())
    }

    /// List one page of messages in a conversation
    pub async fn list_messages(
        &self,
        conversation_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Page<Message>> {
        let path = format!(
            "{}?page={}&limit={}",
            endpoints::messages(conversation_id),
            page,
            limit
        );
        let data = with_retry(&self.retry, || self.api.get(&path)).await?;
        wire::message_page_from_value(data, &self.current_user_id)
    }

    /// Send a message in a conversation.
    ///
    /// Text-only messages go as a JSON body; messages with attachments go as
    /// a multipart form with the text field first, then one form entry per
    /// file. Runs exactly once.
    pub async fn send_message(
        &self,
        conversation_id: &str,
        text: &str,
        attachments: Vec<FilePart>,
    ) -> Result<Message> {
        let path = endpoints::messages(conversation_id);

        let data = if attachments.is_empty() {
            self.api
                .post_json(&path, Some(json!({ "text": text })))
                .await?
        } else {
            let mut form = MultipartForm::new().text("text", text);
            for part in attachments {
                form = form.file("attachments", part);
            }
            self.api.upload(&path, form).await?
        };

        wire::message_from_value(data, &self.current_user_id)
    }
}
