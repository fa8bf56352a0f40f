//! Domain entities for conversations, messages and disputes
//!
//! All collections are flat value types keyed by id; entities reference each
//! other by id only, never by embedded object graph. Stores own the
//! authoritative local copies; consumers receive clones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::transport::FilePart;
use crate::{Error, Result};

/// Minimum dispute description length enforced locally at creation
pub const MIN_DISPUTE_DESCRIPTION_CHARS: usize = 20;

/// A conversation with another marketplace participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Unique conversation identifier
    pub id: String,
    /// Identifier of the other participant
    pub participant_id: String,
    /// Display name of the other participant
    pub participant: String,
    /// Summary text of the most recent message
    pub last_message: String,
    /// Last-activity instant, used for list ordering (descending)
    pub timestamp: DateTime<Utc>,
    /// Number of unread messages
    pub unread_count: u32,
    /// Whether the participant is currently online, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_online: Option<bool>,
    /// When the participant was last seen, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    /// Related order, for conversations attached to a purchase
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

/// Delivery status of a message.
///
/// Transitions are monotonic: sent, then delivered, then read. A status
/// never regresses; see [`Message::advance_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Accepted by the server
    Sent,
    /// Delivered to the recipient
    Delivered,
    /// Read by the recipient
    Read,
}

impl Default for MessageStatus {
    fn default() -> Self {
        Self::Sent
    }
}

/// A single message within a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier
    pub id: String,
    /// Conversation this message belongs to
    pub conversation_id: String,
    /// Message body
    pub text: String,
    /// Display name of the sender
    pub sender: String,
    /// Identifier of the sender
    pub sender_id: String,
    /// When the message was sent
    pub timestamp: DateTime<Utc>,
    /// Whether the current user authored this message.
    ///
    /// Computed from `sender_id` against the configured current user during
    /// wire translation, never taken from the response body.
    pub is_own: bool,
    /// Delivery status
    #[serde(default)]
    pub status: MessageStatus,
    /// Files attached to the message
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Advance the delivery status, ignoring regressions.
    ///
    /// Returns true when the status actually changed.
    pub fn advance_status(&mut self, next: MessageStatus) -> bool {
        if next > self.status {
            self.status = next;
            true
        } else {
            false
        }
    }
}

/// Kind of file attached to a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// Image file
    Image,
    /// Document file
    Document,
    /// Video file
    Video,
}

/// A file attached to a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Unique attachment identifier
    pub id: String,
    /// Media kind
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    /// Source URL
    pub url: String,
    /// Original filename
    pub filename: String,
    /// Size in bytes
    pub size: u64,
}

/// Lifecycle status of a dispute.
///
/// `Resolved` and `Rejected` are terminal; the server enforces transition
/// legality and the client never advances status locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    /// Filed, awaiting initial verification
    PendingVerification,
    /// Under review by support staff
    InReview,
    /// Waiting for the seller to respond
    #[serde(alias = "waiting_seller")]
    AwaitingSeller,
    /// Closed in favor of one party
    Resolved,
    /// Closed without action
    Rejected,
}

impl DisputeStatus {
    /// Wire representation, used for query parameters
    pub fn as_str(&self) -> &'static str {
        match self {
            DisputeStatus::PendingVerification => "pending_verification",
            DisputeStatus::InReview => "in_review",
            DisputeStatus::AwaitingSeller => "awaiting_seller",
            DisputeStatus::Resolved => "resolved",
            DisputeStatus::Rejected => "rejected",
        }
    }
}

/// Enumerated reason a dispute was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeReason {
    /// The product never arrived
    NotReceived,
    /// The product arrived damaged
    DamagedProduct,
    /// The product does not match its listing
    NotAsDescribed,
    /// A different product was delivered
    WrongItem,
    /// Any other reason
    Other,
}

impl DisputeReason {
    /// Wire representation, used for form fields
    pub fn as_str(&self) -> &'static str {
        match self {
            DisputeReason::NotReceived => "not_received",
            DisputeReason::DamagedProduct => "damaged_product",
            DisputeReason::NotAsDescribed => "not_as_described",
            DisputeReason::WrongItem => "wrong_item",
            DisputeReason::Other => "other",
        }
    }
}

/// A dispute over an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispute {
    /// Unique dispute identifier
    pub id: String,
    /// Order the dispute is about
    pub order_id: String,
    /// Human-readable order number
    pub order_number: String,
    /// Product name from the order
    pub product: String,
    /// Seller display name
    pub seller: String,
    /// Disputed amount, as formatted by the server
    pub amount: String,
    /// Current lifecycle status
    pub status: DisputeStatus,
    /// Reason the dispute was opened
    pub reason: DisputeReason,
    /// Free-text description supplied at creation
    pub description: String,
    /// When the dispute was created
    pub created_at: DateTime<Utc>,
    /// When the dispute was last updated
    pub updated_at: DateTime<Utc>,
    /// Uploaded evidence, in upload order
    pub evidence: Vec<Evidence>,
    /// Timeline of events, server-maintained
    pub timeline: Vec<TimelineEvent>,
}

impl Dispute {
    /// Whether a seller-response action is currently available
    pub fn can_respond_as_seller(&self) -> bool {
        self.status == DisputeStatus::AwaitingSeller
    }

    /// Whether the dispute can still be cancelled by the buyer
    pub fn can_cancel(&self) -> bool {
        matches!(
            self.status,
            DisputeStatus::PendingVerification | DisputeStatus::InReview
        )
    }

    /// Whether the dispute has reached a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, DisputeStatus::Resolved | DisputeStatus::Rejected)
    }
}

/// Kind of evidence file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceKind {
    /// Image file
    Image,
    /// Document file
    Document,
}

/// An evidence file attached to a dispute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    /// Unique evidence identifier
    pub id: String,
    /// Media kind
    #[serde(rename = "type")]
    pub kind: EvidenceKind,
    /// Source URL
    pub url: String,
    /// Original filename
    pub filename: String,
    /// When the file was uploaded
    pub uploaded_at: DateTime<Utc>,
}

/// Kind of dispute timeline event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEventKind {
    /// Dispute was created
    Created,
    /// Status changed
    StatusChange,
    /// A comment was added
    Comment,
    /// Evidence was added
    EvidenceAdded,
    /// Dispute was resolved
    Resolved,
}

/// A single event in a dispute's timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    /// Unique event identifier
    pub id: String,
    /// Event kind
    #[serde(rename = "type")]
    pub kind: TimelineEventKind,
    /// Free-text description
    pub description: String,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// Display name of the acting party
    pub actor: String,
    /// Optional structured metadata, opaque to the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Payload for creating a dispute
#[derive(Debug, Clone)]
pub struct CreateDisputePayload {
    /// Order the dispute is about
    pub order_id: String,
    /// Reason code
    pub reason: DisputeReason,
    /// Free-text description, at least [`MIN_DISPUTE_DESCRIPTION_CHARS`] characters
    pub description: String,
    /// Evidence files to upload with the dispute
    pub evidence: Vec<FilePart>,
}

impl CreateDisputePayload {
    /// Validate the payload before any network call is made
    pub fn validate(&self) -> Result<()> {
        if self.order_id.trim().is_empty() {
            return Err(Error::Validation("an order must be selected".to_string()));
        }
        if self.description.trim().chars().count() < MIN_DISPUTE_DESCRIPTION_CHARS {
            return Err(Error::Validation(format!(
                "description must be at least {} characters",
                MIN_DISPUTE_DESCRIPTION_CHARS
            )));
        }
        Ok(())
    }
}

/// Partial update for a dispute, sent as a PATCH body
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputePatch {
    /// Requested status change, subject to server-side legality checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DisputeStatus>,
    /// Updated reason code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DisputeReason>,
    /// Updated description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Local-only partial update for a conversation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationPatch {
    /// New last-message summary
    pub last_message: Option<String>,
    /// New last-activity instant
    pub timestamp: Option<DateTime<Utc>>,
    /// New unread count
    pub unread_count: Option<u32>,
    /// New online flag
    pub is_online: Option<bool>,
    /// New last-seen instant
    pub last_seen: Option<DateTime<Utc>>,
}

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: u64,
    /// Page number, 1-based
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Whether more pages follow
    pub has_more: bool,
}
