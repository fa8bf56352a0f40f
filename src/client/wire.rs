//! Wire-format DTOs and translation into domain entities
//!
//! Responses arrive camelCase with RFC 3339 timestamp strings. Translation
//! is fail-fast: a malformed timestamp or a missing required field fails
//! the whole response with a decode error, since retrying cannot fix
//! malformed data.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::types::{
    Attachment, Conversation, Dispute, DisputeReason, DisputeStatus, Evidence, EvidenceKind,
    Message, MessageStatus, Page, TimelineEvent, TimelineEventKind,
};
use crate::{Error, Result};

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Decode(format!("invalid timestamp '{}': {}", raw, e)))
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::Decode(format!("invalid {}: {}", what, e)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireConversation {
    id: String,
    participant_id: String,
    participant: String,
    last_message: String,
    timestamp: String,
    unread_count: u32,
    #[serde(default)]
    is_online: Option<bool>,
    #[serde(default)]
    last_seen: Option<String>,
    #[serde(default)]
    order_id: Option<String>,
}

impl WireConversation {
    fn into_domain(self) -> Result<Conversation> {
        Ok(Conversation {
            timestamp: parse_timestamp(&self.timestamp)?,
            last_seen: self.last_seen.as_deref().map(parse_timestamp).transpose()?,
            id: self.id,
            participant_id: self.participant_id,
            participant: self.participant,
            last_message: self.last_message,
            unread_count: self.unread_count,
            is_online: self.is_online,
            order_id: self.order_id,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireMessage {
    id: String,
    conversation_id: String,
    text: String,
    sender: String,
    sender_id: String,
    timestamp: String,
    #[serde(default)]
    status: Option<MessageStatus>,
    #[serde(default)]
    attachments: Vec<Attachment>,
}

impl WireMessage {
    /// Translate into a domain message.
    ///
    /// `is_own` is computed from `sender_id` against the configured current
    /// user; any `isOwn` flag in the response body is ignored.
    fn into_domain(self, current_user_id: &str) -> Result<Message> {
        Ok(Message {
            timestamp: parse_timestamp(&self.timestamp)?,
            is_own: self.sender_id == current_user_id,
            status: self.status.unwrap_or_default(),
            id: self.id,
            conversation_id: self.conversation_id,
            text: self.text,
            sender: self.sender,
            sender_id: self.sender_id,
            attachments: self.attachments,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WirePage<T> {
    data: Vec<T>,
    total: u64,
    page: u32,
    limit: u32,
    has_more: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireEvidence {
    id: String,
    #[serde(rename = "type")]
    kind: EvidenceKind,
    url: String,
    filename: String,
    uploaded_at: String,
}

impl WireEvidence {
    fn into_domain(self) -> Result<Evidence> {
        Ok(Evidence {
            uploaded_at: parse_timestamp(&self.uploaded_at)?,
            id: self.id,
            kind: self.kind,
            url: self.url,
            filename: self.filename,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireTimelineEvent {
    id: String,
    #[serde(rename = "type")]
    kind: TimelineEventKind,
    description: String,
    timestamp: String,
    actor: String,
    #[serde(default)]
    metadata: Option<Value>,
}

impl WireTimelineEvent {
    fn into_domain(self) -> Result<TimelineEvent> {
        Ok(TimelineEvent {
            timestamp: parse_timestamp(&self.timestamp)?,
            id: self.id,
            kind: self.kind,
            description: self.description,
            actor: self.actor,
            metadata: self.metadata,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireDispute {
    id: String,
    order_id: String,
    order_number: String,
    product: String,
    seller: String,
    amount: String,
    status: DisputeStatus,
    reason: DisputeReason,
    description: String,
    created_at: String,
    updated_at: String,
    evidence: Vec<WireEvidence>,
    timeline: Vec<WireTimelineEvent>,
}

impl WireDispute {
    fn into_domain(self) -> Result<Dispute> {
        Ok(Dispute {
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            evidence: self
                .evidence
                .into_iter()
                .map(WireEvidence::into_domain)
                .collect::<Result<_>>()?,
            timeline: self
                .timeline
                .into_iter()
                .map(WireTimelineEvent::into_domain)
                .collect::<Result<_>>()?,
            id: self.id,
            order_id: self.order_id,
            order_number: self.order_number,
            product: self.product,
            seller: self.seller,
            amount: self.amount,
            status: self.status,
            reason: self.reason,
            description: self.description,
        })
    }
}

pub(crate) fn conversation_from_value(value: Value) -> Result<Conversation> {
    decode::<WireConversation>(value, "conversation")?.into_domain()
}

pub(crate) fn conversations_from_value(value: Value) -> Result<Vec<Conversation>> {
    decode::<Vec<WireConversation>>(value, "conversation list")?
        .into_iter()
        .map(WireConversation::into_domain)
        .collect()
}

pub(crate) fn message_from_value(value: Value, current_user_id: &str) -> Result<Message> {
    decode::<WireMessage>(value, "message")?.into_domain(current_user_id)
}

pub(crate) fn message_page_from_value(
    value: Value,
    current_user_id: &str,
) -> Result<Page<Message>> {
    let page = decode::<WirePage<WireMessage>>(value, "message page")?;
    Ok(Page {
        items: page
            .data
            .into_iter()
            .map(|m| m.into_domain(current_user_id))
            .collect::<Result<_>>()?,
        total: page.total,
        page: page.page,
        limit: page.limit,
        has_more: page.has_more,
    })
}

pub(crate) fn dispute_from_value(value: Value) -> Result<Dispute> {
    decode::<WireDispute>(value, "dispute")?.into_domain()
}

pub(crate) fn disputes_from_value(value: Value) -> Result<Vec<Dispute>> {
    decode::<Vec<WireDispute>>(value, "dispute list")?
        .into_iter()
        .map(WireDispute::into_domain)
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testkit::fixtures;

    #[test]
    fn test_conversation_timestamps_are_parsed() {
        let conv = conversation_from_value(json!({
            "id": "c1",
            "participantId": "u1",
            "participant": "Alice",
            "lastMessage": "hola",
            "timestamp": "2024-03-05T12:30:00Z",
            "unreadCount": 2,
            "lastSeen": "2024-03-05T12:00:00+01:00",
        }))
        .expect("Failed to decode conversation");

        assert_eq!(conv.id, "c1");
        assert_eq!(conv.unread_count, 2);
        assert_eq!(conv.timestamp.to_rfc3339(), "2024-03-05T12:30:00+00:00");
        // Offsets are normalized to UTC
        assert_eq!(
            conv.last_seen.expect("missing last_seen").to_rfc3339(),
            "2024-03-05T11:00:00+00:00"
        );
    }

    #[test]
    fn test_malformed_timestamp_fails_whole_list() {
        let result = conversations_from_value(json!([
            fixtures::conversation("c1", "2024-03-05T12:30:00Z", 0),
            fixtures::conversation("c2", "not-a-timestamp", 0),
        ]));

        match result {
            Err(Error::Decode(msg)) => assert!(msg.contains("not-a-timestamp")),
            other => panic!("Expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_field_is_decode_error() {
        let result = conversation_from_value(json!({
            "id": "c1",
            "participant": "Alice",
        }));

        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_is_own_computed_from_sender_identity() {
        let mut raw = fixtures::message("m1", "c1", "u_me", "2024-03-05T12:30:00Z");
        // A hostile server cannot force ownership; the flag is recomputed
        raw["isOwn"] = json!(false);
        let own = message_from_value(raw, "u_me").expect("Failed to decode message");
        assert!(own.is_own);

        let mut raw = fixtures::message("m2", "c1", "u_other", "2024-03-05T12:31:00Z");
        raw["isOwn"] = json!(true);
        let theirs = message_from_value(raw, "u_me").expect("Failed to decode message");
        assert!(!theirs.is_own);
    }

    #[test]
    fn test_message_status_defaults_to_sent() {
        let msg = message_from_value(
            fixtures::message("m1", "c1", "u1", "2024-03-05T12:30:00Z"),
            "u_me",
        )
        .expect("Failed to decode message");
        assert_eq!(msg.status, MessageStatus::Sent);
    }

    #[test]
    fn test_message_page_decodes() {
        let page = message_page_from_value(
            fixtures::message_page(vec![
                fixtures::message("m1", "c1", "u1", "2024-03-05T12:30:00Z"),
                fixtures::message("m2", "c1", "u1", "2024-03-05T12:31:00Z"),
            ]),
            "u_me",
        )
        .expect("Failed to decode page");

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 2);
        assert_eq!(page.page, 1);
        assert!(!page.has_more);
    }

    #[test]
    fn test_dispute_decodes_with_nested_collections() {
        let dispute = dispute_from_value(fixtures::dispute("d1", "o1", "waiting_seller"))
            .expect("Failed to decode dispute");

        assert_eq!(dispute.id, "d1");
        assert_eq!(dispute.status, DisputeStatus::AwaitingSeller);
        assert_eq!(dispute.timeline.len(), 1);
        assert_eq!(dispute.timeline[0].kind, TimelineEventKind::Created);
    }

    #[test]
    fn test_dispute_with_bad_timeline_timestamp_fails() {
        let mut raw = fixtures::dispute("d1", "o1", "in_review");
        raw["timeline"][0]["timestamp"] = json!("yesterday-ish");

        assert!(matches!(
            dispute_from_value(raw),
            Err(Error::Decode(_))
        ));
    }
}
