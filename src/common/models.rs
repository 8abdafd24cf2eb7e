use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Sender block as the backend embeds it in message payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSender {
    pub id: Option<i64>,
    pub name: Option<String>,
}

/// Message exactly as the backend serializes it, both in the history
/// endpoint and in websocket broadcasts:
/// `{id, content, sender: {id, name}, createdAt}`.
///
/// The group is not part of the payload; it is implied by the endpoint or
/// the subscribed topic, so the client stamps it on when mapping to
/// [`ChatMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    pub id: i64,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<WireSender>,
    pub created_at: NaiveDateTime,
}

/// A chat message as the UI layer sees it. Immutable once created; identity
/// and timestamps are assigned by the server, never locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: i64,
    pub group_id: i64,
    pub sender_id: Option<i64>,
    pub sender_name: String,
    pub content: String,
    pub created_at: NaiveDateTime,
}

impl ChatMessage {
    /// Stamp a wire payload with the group it was fetched or received for.
    pub fn from_wire(wire: WireMessage, group_id: i64) -> Self {
        let (sender_id, sender_name) = match wire.sender {
            Some(sender) => (
                sender.id,
                sender.name.unwrap_or_else(|| "Unknown".to_string()),
            ),
            None => (None, "Unknown".to_string()),
        };
        Self {
            id: wire.id,
            group_id,
            sender_id,
            sender_name,
            content: wire.content,
            created_at: wire.created_at,
        }
    }

    /// Display ordering: creation time, ties broken by server id.
    pub fn sort_key(&self) -> (NaiveDateTime, i64) {
        (self.created_at, self.id)
    }
}

/// Row of the read-only group listing. Enough to pick a group and open its
/// chat; membership and creation are handled elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub member_count: Option<u32>,
}
