//! Frames travelling over the chat websocket, as `{ "type", "payload" }`
//! JSON envelopes. The client subscribes to one group topic and publishes
//! bare `{content}` payloads; everything else (identity, ids, timestamps)
//! is attached server-side before the broadcast.

use serde::{Deserialize, Serialize};

use crate::common::models::WireMessage;

/// Routing key the server broadcasts a group's messages on.
pub fn group_topic(group_id: i64) -> String {
    format!("/topic/group/{}", group_id)
}

/// Destination the client publishes a group's outgoing messages to.
pub fn group_destination(group_id: i64) -> String {
    format!("/app/group/{}", group_id)
}

/// Client → server frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ClientFrame {
    /// Declare interest in one group topic.
    Subscribe { topic: String },
    /// Publish a message body to a group destination.
    Publish { destination: String, content: String },
}

/// Server → client frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ServerFrame {
    /// Acknowledges a subscription; ends the handshake.
    Subscribed { topic: String },
    /// A broadcast message on the subscribed topic (sender echo included).
    Message(WireMessage),
    /// Out-of-band server error.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn subscribe_frame_envelope() {
        let frame = ClientFrame::Subscribe {
            topic: group_topic(9),
        };
        let s = serde_json::to_string(&frame).expect("serialize");
        let v: Value = serde_json::from_str(&s).unwrap();
        assert_eq!(v["type"], "subscribe");
        assert_eq!(v["payload"]["topic"], "/topic/group/9");

        let back: ClientFrame = serde_json::from_str(&s).expect("deserialize");
        assert_eq!(back, frame);
    }

    #[test]
    fn publish_frame_envelope() {
        let frame = ClientFrame::Publish {
            destination: group_destination(9),
            content: "morning run done".to_string(),
        };
        let s = serde_json::to_string(&frame).expect("serialize");
        let v: Value = serde_json::from_str(&s).unwrap();
        assert_eq!(v["type"], "publish");
        assert_eq!(v["payload"]["destination"], "/app/group/9");
        assert_eq!(v["payload"]["content"], "morning run done");
    }

    #[test]
    fn message_frame_carries_wire_payload() {
        let json = r#"{
            "type": "message",
            "payload": {
                "id": 31,
                "content": "who's in for tomorrow?",
                "sender": {"id": 2, "name": "Ana"},
                "createdAt": "2026-03-14T18:30:00"
            }
        }"#;
        match serde_json::from_str::<ServerFrame>(json).expect("deserialize") {
            ServerFrame::Message(wire) => {
                assert_eq!(wire.id, 31);
                assert_eq!(wire.sender.unwrap().id, Some(2));
            }
            other => panic!("expected message frame, got {:?}", other),
        }
    }

    #[test]
    fn subscribed_ack_roundtrip() {
        let frame = ServerFrame::Subscribed {
            topic: group_topic(4),
        };
        let s = serde_json::to_string(&frame).expect("serialize");
        let back: ServerFrame = serde_json::from_str(&s).expect("deserialize");
        assert_eq!(back, frame);
    }
}
