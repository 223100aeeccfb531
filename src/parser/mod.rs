//! JSON boundary for host-supplied conversation objects.
//!
//! This module provides pure parsing functions for converting host JSON
//! (message objects, history arrays, avatar objects) into validated model
//! types. Nothing is guessed: a field the message type requires must be
//! present, otherwise the object is rejected with a [`MalformedMessage`].

use crate::model::{
    DeliveryStatus, Direction, MalformedMessage, Message, MessageId, MessageType, SenderAvatar,
    SenderId, TransferProgress,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Deserialize;

const UNTYPED: &str = "message";

/// Raw JSON structure for deserializing host message objects.
#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    id: Option<RawId>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    direction: Option<String>,
    #[serde(default, alias = "sender")]
    sender_contact_method: Option<String>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    delivery_status: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    progress: Option<u64>,
    #[serde(default, rename = "totalSize")]
    total_size: Option<u64>,
}

/// Hosts send ids either as strings or as integers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawAvatar {
    #[serde(default, alias = "sender_contact_method")]
    sender: Option<String>,
    #[serde(default)]
    sender_image: Option<String>,
}

/// Parse a single message object from its JSON text.
///
/// # Errors
///
/// Returns `MalformedMessage` if the JSON is invalid or the object violates
/// the message contract (see [`message_from_value`]).
pub fn parse_message(raw: &str) -> Result<Message, MalformedMessage> {
    let raw_message: RawMessage = serde_json::from_str(raw).map_err(invalid_json)?;
    build_message(raw_message)
}

/// Convert an already-decoded JSON value into a message.
///
/// Requirements per type:
/// - every message: `id`, `type`, `direction`, `timestamp`, `text`
/// - `text` / `data_transfer`: `sender_contact_method` and `delivery_status`
/// - `ongoing:<kind>` statuses are accepted for transfers only
/// - `progress` and `totalSize` come as a pair and are kept for transfers only
pub fn message_from_value(value: serde_json::Value) -> Result<Message, MalformedMessage> {
    let raw_message: RawMessage = serde_json::from_value(value).map_err(invalid_json)?;
    build_message(raw_message)
}

/// Parse a full history: a JSON array of message objects, oldest first.
///
/// The first malformed element rejects the whole history.
pub fn parse_history(raw: &str) -> Result<Vec<Message>, MalformedMessage> {
    let values: Vec<serde_json::Value> = serde_json::from_str(raw).map_err(invalid_json)?;
    history_from_values(values)
}

/// Same as [`parse_history`] for an already-decoded array.
pub fn history_from_values(
    values: Vec<serde_json::Value>,
) -> Result<Vec<Message>, MalformedMessage> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            message_from_value(value).inspect_err(|e| {
                tracing::warn!(index, error = %e, "Rejected history element");
            })
        })
        .collect()
}

/// Parse a `{ "sender": ..., "sender_image": <base64> }` avatar object.
pub fn avatar_from_value(value: serde_json::Value) -> Result<SenderAvatar, MalformedMessage> {
    let raw: RawAvatar = serde_json::from_value(value).map_err(invalid_json)?;
    let sender_raw = raw.sender.ok_or(MalformedMessage::MissingField {
        field: "sender",
        kind: "avatar",
    })?;
    let sender = SenderId::new(sender_raw.as_str()).map_err(|_| MalformedMessage::InvalidValue {
        field: "sender",
        value: sender_raw.clone(),
    })?;
    let encoded = raw.sender_image.ok_or(MalformedMessage::MissingField {
        field: "sender_image",
        kind: "avatar",
    })?;
    let image = STANDARD
        .decode(encoded.trim())
        .map_err(|e| MalformedMessage::InvalidAvatar {
            sender: sender_raw,
            reason: e.to_string(),
        })?;
    Ok(SenderAvatar::new(sender, image))
}

fn invalid_json(e: serde_json::Error) -> MalformedMessage {
    MalformedMessage::InvalidJson {
        message: e.to_string(),
    }
}

fn build_message(raw: RawMessage) -> Result<Message, MalformedMessage> {
    let id_raw = raw
        .id
        .ok_or(MalformedMessage::MissingField {
            field: "id",
            kind: UNTYPED,
        })?
        .into_string();
    let id = MessageId::new(id_raw.as_str()).map_err(|_| MalformedMessage::InvalidValue {
        field: "id",
        value: id_raw,
    })?;

    let kind_raw = raw.kind.ok_or(MalformedMessage::MissingField {
        field: "type",
        kind: UNTYPED,
    })?;
    let kind = MessageType::parse(&kind_raw).ok_or(MalformedMessage::InvalidValue {
        field: "type",
        value: kind_raw,
    })?;
    let kind_name = kind.as_str();

    let direction_raw = raw.direction.ok_or(MalformedMessage::MissingField {
        field: "direction",
        kind: kind_name,
    })?;
    let direction = Direction::parse(&direction_raw).ok_or(MalformedMessage::InvalidValue {
        field: "direction",
        value: direction_raw,
    })?;

    let seconds = raw.timestamp.ok_or(MalformedMessage::MissingField {
        field: "timestamp",
        kind: kind_name,
    })?;
    let timestamp: DateTime<Utc> = DateTime::from_timestamp(seconds, 0)
        .ok_or(MalformedMessage::InvalidTimestamp(seconds))?;

    let text = raw.text.ok_or(MalformedMessage::MissingField {
        field: "text",
        kind: kind_name,
    })?;

    let sender = raw
        .sender_contact_method
        .map(|s| {
            SenderId::new(s.as_str()).map_err(|_| MalformedMessage::InvalidValue {
                field: "sender_contact_method",
                value: s,
            })
        })
        .transpose()?;

    let status = raw
        .delivery_status
        .map(|s| parse_status(s, kind))
        .transpose()?;

    match kind {
        MessageType::Text | MessageType::DataTransfer => {
            let sender = sender.ok_or(MalformedMessage::MissingField {
                field: "sender_contact_method",
                kind: kind_name,
            })?;
            let status = status.ok_or(MalformedMessage::MissingField {
                field: "delivery_status",
                kind: kind_name,
            })?;
            if kind == MessageType::Text {
                return Ok(Message::text(id, direction, sender, timestamp, status, text));
            }
            let progress = match (raw.progress, raw.total_size) {
                (Some(progress), Some(total)) => Some(TransferProgress::new(progress, total)),
                (None, None) => None,
                (Some(_), None) => {
                    return Err(MalformedMessage::MissingField {
                        field: "totalSize",
                        kind: kind_name,
                    })
                }
                (None, Some(_)) => {
                    return Err(MalformedMessage::MissingField {
                        field: "progress",
                        kind: kind_name,
                    })
                }
            };
            Ok(Message::transfer(
                id, direction, sender, timestamp, status, text, progress,
            ))
        }
        MessageType::Call | MessageType::Contact => {
            let message = if kind == MessageType::Call {
                Message::call(id, direction, timestamp, text)
            } else {
                Message::contact(id, direction, timestamp, text)
            };
            let message = message.with_sender(sender);
            Ok(match status {
                Some(status) => message.with_status(status),
                None => message,
            })
        }
    }
}

fn parse_status(raw: String, kind: MessageType) -> Result<DeliveryStatus, MalformedMessage> {
    match DeliveryStatus::parse(&raw) {
        Some(DeliveryStatus::Ongoing(Some(_))) if kind != MessageType::DataTransfer => {
            Err(MalformedMessage::InvalidValue {
                field: "delivery_status",
                value: raw,
            })
        }
        Some(status) => Ok(status),
        None => Err(MalformedMessage::InvalidValue {
            field: "delivery_status",
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_value() -> serde_json::Value {
        json!({
            "id": "17",
            "type": "text",
            "direction": "in",
            "sender_contact_method": "ring:abcd",
            "timestamp": 1_500_000_000,
            "delivery_status": "read",
            "text": "hello"
        })
    }

    #[test]
    fn parse_message_valid_text() {
        let msg = message_from_value(text_value()).expect("valid text message");
        assert_eq!(msg.id().as_str(), "17");
        assert_eq!(msg.kind(), MessageType::Text);
        assert_eq!(msg.direction(), Direction::In);
        assert_eq!(msg.sender().map(SenderId::as_str), Some("ring:abcd"));
        assert_eq!(msg.timestamp().timestamp(), 1_500_000_000);
        assert_eq!(msg.status(), &DeliveryStatus::Read);
        assert_eq!(msg.body(), "hello");
    }

    #[test]
    fn parse_message_accepts_numeric_id() {
        let mut value = text_value();
        value["id"] = json!(4021);
        let msg = message_from_value(value).expect("numeric id");
        assert_eq!(msg.id().as_str(), "4021");
    }

    #[test]
    fn parse_message_accepts_sender_alias() {
        let raw = r#"{"id":"1","type":"text","direction":"out","sender":"me","timestamp":0,"delivery_status":"sent","text":"x"}"#;
        let msg = parse_message(raw).expect("sender alias");
        assert_eq!(msg.sender().map(SenderId::as_str), Some("me"));
    }

    #[test]
    fn parse_message_rejects_missing_id() {
        let mut value = text_value();
        value.as_object_mut().unwrap().remove("id");
        assert_eq!(
            message_from_value(value),
            Err(MalformedMessage::MissingField {
                field: "id",
                kind: "message"
            })
        );
    }

    #[test]
    fn parse_message_rejects_empty_id() {
        let mut value = text_value();
        value["id"] = json!("");
        assert!(matches!(
            message_from_value(value),
            Err(MalformedMessage::InvalidValue { field: "id", .. })
        ));
    }

    #[test]
    fn parse_message_rejects_unknown_type() {
        let mut value = text_value();
        value["type"] = json!("sticker");
        assert_eq!(
            message_from_value(value),
            Err(MalformedMessage::InvalidValue {
                field: "type",
                value: "sticker".to_string()
            })
        );
    }

    #[test]
    fn parse_message_text_requires_sender() {
        let mut value = text_value();
        value.as_object_mut().unwrap().remove("sender_contact_method");
        assert_eq!(
            message_from_value(value),
            Err(MalformedMessage::MissingField {
                field: "sender_contact_method",
                kind: "text"
            })
        );
    }

    #[test]
    fn parse_message_text_requires_status() {
        let mut value = text_value();
        value.as_object_mut().unwrap().remove("delivery_status");
        assert_eq!(
            message_from_value(value),
            Err(MalformedMessage::MissingField {
                field: "delivery_status",
                kind: "text"
            })
        );
    }

    #[test]
    fn parse_message_rejects_unknown_status() {
        let mut value = text_value();
        value["delivery_status"] = json!("delivered");
        assert!(matches!(
            message_from_value(value),
            Err(MalformedMessage::InvalidValue {
                field: "delivery_status",
                ..
            })
        ));
    }

    #[test]
    fn ongoing_variant_only_for_transfers() {
        let mut value = text_value();
        value["delivery_status"] = json!("ongoing:connecting");
        assert!(message_from_value(value).is_err());

        let transfer = json!({
            "id": "2",
            "type": "data_transfer",
            "direction": "out",
            "sender_contact_method": "me",
            "timestamp": 10,
            "delivery_status": "ongoing:connecting",
            "text": "/tmp/a.bin",
            "progress": 5,
            "totalSize": 10
        });
        let msg = message_from_value(transfer).expect("transfer with ongoing variant");
        assert!(msg.status().is_ongoing());
        assert_eq!(msg.progress(), Some(TransferProgress::new(5, 10)));
    }

    #[test]
    fn transfer_progress_requires_both_counts() {
        let transfer = json!({
            "id": "2",
            "type": "data_transfer",
            "direction": "in",
            "sender_contact_method": "peer",
            "timestamp": 10,
            "delivery_status": "ongoing",
            "text": "a.bin",
            "progress": 5
        });
        assert_eq!(
            message_from_value(transfer),
            Err(MalformedMessage::MissingField {
                field: "totalSize",
                kind: "data_transfer"
            })
        );
    }

    #[test]
    fn call_does_not_require_sender_or_status() {
        let call = json!({
            "id": "9",
            "type": "call",
            "direction": "in",
            "timestamp": 10,
            "text": "🕽 Missed incoming call"
        });
        let msg = message_from_value(call).expect("call notice");
        assert!(msg.is_generated());
        assert_eq!(msg.sender(), None);
        assert_eq!(msg.status(), &DeliveryStatus::Unknown);
    }

    #[test]
    fn parse_message_rejects_invalid_json() {
        assert!(matches!(
            parse_message("{not json"),
            Err(MalformedMessage::InvalidJson { .. })
        ));
    }

    #[test]
    fn parse_history_keeps_order() {
        let raw = json!([
            {"id": 1, "type": "text", "direction": "in", "sender": "a", "timestamp": 1, "delivery_status": "read", "text": "one"},
            {"id": 2, "type": "contact", "direction": "in", "timestamp": 2, "text": "Contact added"},
            {"id": 3, "type": "text", "direction": "out", "sender": "me", "timestamp": 3, "delivery_status": "sent", "text": "three"}
        ])
        .to_string();
        let history = parse_history(&raw).expect("valid history");
        let ids: Vec<&str> = history.iter().map(|m| m.id().as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn parse_history_rejects_first_malformed_element() {
        let raw = json!([
            {"id": 1, "type": "text", "direction": "in", "sender": "a", "timestamp": 1, "delivery_status": "read", "text": "one"},
            {"id": 2, "type": "text", "direction": "sideways", "sender": "a", "timestamp": 2, "delivery_status": "read", "text": "two"}
        ])
        .to_string();
        assert!(matches!(
            parse_history(&raw),
            Err(MalformedMessage::InvalidValue {
                field: "direction",
                ..
            })
        ));
    }

    #[test]
    fn avatar_decodes_base64() {
        let avatar = avatar_from_value(json!({"sender": "ring:abcd", "sender_image": "aGVsbG8="}))
            .expect("valid avatar");
        assert_eq!(avatar.sender().as_str(), "ring:abcd");
        assert_eq!(avatar.image(), b"hello");
    }

    #[test]
    fn avatar_rejects_invalid_base64() {
        let err = avatar_from_value(json!({"sender": "ring:abcd", "sender_image": "%%%"}))
            .expect_err("invalid base64");
        assert!(matches!(err, MalformedMessage::InvalidAvatar { .. }));
    }
}
