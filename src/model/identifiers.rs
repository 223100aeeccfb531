//! Core identifier newtypes with smart constructors.
//!
//! All identifiers validate non-empty strings at construction time.
//! Raw constructors are never exported - use smart constructors only.

use std::fmt;

/// Opaque identifier of one conversation interaction.
///
/// Stable for the lifetime of the message and unique across the whole
/// transcript (buffered + materialized).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(String);

impl MessageId {
    /// Smart constructor: validates non-empty id
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidMessageId> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InvalidMessageId::Empty);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Participant that authored a message (keys avatar rules).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SenderId(String);

impl SenderId {
    /// Smart constructor: validates non-empty sender id
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidSenderId> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InvalidSenderId::Empty);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ===== Error Types =====

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMessageId {
    #[error("Message ID cannot be empty")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidSenderId {
    #[error("Sender ID cannot be empty")]
    Empty,
}

// ===== Tests =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_accepts_numeric_string() {
        let id = MessageId::new("4021");
        assert!(id.is_ok(), "Numeric id should be accepted");
    }

    #[test]
    fn message_id_rejects_empty_string() {
        assert_eq!(MessageId::new(""), Err(InvalidMessageId::Empty));
    }

    #[test]
    fn message_id_display_returns_inner_string() {
        let id = MessageId::new("abc-1").expect("valid id");
        assert_eq!(id.to_string(), "abc-1");
        assert_eq!(id.as_str(), "abc-1");
    }

    #[test]
    fn sender_id_rejects_empty_string() {
        assert_eq!(SenderId::new(""), Err(InvalidSenderId::Empty));
    }

    #[test]
    fn sender_id_accepts_owned_string() {
        let sender = SenderId::new(String::from("ring:f00d")).expect("valid sender");
        assert_eq!(sender.as_str(), "ring:f00d");
    }
}
