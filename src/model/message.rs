//! Message types for conversation interactions.
//!
//! A `Message` is the immutable-per-update description of one conversation
//! entry as supplied by the host. The view never creates messages; it only
//! materializes, updates and removes their render nodes.

use crate::model::{MessageId, SenderId};
use chrono::{DateTime, Utc};
use std::fmt;

// ===== MessageType =====

/// Kind of interaction carried by a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// User-authored text
    Text,
    /// File transfer (text holds a path or URL)
    DataTransfer,
    /// Synthesized call notice
    Call,
    /// Synthesized contact notice
    Contact,
}

impl MessageType {
    /// Parse the wire name of a message type.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "text" => Some(Self::Text),
            "data_transfer" => Some(Self::DataTransfer),
            "call" => Some(Self::Call),
            "contact" => Some(Self::Contact),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::DataTransfer => "data_transfer",
            Self::Call => "call",
            Self::Contact => "contact",
        }
    }

    /// Generated messages are system notices, never grouped with user content.
    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Call | Self::Contact)
    }

    /// Whether the interaction carries a sender avatar.
    pub fn needs_sender(&self) -> bool {
        matches!(self, Self::Text | Self::DataTransfer)
    }
}

// ===== Direction =====

/// Whether a message was received or sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "in" => Some(Self::In),
            "out" => Some(Self::Out),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

// ===== DeliveryStatus =====

/// Delivery status reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeliveryStatus {
    Sending,
    /// `ongoing`, or the transfer-only `ongoing:<progress-kind>` variants
    Ongoing(Option<String>),
    AwaitingPeer,
    AwaitingPeerTimeout,
    AwaitingHost,
    Sent,
    Finished,
    Failure,
    Canceled,
    UnjoinablePeer,
    Read,
    Unknown,
}

impl DeliveryStatus {
    /// Parse the wire representation of a status.
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(kind) = raw.strip_prefix("ongoing:") {
            return Some(Self::Ongoing(Some(kind.to_string())));
        }
        let status = match raw {
            "sending" => Self::Sending,
            "ongoing" => Self::Ongoing(None),
            "awaiting peer" => Self::AwaitingPeer,
            "awaiting peer timeout" => Self::AwaitingPeerTimeout,
            "awaiting host" => Self::AwaitingHost,
            "sent" => Self::Sent,
            "finished" => Self::Finished,
            "failure" => Self::Failure,
            "canceled" => Self::Canceled,
            "unjoinable peer" => Self::UnjoinablePeer,
            "read" => Self::Read,
            "unknown" => Self::Unknown,
            _ => return None,
        };
        Some(status)
    }

    /// Statuses that end a transfer or message unsuccessfully.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Failure | Self::AwaitingPeerTimeout | Self::Canceled | Self::UnjoinablePeer
        )
    }

    pub fn is_ongoing(&self) -> bool {
        matches!(self, Self::Ongoing(_))
    }

    /// Waiting for one side to accept the transfer.
    pub fn is_awaiting(&self) -> bool {
        matches!(self, Self::AwaitingPeer | Self::AwaitingHost)
    }

    /// Message is still on its way out.
    pub fn is_sending(&self) -> bool {
        matches!(self, Self::Sending | Self::Ongoing(_))
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sending => f.write_str("sending"),
            Self::Ongoing(None) => f.write_str("ongoing"),
            Self::Ongoing(Some(kind)) => write!(f, "ongoing:{kind}"),
            Self::AwaitingPeer => f.write_str("awaiting peer"),
            Self::AwaitingPeerTimeout => f.write_str("awaiting peer timeout"),
            Self::AwaitingHost => f.write_str("awaiting host"),
            Self::Sent => f.write_str("sent"),
            Self::Finished => f.write_str("finished"),
            Self::Failure => f.write_str("failure"),
            Self::Canceled => f.write_str("canceled"),
            Self::UnjoinablePeer => f.write_str("unjoinable peer"),
            Self::Read => f.write_str("read"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

// ===== TransferProgress =====

/// Byte counts of a file transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferProgress {
    pub progress: u64,
    pub total_size: u64,
}

impl TransferProgress {
    pub fn new(progress: u64, total_size: u64) -> Self {
        Self {
            progress,
            total_size,
        }
    }

    /// Completion percentage, `None` when the total is unknown.
    pub fn percent(&self) -> Option<f64> {
        if self.total_size == 0 {
            return None;
        }
        Some(100.0 * self.progress as f64 / self.total_size as f64)
    }
}

// ===== Message =====

/// One conversation entry.
///
/// Build through the per-type constructors; the parser is the only place
/// where raw host objects become messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    kind: MessageType,
    direction: Direction,
    sender: Option<SenderId>,
    timestamp: DateTime<Utc>,
    status: DeliveryStatus,
    text: String,
    progress: Option<TransferProgress>,
}

impl Message {
    /// Text message authored by `sender`.
    pub fn text(
        id: MessageId,
        direction: Direction,
        sender: SenderId,
        timestamp: DateTime<Utc>,
        status: DeliveryStatus,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind: MessageType::Text,
            direction,
            sender: Some(sender),
            timestamp,
            status,
            text: body.into(),
            progress: None,
        }
    }

    /// File transfer; `path` is the local path or URL of the file.
    pub fn transfer(
        id: MessageId,
        direction: Direction,
        sender: SenderId,
        timestamp: DateTime<Utc>,
        status: DeliveryStatus,
        path: impl Into<String>,
        progress: Option<TransferProgress>,
    ) -> Self {
        Self {
            id,
            kind: MessageType::DataTransfer,
            direction,
            sender: Some(sender),
            timestamp,
            status,
            text: path.into(),
            progress,
        }
    }

    /// Call notice, e.g. `"🕽 Missed incoming call"`.
    pub fn call(
        id: MessageId,
        direction: Direction,
        timestamp: DateTime<Utc>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind: MessageType::Call,
            direction,
            sender: None,
            timestamp,
            status: DeliveryStatus::Unknown,
            text: description.into(),
            progress: None,
        }
    }

    /// Contact notice, e.g. `"Contact added"`.
    pub fn contact(
        id: MessageId,
        direction: Direction,
        timestamp: DateTime<Utc>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind: MessageType::Contact,
            direction,
            sender: None,
            timestamp,
            status: DeliveryStatus::Unknown,
            text: description.into(),
            progress: None,
        }
    }

    /// Replace the delivery status (host updates).
    pub fn with_status(mut self, status: DeliveryStatus) -> Self {
        self.status = status;
        self
    }

    /// Replace the transfer byte counts.
    pub fn with_progress(mut self, progress: Option<TransferProgress>) -> Self {
        self.progress = progress;
        self
    }

    /// Replace the sender of a call/contact notice.
    pub fn with_sender(mut self, sender: Option<SenderId>) -> Self {
        self.sender = sender;
        self
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn kind(&self) -> MessageType {
        self.kind
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn sender(&self) -> Option<&SenderId> {
        self.sender.as_ref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn status(&self) -> &DeliveryStatus {
        &self.status
    }

    /// Body for text, path/URL for transfers, description for notices.
    pub fn body(&self) -> &str {
        &self.text
    }

    pub fn progress(&self) -> Option<TransferProgress> {
        self.progress
    }

    pub fn is_generated(&self) -> bool {
        self.kind.is_generated()
    }
}
