//! Sender avatar images.

use crate::model::SenderId;

/// Decoded avatar image keyed by the sender it belongs to.
///
/// Setting a new avatar for a sender replaces any prior one; every node
/// authored by that sender resolves its avatar through this key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderAvatar {
    sender: SenderId,
    image: Vec<u8>,
}

impl SenderAvatar {
    pub fn new(sender: SenderId, image: Vec<u8>) -> Self {
        Self { sender, image }
    }

    pub fn sender(&self) -> &SenderId {
        &self.sender
    }

    /// Raw image bytes (PNG as supplied by the host).
    pub fn image(&self) -> &[u8] {
        &self.image
    }
}
