//! Domain model types (pure).
//!
//! All types in this module are pure data with smart constructors.

pub mod avatar;
pub mod error;
pub mod identifiers;
pub mod message;

// Re-export for convenience
pub use avatar::SenderAvatar;
pub use error::{AppError, InputError, MalformedMessage, ViewError};
pub use identifiers::{InvalidMessageId, InvalidSenderId, MessageId, SenderId};
pub use message::{DeliveryStatus, Direction, Message, MessageType, TransferProgress};
