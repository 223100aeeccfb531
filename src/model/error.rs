//! Error types for chatview.
//!
//! This module defines a hierarchical error taxonomy using `thiserror` for structured error
//! handling. Errors compose via `?` and `From` conversions.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level application error wrapping all domain-specific failures
//!   - [`InputError`] - History file / command channel reading failures
//!   - [`MalformedMessage`] - Host objects that violate the message contract
//!   - `std::io::Error` - Terminal/TUI rendering failures
//! - [`ViewError`] - Recoverable contract violations raised by the view orchestrator
//!
//! # Error Recovery Strategy
//!
//! Contract violations (`ViewError`) are **non-fatal**: the offending call is a no-op, a
//! diagnostic is logged, and no other node is touched. Malformed host objects are rejected
//! at the boundary and never reach the engine. Input and terminal errors are fatal and
//! propagate to the top-level error handler.

use crate::model::MessageId;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error encompassing all failure modes.
///
/// # Examples
///
/// ```no_run
/// use chatview::model::error::{AppError, InputError};
///
/// fn run_app() -> Result<(), AppError> {
///     // InputError automatically converts to AppError via From
///     let _history = read_history()?;
///     Ok(())
/// }
/// # fn read_history() -> Result<(), InputError> { Ok(()) }
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to read the history file or the command channel.
    ///
    /// **Recovery**: Display error to user and exit gracefully.
    #[error("Failed to read input: {0}")]
    InputRead(#[from] InputError),

    /// A host object could not be turned into a message.
    ///
    /// Raised for the initial history only; malformed live commands are logged and skipped.
    #[error("Malformed message: {0}")]
    Malformed(#[from] MalformedMessage),

    /// Terminal or TUI rendering error.
    ///
    /// **Recovery**: Attempt graceful terminal cleanup, then exit.
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

/// Errors encountered when reading history or host commands.
#[derive(Debug, Error)]
pub enum InputError {
    /// The specified file does not exist at the given path.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use chatview::model::error::InputError;
    ///
    /// let err = InputError::FileNotFound {
    ///     path: PathBuf::from("/tmp/missing.json")
    /// };
    /// assert!(err.to_string().contains("/tmp/missing.json"));
    /// ```
    #[error("File not found: {path}")]
    FileNotFound {
        /// The filesystem path that was not found.
        path: PathBuf,
    },

    /// Commands were requested from stdin but stdin is an interactive terminal.
    #[error("No input source: provide a command file or pipe commands to stdin")]
    NoInput,

    /// A command line could not be decoded.
    #[error("Invalid command at line {line}: {source}")]
    Command {
        /// 1-based line number in the command stream.
        line: usize,
        /// What was wrong with the embedded message.
        #[source]
        source: MalformedMessage,
    },

    /// Generic I/O error reading from input source.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A host object that violates the message contract.
///
/// The core never guesses missing fields: anything that would need a guess is rejected
/// here, at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedMessage {
    /// Syntactically invalid JSON.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatview::model::error::MalformedMessage;
    ///
    /// let err = MalformedMessage::InvalidJson {
    ///     message: "EOF while parsing an object".to_string()
    /// };
    /// assert!(err.to_string().contains("EOF while parsing"));
    /// ```
    #[error("Invalid JSON: {message}")]
    InvalidJson {
        /// Parser error message from `serde_json`.
        message: String,
    },

    /// A command line that is not UTF-8.
    #[error("Invalid UTF-8 after {valid_up_to} bytes")]
    InvalidEncoding {
        /// Length of the valid prefix.
        valid_up_to: usize,
    },

    /// A field required for the message type is absent.
    #[error("Missing required field '{field}' for {kind} message")]
    MissingField {
        /// Wire name of the missing field.
        field: &'static str,
        /// Wire name of the message type (or `"message"` before the type is known).
        kind: &'static str,
    },

    /// A field is present but holds a value outside its domain.
    #[error("Invalid value for '{field}': {value:?}")]
    InvalidValue {
        /// Wire name of the field.
        field: &'static str,
        /// Offending raw value.
        value: String,
    },

    /// Timestamp outside the representable range.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(i64),

    /// Avatar image is not valid base64.
    #[error("Invalid avatar image for sender {sender}: {reason}")]
    InvalidAvatar {
        /// Sender the avatar was meant for.
        sender: String,
        /// Decoder error.
        reason: String,
    },
}

/// Recoverable contract violations raised by `ChatView` operations.
///
/// Returned to the caller and logged; the view state is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    /// `update_message`, `remove_interaction` or an action targeted an id that is not
    /// materialized.
    #[error("No materialized interaction with id {id}")]
    UnknownInteraction {
        /// The id that was looked up.
        id: MessageId,
    },

    /// An action was dispatched for a node that does not currently offer it.
    #[error("Action {kind} is not available for interaction {id}")]
    ActionUnavailable {
        /// Target node.
        id: MessageId,
        /// Requested action (display name).
        kind: String,
    },
}
