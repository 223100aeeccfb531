//! Host commands: one JSON object per line, tagged by `"command"`.
//!
//! ```text
//! {"command":"print_history","messages":[{...}, ...]}
//! {"command":"add","message":{...}}
//! {"command":"update","message":{...}}
//! {"command":"remove","id":"42"}
//! {"command":"avatar","sender":"alice","sender_image":"<base64>"}
//! {"command":"clear"}
//! {"command":"display_links","enabled":false}
//! ```

use crate::engine::ChatView;
use crate::model::{MalformedMessage, Message, MessageId, SenderAvatar, ViewError};
use crate::parser;
use serde::Deserialize;
use serde_json::{Map, Value};

/// A decoded host call, ready to apply to a [`ChatView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    PrintHistory(Vec<Message>),
    Add(Message),
    Update(Message),
    Remove(MessageId),
    Avatar(SenderAvatar),
    Clear,
    DisplayLinks(bool),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum RawCommand {
    PrintHistory {
        messages: Vec<Value>,
    },
    Add {
        message: Value,
    },
    Update {
        message: Value,
    },
    Remove {
        id: Value,
    },
    Avatar {
        #[serde(flatten)]
        avatar: Map<String, Value>,
    },
    Clear,
    DisplayLinks {
        enabled: bool,
    },
}

impl HostCommand {
    /// Wire name, as it appears in the `"command"` field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PrintHistory(_) => "print_history",
            Self::Add(_) => "add",
            Self::Update(_) => "update",
            Self::Remove(_) => "remove",
            Self::Avatar(_) => "avatar",
            Self::Clear => "clear",
            Self::DisplayLinks(_) => "display_links",
        }
    }

    /// Forward the call to the view.
    ///
    /// # Errors
    ///
    /// `update` and `remove` of an id that is not materialized.
    pub fn apply(self, view: &mut ChatView) -> Result<(), ViewError> {
        match self {
            Self::PrintHistory(messages) => view.print_history(messages),
            Self::Add(message) => view.add_message(message),
            Self::Update(message) => view.update_message(message)?,
            Self::Remove(id) => view.remove_interaction(&id)?,
            Self::Avatar(avatar) => view.set_sender_avatar(avatar),
            Self::Clear => view.clear_messages(),
            Self::DisplayLinks(enabled) => view.set_display_links(enabled),
        }
        Ok(())
    }
}

/// Decode one command line.
///
/// # Errors
///
/// Invalid JSON, an unknown command, or an embedded object that violates the
/// message contract.
pub fn parse_command(line: &str) -> Result<HostCommand, MalformedMessage> {
    let raw: RawCommand =
        serde_json::from_str(line).map_err(|e| MalformedMessage::InvalidJson {
            message: e.to_string(),
        })?;
    Ok(match raw {
        RawCommand::PrintHistory { messages } => {
            HostCommand::PrintHistory(parser::history_from_values(messages)?)
        }
        RawCommand::Add { message } => HostCommand::Add(parser::message_from_value(message)?),
        RawCommand::Update { message } => {
            HostCommand::Update(parser::message_from_value(message)?)
        }
        RawCommand::Remove { id } => HostCommand::Remove(id_from_value(id)?),
        RawCommand::Avatar { avatar } => {
            HostCommand::Avatar(parser::avatar_from_value(Value::Object(avatar))?)
        }
        RawCommand::Clear => HostCommand::Clear,
        RawCommand::DisplayLinks { enabled } => HostCommand::DisplayLinks(enabled),
    })
}

fn id_from_value(value: Value) -> Result<MessageId, MalformedMessage> {
    let raw = match value {
        Value::String(s) => s,
        Value::Number(n) if n.is_u64() => n.to_string(),
        other => {
            return Err(MalformedMessage::InvalidValue {
                field: "id",
                value: other.to_string(),
            })
        }
    };
    MessageId::new(raw.as_str()).map_err(|_| MalformedMessage::InvalidValue {
        field: "id",
        value: raw,
    })
}
