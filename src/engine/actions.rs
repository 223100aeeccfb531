//! Declarative node -> action table.
//!
//! Every materialized node has a list of actions the user may trigger on it.
//! The list is re-derived whenever the node changes and dispatch goes through
//! a single lookup instead of per-node handlers.

use crate::engine::node::{NodeContent, RenderNode};
use crate::model::{DeliveryStatus, Direction, MessageId, MessageType, ViewError};
use std::collections::HashMap;
use std::fmt;

/// User-facing action on one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Delete,
    Retry,
    Accept,
    Refuse,
    OpenFile,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Retry => "retry",
            Self::Accept => "accept",
            Self::Refuse => "refuse",
            Self::OpenFile => "open file",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound request to the host. Fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAction {
    AcceptFile(MessageId),
    RefuseFile(MessageId),
    DeleteInteraction(MessageId),
    RetryInteraction(MessageId),
    OpenFile(String),
    SendMessage(String),
    SendFile(String),
}

/// Textual command form, e.g. `ACCEPT_FILE:42`.
impl fmt::Display for HostAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcceptFile(id) => write!(f, "ACCEPT_FILE:{id}"),
            Self::RefuseFile(id) => write!(f, "REFUSE_FILE:{id}"),
            Self::DeleteInteraction(id) => write!(f, "DELETE_INTERACTION:{id}"),
            Self::RetryInteraction(id) => write!(f, "RETRY_INTERACTION:{id}"),
            Self::OpenFile(path) => write!(f, "OPEN_FILE:{path}"),
            Self::SendMessage(text) => write!(f, "SEND_MESSAGE:{text}"),
            Self::SendFile(path) => write!(f, "SEND_FILE:{path}"),
        }
    }
}

/// Actions a node currently offers, in display order.
pub fn available_actions(node: &RenderNode) -> Vec<(ActionKind, HostAction)> {
    let message = node.message();
    let id = message.id();
    let status = message.status();
    let mut actions = Vec::new();

    if message.kind() == MessageType::DataTransfer {
        let awaiting = status.is_awaiting();
        if awaiting && message.direction() == Direction::In {
            actions.push((ActionKind::Accept, HostAction::AcceptFile(id.clone())));
        }
        if awaiting || status.is_ongoing() {
            actions.push((ActionKind::Refuse, HostAction::RefuseFile(id.clone())));
        }
        if matches!(node.content(), NodeContent::File(_)) || status == &DeliveryStatus::Finished {
            actions.push((
                ActionKind::OpenFile,
                HostAction::OpenFile(message.body().to_string()),
            ));
        }
    }
    if status.is_error() && message.direction() == Direction::Out {
        actions.push((ActionKind::Retry, HostAction::RetryInteraction(id.clone())));
    }
    actions.push((ActionKind::Delete, HostAction::DeleteInteraction(id.clone())));
    actions
}

#[derive(Debug, Default, Clone)]
pub struct ActionTable {
    entries: HashMap<MessageId, Vec<(ActionKind, HostAction)>>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-derive the entry of `node`.
    pub fn sync(&mut self, node: &RenderNode) {
        self.entries
            .insert(node.id().clone(), available_actions(node));
    }

    pub fn remove(&mut self, id: &MessageId) {
        self.entries.remove(id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn kinds(&self, id: &MessageId) -> Vec<ActionKind> {
        self.entries
            .get(id)
            .map(|actions| actions.iter().map(|(kind, _)| *kind).collect())
            .unwrap_or_default()
    }

    /// Host action bound to `kind` on `id`.
    pub fn resolve(&self, id: &MessageId, kind: ActionKind) -> Result<HostAction, ViewError> {
        let actions = self
            .entries
            .get(id)
            .ok_or_else(|| ViewError::UnknownInteraction { id: id.clone() })?;
        actions
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, action)| action.clone())
            .ok_or_else(|| ViewError::ActionUnavailable {
                id: id.clone(),
                kind: kind.to_string(),
            })
    }
}
