//! Join counter over outstanding media loads.
//!
//! A load is registered with [`CompletionGate::track`] before it starts and
//! reported with [`CompletionGate::settle`] when it finishes, successfully or
//! not. The settle that brings the count back to zero reports a drain, once.
//! Nothing is called back from here: the caller reacts to the returned
//! [`Settle`], so tracking more loads while handling a drain simply re-arms
//! the gate.

use std::collections::HashSet;

/// Handle for one tracked load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Outcome of settling a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// Other loads are still outstanding.
    Pending,
    /// This settle drained the gate. `epoch` counts drains since creation.
    Drained { epoch: u64 },
    /// The ticket was never issued or was already settled.
    Unknown,
}

#[derive(Debug, Default)]
pub struct CompletionGate {
    next_ticket: u64,
    outstanding: HashSet<LoadTicket>,
    epoch: u64,
}

impl CompletionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a load about to start.
    pub fn track(&mut self) -> LoadTicket {
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;
        self.outstanding.insert(ticket);
        ticket
    }

    /// Report completion of a tracked load.
    pub fn settle(&mut self, ticket: LoadTicket) -> Settle {
        if !self.outstanding.remove(&ticket) {
            return Settle::Unknown;
        }
        if self.outstanding.is_empty() {
            self.epoch += 1;
            tracing::debug!(epoch = self.epoch, "Media loads drained");
            Settle::Drained { epoch: self.epoch }
        } else {
            Settle::Pending
        }
    }

    pub fn pending(&self) -> usize {
        self.outstanding.len()
    }

    pub fn is_idle(&self) -> bool {
        self.outstanding.is_empty()
    }

    /// Number of drains observed so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}
