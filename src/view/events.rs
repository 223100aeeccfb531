//! Host-bound events leave the viewer through here.
//!
//! Every event is logged. With `--events` each one is also written as a line
//! of text (`MESSAGES_LOADED`, `DELETE_INTERACTION:42`, ...) for the host to
//! read back.

use crate::engine::{HostEvent, HostSink};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

pub struct EventLog {
    out: Option<Box<dyn Write>>,
    emitted: usize,
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("writes", &self.out.is_some())
            .field("emitted", &self.emitted)
            .finish()
    }
}

impl EventLog {
    /// Log only.
    pub fn new() -> Self {
        Self {
            out: None,
            emitted: 0,
        }
    }

    pub fn with_writer(out: impl Write + 'static) -> Self {
        Self {
            out: Some(Box::new(out)),
            emitted: 0,
        }
    }

    /// Append to `path`, creating it if needed.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::with_writer(file))
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl HostSink for EventLog {
    fn emit(&mut self, event: HostEvent) {
        self.emitted += 1;
        tracing::info!(%event, "Host event");
        if let Some(out) = self.out.as_mut() {
            if let Err(e) = writeln!(out, "{event}").and_then(|()| out.flush()) {
                tracing::warn!(error = %e, "Dropping event writer");
                self.out = None;
            }
        }
    }
}
