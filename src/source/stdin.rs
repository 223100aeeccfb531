//! Stdin command feed for a host piping commands in.
//!
//! Reading stdin blocks, so a background thread owns the reader and hands
//! lines to the event loop over a channel.

use crate::model::error::InputError;
use crate::source::trim_line_ending;
use std::io::{self, BufRead, BufReader, IsTerminal, Read};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

#[derive(Debug)]
enum Chunk {
    Line(Vec<u8>),
    Failed(io::Error),
}

/// Line feed read on a background thread.
///
/// Lines are handed over as raw bytes; decoding is the caller's concern, so
/// a line that is not UTF-8 does not stop the feed. `poll` never blocks. Once the reader hits EOF (or fails) the source is
/// complete and later polls return nothing.
#[derive(Debug)]
pub struct StdinSource {
    rx: Receiver<Chunk>,
    failure: Option<io::Error>,
    complete: bool,
}

impl StdinSource {
    /// Feed from the process's stdin.
    ///
    /// # Errors
    ///
    /// Returns `InputError::NoInput` if stdin is an interactive terminal, so
    /// the viewer does not sit waiting on keystrokes meant for the UI.
    pub fn new() -> Result<Self, InputError> {
        let stdin = io::stdin();
        if stdin.is_terminal() {
            return Err(InputError::NoInput);
        }
        Ok(Self::from_reader(stdin))
    }

    /// Feed from any reader.
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut reader = BufReader::new(reader);
            let mut buffer = Vec::new();
            loop {
                let (chunk, stop) = match reader.read_until(b'\n', &mut buffer) {
                    Ok(0) => break,
                    Ok(_) => {
                        let line = trim_line_ending(std::mem::take(&mut buffer));
                        (Chunk::Line(line), false)
                    }
                    Err(e) => (Chunk::Failed(e), true),
                };
                if tx.send(chunk).is_err() || stop {
                    break;
                }
            }
        });
        Self {
            rx,
            failure: None,
            complete: false,
        }
    }

    /// Raw lines received since the last poll.
    ///
    /// # Errors
    ///
    /// Returns `InputError::Io` once the reader fails. Lines read before the
    /// failure are returned first; the error comes on the following poll.
    pub fn poll(&mut self) -> Result<Vec<Vec<u8>>, InputError> {
        if let Some(e) = self.failure.take() {
            return Err(e.into());
        }
        let mut lines = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(Chunk::Line(line)) => lines.push(line),
                Ok(Chunk::Failed(e)) => {
                    self.complete = true;
                    if lines.is_empty() {
                        return Err(e.into());
                    }
                    self.failure = Some(e);
                    break;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.complete = true;
                    break;
                }
            }
        }
        Ok(lines)
    }

    /// EOF reached; no more data will arrive.
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}
