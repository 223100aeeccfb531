//! Host input: the history document and the live command channel.
//!
//! - [`file::load_history`] reads the JSON array handed to `print_history`
//! - [`CommandSource`] yields [`HostCommand`]s from a tailed file or stdin

use crate::model::error::{InputError, MalformedMessage};
use std::path::{Path, PathBuf};

pub mod command;
pub mod file;
pub mod stdin;

pub use command::{parse_command, HostCommand};
pub use file::{load_history, CommandFile};
pub use stdin::StdinSource;

/// Command-line value that selects stdin as the command channel.
pub const STDIN_MARKER: &str = "-";

/// Unified command channel.
#[derive(Debug)]
pub struct CommandSource {
    input: Input,
    /// Lines consumed so far, for 1-based diagnostics.
    line: usize,
}

#[derive(Debug)]
enum Input {
    /// Followed for the whole session
    File(CommandFile),
    /// Piped commands until EOF
    Stdin(StdinSource),
}

impl CommandSource {
    pub fn file(file: CommandFile) -> Self {
        Self::from_input(Input::File(file))
    }

    pub fn stdin(stdin: StdinSource) -> Self {
        Self::from_input(Input::Stdin(stdin))
    }

    fn from_input(input: Input) -> Self {
        Self { input, line: 0 }
    }

    /// Commands that arrived since the last poll. Non-blocking.
    ///
    /// Blank lines are skipped. A malformed line (bad UTF-8 included) is
    /// logged and skipped without affecting the lines around it.
    ///
    /// # Errors
    ///
    /// Returns `InputError` when the underlying reader fails.
    pub fn poll(&mut self) -> Result<Vec<HostCommand>, InputError> {
        let lines = match &mut self.input {
            Input::File(f) => f.read_new_lines()?,
            Input::Stdin(s) => s.poll()?,
        };

        let mut commands = Vec::with_capacity(lines.len());
        for raw in lines {
            self.line += 1;
            let parsed = String::from_utf8(raw)
                .map_err(|e| MalformedMessage::InvalidEncoding {
                    valid_up_to: e.utf8_error().valid_up_to(),
                })
                .and_then(|raw| {
                    if raw.trim().is_empty() {
                        Ok(None)
                    } else {
                        parse_command(&raw).map(Some)
                    }
                });
            match parsed {
                Ok(None) => {}
                Ok(Some(command)) => commands.push(command),
                Err(source) => {
                    let err = InputError::Command {
                        line: self.line,
                        source,
                    };
                    tracing::warn!(error = %err, "Skipping host command");
                }
            }
        }
        Ok(commands)
    }

    /// Whether more commands can still arrive.
    ///
    /// # Behavior:
    /// - File: always true (the host may append at any time)
    /// - Stdin: true until EOF is reached
    pub fn is_live(&self) -> bool {
        match &self.input {
            Input::File(_) => true,
            Input::Stdin(s) => !s.is_complete(),
        }
    }

    pub fn lines_read(&self) -> usize {
        self.line
    }
}

/// Strip a trailing `\n` or `\r\n`.
pub(crate) fn trim_line_ending(mut line: Vec<u8>) -> Vec<u8> {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
    line
}

/// Open the command channel named on the command line.
///
/// `None` means no live commands; [`STDIN_MARKER`] reads stdin; anything else
/// is a file path.
///
/// # Errors
///
/// Returns `InputError::NoInput` for `-` when stdin is a terminal.
/// Returns `InputError::FileNotFound` if the file does not exist.
pub fn detect_command_source(arg: Option<&Path>) -> Result<Option<CommandSource>, InputError> {
    match arg {
        None => Ok(None),
        Some(path) if path == Path::new(STDIN_MARKER) => {
            Ok(Some(CommandSource::stdin(StdinSource::new()?)))
        }
        Some(path) => Ok(Some(CommandSource::file(CommandFile::open(path)?))),
    }
}

/// Convenience wrapper for an owned path argument.
pub fn open_commands(arg: Option<PathBuf>) -> Result<Option<CommandSource>, InputError> {
    detect_command_source(arg.as_deref())
}
