//! File-backed input: the history document and a tailed command file.

use crate::model::error::{AppError, InputError};
use crate::model::Message;
use crate::parser;
use crate::source::trim_line_ending;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Read and parse a history file (a JSON array of messages, oldest first).
///
/// # Errors
///
/// `InputError::FileNotFound` for a missing file, `InputError::Io` when
/// reading fails, and `AppError::Malformed` for the first invalid element.
pub fn load_history(path: impl AsRef<Path>) -> Result<Vec<Message>, AppError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(InputError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    let raw = std::fs::read_to_string(path).map_err(InputError::from)?;
    let messages = parser::parse_history(&raw)?;
    tracing::info!(path = %path.display(), count = messages.len(), "Loaded history");
    Ok(messages)
}

/// Command file followed from the start as the host appends to it.
///
/// Only newline-terminated lines are returned; a trailing partial line is
/// picked up once the host finishes writing it.
#[derive(Debug)]
pub struct CommandFile {
    path: PathBuf,
    position: u64,
    file: BufReader<File>,
}

impl CommandFile {
    /// # Errors
    ///
    /// Returns `InputError::FileNotFound` if the file does not exist.
    /// Returns `InputError::Io` for other I/O errors.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(InputError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let file = BufReader::new(File::open(path)?);
        Ok(Self {
            path: path.to_path_buf(),
            position: 0,
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw lines appended since the last call, line endings stripped.
    ///
    /// Lines are not decoded here: a line that is not UTF-8 is still consumed
    /// so the next call starts after it.
    ///
    /// # Errors
    ///
    /// Returns `InputError::Io` if seeking or reading fails.
    pub fn read_new_lines(&mut self) -> Result<Vec<Vec<u8>>, InputError> {
        self.file.seek(SeekFrom::Start(self.position))?;

        let mut lines = Vec::new();
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            let bytes_read = self.file.read_until(b'\n', &mut buffer)?;
            if bytes_read == 0 || buffer.last() != Some(&b'\n') {
                break;
            }
            self.position += bytes_read as u64;
            lines.push(trim_line_ending(std::mem::take(&mut buffer)));
        }
        Ok(lines)
    }
}
