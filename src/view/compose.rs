//! Compose box: type a message (or `/file <path>`) and hand it to the host.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Prefix that turns a composed line into a file send.
pub const FILE_PREFIX: &str = "/file ";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ComposeState {
    #[default]
    Closed,
    /// `cursor` counts chars, not bytes.
    Typing { text: String, cursor: usize },
}

/// What submitting the box asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Message(String),
    File(String),
}

impl ComposeState {
    pub fn open() -> Self {
        Self::Typing {
            text: String::new(),
            cursor: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Typing { .. })
    }

    pub fn insert(&mut self, ch: char) {
        if let Self::Typing { text, cursor } = self {
            let at = byte_index(text, *cursor);
            text.insert(at, ch);
            *cursor += 1;
        }
    }

    pub fn backspace(&mut self) {
        if let Self::Typing { text, cursor } = self {
            if *cursor == 0 {
                return;
            }
            let at = byte_index(text, *cursor - 1);
            text.remove(at);
            *cursor -= 1;
        }
    }

    pub fn left(&mut self) {
        if let Self::Typing { cursor, .. } = self {
            *cursor = cursor.saturating_sub(1);
        }
    }

    pub fn right(&mut self) {
        if let Self::Typing { text, cursor } = self {
            *cursor = (*cursor + 1).min(text.chars().count());
        }
    }

    /// Close the box and return what was typed, if anything.
    pub fn submit(&mut self) -> Option<Submission> {
        let Self::Typing { text, .. } = std::mem::take(self) else {
            return None;
        };
        if let Some(path) = text.strip_prefix(FILE_PREFIX) {
            let path = path.trim();
            return (!path.is_empty()).then(|| Submission::File(path.to_string()));
        }
        (!text.trim().is_empty()).then_some(Submission::Message(text))
    }

    pub fn cancel(&mut self) {
        *self = Self::Closed;
    }
}

fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(index, _)| index)
}

pub struct ComposeInput<'a> {
    state: &'a ComposeState,
}

impl<'a> ComposeInput<'a> {
    pub fn new(state: &'a ComposeState) -> Self {
        Self { state }
    }
}

impl Widget for ComposeInput<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let ComposeState::Typing { text, cursor } = self.state else {
            return;
        };
        let before: String = text.chars().take(*cursor).collect();
        let mut after = text.chars().skip(*cursor);
        let under = after.next().map_or_else(|| " ".to_string(), String::from);
        let rest: String = after.collect();

        let line = Line::from(vec![
            Span::raw(before),
            Span::styled(
                under,
                Style::default()
                    .bg(Color::White)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(rest),
        ]);
        Paragraph::new(line)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Message (Enter to send, Esc to cancel)"),
            )
            .render(area, buf);
    }
}
