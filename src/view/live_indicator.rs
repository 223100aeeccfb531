//! Command channel indicator for the status bar.
//!
//! - Nothing when the viewer runs without a command channel
//! - Green `[LIVE]` while commands can still arrive
//! - Gray `[EOF]` once a piped channel has closed

use ratatui::{
    style::{Color, Style},
    text::Span,
};

/// State of the host command channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// History only.
    Static,
    Live,
    Closed,
}

impl ChannelState {
    pub fn from_source(source: Option<&crate::source::CommandSource>) -> Self {
        match source {
            None => Self::Static,
            Some(s) if s.is_live() => Self::Live,
            Some(_) => Self::Closed,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LiveIndicator {
    state: ChannelState,
}

impl LiveIndicator {
    pub fn new(state: ChannelState) -> Self {
        Self { state }
    }

    pub fn render(&self) -> Span<'static> {
        match self.state {
            ChannelState::Static => Span::raw(""),
            ChannelState::Live => Span::styled("[LIVE] ", Style::default().fg(Color::Green)),
            ChannelState::Closed => Span::styled("[EOF] ", Style::default().fg(Color::Gray)),
        }
    }
}

#[cfg(test)]
#[path = "live_indicator_tests.rs"]
mod tests;
