//! Screen layout: transcript, optional compose box, status bar.

use crate::engine::{ChatView, ScrollSurface};
use crate::model::MessageId;
use crate::view::compose::{ComposeInput, ComposeState};
use crate::view::constants::{COMPOSE_HEIGHT, ROW_PX, STATUS_BAR_HEIGHT};
use crate::view::live_indicator::{ChannelState, LiveIndicator};
use crate::view::message::{node_lines, Decoration};
use crate::view::styles::NodeStyles;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    Frame,
};
use unicode_width::UnicodeWidthStr;

const LAZY_INDICATOR: &str = "… loading older messages";
const BACK_TO_BOTTOM: &str = "↓ newer messages (End) ";
const KEY_HINTS: &str = "↑↓ PgUp PgDn Home End · j/k focus · i compose · q quit ";

/// Everything drawn besides the engine state.
#[derive(Debug, Clone, Copy)]
pub struct Chrome<'a> {
    pub styles: &'a NodeStyles,
    pub focus: Option<&'a MessageId>,
    pub compose: &'a ComposeState,
    pub channel: ChannelState,
    pub notice: Option<&'a str>,
}

/// Areas of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Areas {
    pub transcript: Rect,
    pub compose: Option<Rect>,
    pub status: Rect,
}

pub fn split(area: Rect, composing: bool) -> Areas {
    let compose_height = if composing { COMPOSE_HEIGHT } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(compose_height),
            Constraint::Length(STATUS_BAR_HEIGHT),
        ])
        .split(area);
    Areas {
        transcript: chunks[0],
        compose: composing.then_some(chunks[1]),
        status: chunks[2],
    }
}

pub fn render(frame: &mut Frame, view: &ChatView, chrome: Chrome<'_>) {
    let areas = split(frame.area(), chrome.compose.is_open());
    render_transcript(frame, areas.transcript, view, &chrome);
    if let Some(area) = areas.compose {
        frame.render_widget(ComposeInput::new(chrome.compose), area);
    }
    render_status_bar(frame, areas.status, view, &chrome);
}

/// Draw the nodes intersecting the viewport, row by row.
fn render_transcript(frame: &mut Frame, area: Rect, view: &ChatView, chrome: &Chrome<'_>) {
    let row_px = i64::from(ROW_PX);
    let scroll_row = i64::from(view.scroll_top()) / row_px;
    if view.shows_lazy_indicator() {
        let line =
            Line::styled(LAZY_INDICATOR, chrome.styles.indicator).alignment(Alignment::Center);
        put_row(frame, area, -scroll_row, line);
    }

    for visible in view.visible_nodes() {
        let node = visible.node;
        let decoration = Decoration {
            focused: chrome.focus == Some(node.id()),
            has_avatar: node
                .message()
                .sender()
                .is_some_and(|sender| view.avatar(sender).is_some()),
        };
        let first_row = visible.top.div_euclid(row_px);
        for (offset, line) in node_lines(node, area.width, chrome.styles, decoration)
            .into_iter()
            .enumerate()
        {
            put_row(frame, area, first_row + offset as i64, line);
        }
    }

    if view.back_to_bottom_visible() && area.height > 0 {
        let line =
            Line::styled(BACK_TO_BOTTOM, chrome.styles.indicator).alignment(Alignment::Right);
        put_row(frame, area, i64::from(area.height) - 1, line);
    }
}

/// Draw `line` at `row` of `area`, if that row exists.
fn put_row(frame: &mut Frame, area: Rect, row: i64, line: Line<'static>) {
    if (0..i64::from(area.height)).contains(&row) {
        let y = area.y + row as u16;
        frame.render_widget(line, Rect::new(area.x, y, area.width, 1));
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, view: &ChatView, chrome: &Chrome<'_>) {
    let history = view.history();
    let mut spans = vec![LiveIndicator::new(chrome.channel).render()];
    spans.push(Span::raw(format!(
        " {} shown · history {}/{} ",
        view.len(),
        history.cursor(),
        history.len()
    )));
    if let Some(notice) = chrome.notice {
        spans.push(Span::styled(format!("· {notice} "), chrome.styles.error));
    }
    let status = Line::from(spans).style(chrome.styles.status_bar);
    let room = usize::from(area.width).saturating_sub(status.width());
    frame.render_widget(status, area);
    if KEY_HINTS.width() <= room {
        frame.render_widget(
            Line::styled(KEY_HINTS, chrome.styles.status_bar).alignment(Alignment::Right),
            area,
        );
    }
}
