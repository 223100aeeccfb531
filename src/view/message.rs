//! Node -> terminal lines.
//!
//! [`node_lines`] is the single source of truth for how many rows a node
//! occupies: [`TerminalMeasure`] counts its output, the transcript widget
//! draws it. Anything that changes the row count must change the node,
//! which makes the engine relayout.

use crate::engine::node::{LabelClass, MediaKind, NodeContent, RenderNode, TextDelivery};
use crate::engine::{GroupingTag, NodeMeasure, Px};
use crate::model::Direction;
use crate::view::constants::{rows_to_px, ROW_PX};
use crate::view::styles::NodeStyles;
use ratatui::layout::Alignment;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Columns kept free on the side opposite a bubble.
const GUTTER: usize = 4;
const BAR: &str = "│ ";
const PROGRESS_CELLS: usize = 20;

/// How a node is decorated beyond its content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Decoration {
    pub focused: bool,
    /// Sender has an avatar; marks the sender header.
    pub has_avatar: bool,
}

/// Rows a node occupies at `width` columns.
pub fn node_rows(node: &RenderNode, width: u16) -> usize {
    node_lines(node, width, &NodeStyles::default(), Decoration::default()).len()
}

/// Lay out one node.
pub fn node_lines(
    node: &RenderNode,
    width: u16,
    styles: &NodeStyles,
    decoration: Decoration,
) -> Vec<Line<'static>> {
    let width = usize::from(width.max(1));
    let text_width = width.saturating_sub(GUTTER + BAR.width()).max(1);
    let message = node.message();
    let class = LabelClass::for_message(message);
    let alignment = match class {
        LabelClass::Action => Alignment::Center,
        LabelClass::In => Alignment::Left,
        LabelClass::Out => Alignment::Right,
    };
    let style = styles.for_class(class);

    let mut lines = Vec::new();
    if let Some(label) = node.label() {
        lines.push(Line::styled(truncate(label.text(), width), styles.label).alignment(alignment));
    }

    let starts_run = matches!(
        node.tag(),
        Some(GroupingTag::Single | GroupingTag::FirstOfSequence)
    );
    if starts_run && message.direction() == Direction::In {
        if let Some(sender) = message.sender() {
            let marker = if decoration.has_avatar { "◉ " } else { "" };
            let header = format!("{marker}{}", sender.as_str());
            lines.push(Line::styled(truncate(&header, width), styles.sender));
        }
    }

    let body_start = lines.len();
    match node.content() {
        NodeContent::Text { body, delivery } => {
            let wrapped = wrap(body, text_width.saturating_sub(2).max(1));
            let last = wrapped.len().saturating_sub(1);
            for (i, row) in wrapped.into_iter().enumerate() {
                let mut spans = vec![Span::styled(row, style)];
                if i == last {
                    match delivery {
                        Some(TextDelivery::Sending) => spans.push(Span::styled(" …", styles.label)),
                        Some(TextDelivery::Failed) => spans.push(Span::styled(" ✗", styles.error)),
                        None => {}
                    }
                }
                lines.push(bubble(spans, alignment, style));
            }
        }
        NodeContent::Media { url, kind } => {
            let tag = match kind {
                MediaKind::Image => "[image] ".to_string(),
                MediaKind::YouTube { video_id } => format!("[video {video_id}] "),
            };
            let row = truncate(&format!("{tag}{url}"), text_width);
            lines.push(bubble(vec![Span::styled(row, styles.media)], alignment, style));
            push_media_rows(&mut lines, node, text_width, alignment, styles.media);
        }
        NodeContent::Audio { path } => {
            let name = path.rsplit('/').next().unwrap_or(path);
            let row = truncate(&format!("[audio] {name}"), text_width);
            lines.push(bubble(vec![Span::styled(row, styles.media)], alignment, style));
            push_media_rows(&mut lines, node, text_width, alignment, styles.media);
        }
        NodeContent::File(file) => {
            let name = truncate(&format!("[file] {}", file.name), text_width);
            lines.push(bubble(vec![Span::styled(name, style)], alignment, style));
            let bucket = node.label().map(|l| l.text()).unwrap_or_default();
            let info_style = if file.status.is_error() {
                styles.error
            } else {
                styles.label
            };
            let info = truncate(&file.info_line(bucket), text_width);
            lines.push(bubble(vec![Span::styled(info, info_style)], alignment, style));
            if let Some(percent) = file.progress_percent() {
                let bar = progress_bar(percent);
                lines.push(bubble(vec![Span::styled(bar, style)], alignment, style));
            }
        }
        NodeContent::Call(call) => {
            let arrow = match call.direction {
                Direction::In => "↙",
                Direction::Out => "↗",
            };
            let call_style = if call.missed { styles.error } else { style };
            let row = truncate(&format!("{arrow} {}", call.description), width);
            lines.push(Line::styled(row, call_style).alignment(alignment));
        }
        NodeContent::Contact { description } => {
            for row in wrap(description, width.saturating_sub(GUTTER).max(1)) {
                lines.push(Line::styled(row, style).alignment(alignment));
            }
        }
    }

    if decoration.focused {
        for line in &mut lines[body_start..] {
            line.style = line.style.add_modifier(Modifier::REVERSED);
        }
    }
    lines
}

fn bubble(mut spans: Vec<Span<'static>>, alignment: Alignment, style: Style) -> Line<'static> {
    match alignment {
        Alignment::Right => spans.push(Span::styled(" │", style)),
        _ => spans.insert(0, Span::styled(BAR, style)),
    }
    Line::from(spans).alignment(alignment)
}

fn push_media_rows(
    lines: &mut Vec<Line<'static>>,
    node: &RenderNode,
    width: usize,
    alignment: Alignment,
    style: Style,
) {
    let Some(height) = node.media_height() else {
        return;
    };
    let fill = "░".repeat(width.min(32));
    for _ in 0..height.div_ceil(ROW_PX) {
        lines.push(Line::styled(fill.clone(), style).alignment(alignment));
    }
}

fn progress_bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * PROGRESS_CELLS as f64).round() as usize;
    let filled = filled.min(PROGRESS_CELLS);
    format!(
        "[{}{}] {:.0}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_CELLS - filled),
        percent
    )
}

/// Cut `text` to `width` display columns.
pub fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Greedy word wrap on display width. Words wider than `width` are split.
/// Always returns at least one row.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for paragraph in text.split('\n') {
        let mut row = String::new();
        let mut used = 0;
        for word in paragraph.split(' ') {
            let word_width = word.width();
            let gap = usize::from(!row.is_empty());
            if used + gap + word_width <= width {
                if gap == 1 {
                    row.push(' ');
                }
                row.push_str(word);
                used += gap + word_width;
                continue;
            }
            if !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                used = 0;
            }
            for ch in word.chars() {
                let w = ch.width().unwrap_or(0);
                if used + w > width && !row.is_empty() {
                    rows.push(std::mem::take(&mut row));
                    used = 0;
                }
                row.push(ch);
                used += w;
            }
        }
        rows.push(row);
    }
    rows
}

/// [`NodeMeasure`] matching what the terminal draws at a given width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalMeasure {
    width: u16,
}

impl TerminalMeasure {
    pub fn new(width: u16) -> Self {
        Self { width }
    }

    pub fn width(&self) -> u16 {
        self.width
    }
}

impl NodeMeasure for TerminalMeasure {
    fn measure(&self, node: &RenderNode) -> Px {
        let rows = u16::try_from(node_rows(node, self.width)).unwrap_or(u16::MAX);
        rows_to_px(rows)
    }

    fn indicator_height(&self) -> Px {
        ROW_PX
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
