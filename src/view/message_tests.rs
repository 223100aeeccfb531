//! Tests for node layout and terminal measurement.

use super::*;
use crate::engine::node::TimestampLabel;
use crate::engine::timestamp::RelativeBuckets;
use crate::model::{DeliveryStatus, Message, MessageId, SenderId, TransferProgress};
use chrono::{DateTime, Utc};

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn text(body: &str, direction: Direction) -> Message {
    Message::text(
        MessageId::new("1").unwrap(),
        direction,
        SenderId::new("alice").unwrap(),
        now(),
        DeliveryStatus::Read,
        body,
    )
}

fn labelled(message: Message) -> RenderNode {
    let label = TimestampLabel::new(
        LabelClass::for_message(&message),
        message.timestamp(),
        &RelativeBuckets::default(),
        now(),
    );
    let content = NodeContent::present(&message, true, false);
    RenderNode::new(message, content, Some(label))
}

fn plain(message: Message) -> RenderNode {
    let content = NodeContent::present(&message, true, false);
    RenderNode::new(message, content, None)
}

fn rendered(lines: &[Line<'_>]) -> Vec<String> {
    lines
        .iter()
        .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
        .collect()
}

#[test]
fn wrap_breaks_on_words() {
    assert_eq!(wrap("the quick brown fox", 10), vec!["the quick", "brown fox"]);
}

#[test]
fn wrap_splits_long_words_and_keeps_blank_lines() {
    assert_eq!(wrap("abcdefgh", 3), vec!["abc", "def", "gh"]);
    assert_eq!(wrap("a\n\nb", 5), vec!["a", "", "b"]);
    assert_eq!(wrap("", 5), vec![""]);
}

#[test]
fn wrap_counts_display_width() {
    // Each ideograph is two columns wide.
    assert_eq!(wrap("日本語", 4), vec!["日本", "語"]);
}

#[test]
fn truncate_marks_cut_text() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("much too long", 6), "much …");
}

#[test]
fn incoming_run_start_shows_label_sender_and_body() {
    let mut node = labelled(text("hello", Direction::In));
    node.set_tag(Some(GroupingTag::Single));
    let lines = node_lines(&node, 40, &NodeStyles::default(), Decoration::default());
    assert_eq!(rendered(&lines), vec!["just now", "alice", "│ hello"]);
    assert_eq!(lines[0].alignment, Some(Alignment::Left));
}

#[test]
fn middle_of_run_has_no_sender_header() {
    let mut node = plain(text("hello", Direction::In));
    node.set_tag(Some(GroupingTag::MiddleOfSequence));
    assert_eq!(node_rows(&node, 40), 1);
}

#[test]
fn outgoing_text_is_right_aligned_with_delivery_marker() {
    let message = text("sent", Direction::Out).with_status(DeliveryStatus::Failure);
    let mut node = plain(message);
    node.set_tag(Some(GroupingTag::Single));
    let lines = node_lines(&node, 40, &NodeStyles::default(), Decoration::default());
    assert_eq!(rendered(&lines), vec!["sent ✗ │"]);
    assert_eq!(lines[0].alignment, Some(Alignment::Right));
}

#[test]
fn avatar_marks_the_sender_header() {
    let mut node = plain(text("hi", Direction::In));
    node.set_tag(Some(GroupingTag::FirstOfSequence));
    let decoration = Decoration {
        has_avatar: true,
        ..Decoration::default()
    };
    let lines = node_lines(&node, 40, &NodeStyles::default(), decoration);
    assert_eq!(rendered(&lines)[0], "◉ alice");
}

#[test]
fn transfer_in_progress_has_info_and_progress_rows() {
    let message = Message::transfer(
        MessageId::new("2").unwrap(),
        Direction::In,
        SenderId::new("alice").unwrap(),
        now(),
        DeliveryStatus::Ongoing(None),
        "/tmp/report.pdf",
        Some(TransferProgress::new(512, 2048)),
    );
    let node = labelled(message);
    let lines = rendered(&node_lines(
        &node,
        60,
        &NodeStyles::default(),
        Decoration::default(),
    ));
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[1], "│ [file] report.pdf");
    assert_eq!(lines[2], "│ just now - 512 B / 2.0 kB - ongoing");
    assert_eq!(lines[3], "│ [#####---------------] 25%");
}

#[test]
fn loaded_media_reserves_rows() {
    let mut node = plain(text("https://example.com/cat.png", Direction::In));
    assert_eq!(node_rows(&node, 40), 1);
    node.set_media_height(ROW_PX * 3 + 1);
    assert_eq!(node_rows(&node, 40), 5);
}

#[test]
fn call_notice_is_centered() {
    let message = Message::call(
        MessageId::new("3").unwrap(),
        Direction::In,
        now(),
        "☎ Missed incoming call",
    );
    let lines = node_lines(
        &plain(message),
        40,
        &NodeStyles::default(),
        Decoration::default(),
    );
    assert_eq!(rendered(&lines), vec!["↙ Missed incoming call"]);
    assert_eq!(lines[0].alignment, Some(Alignment::Center));
}

#[test]
fn terminal_measure_counts_rows_in_pixels() {
    let long = "word ".repeat(30);
    let mut node = plain(text(long.trim_end(), Direction::In));
    node.set_tag(Some(GroupingTag::LastOfSequence));
    let narrow = TerminalMeasure::new(30).measure(&node);
    let wide = TerminalMeasure::new(200).measure(&node);
    assert!(narrow > wide);
    assert_eq!(wide, ROW_PX);
    assert_eq!(narrow % ROW_PX, 0);
    assert_eq!(TerminalMeasure::new(30).indicator_height(), ROW_PX);
}

#[test]
fn focus_reverses_body_rows_only() {
    let node = labelled(text("hi", Direction::In));
    let decoration = Decoration {
        focused: true,
        ..Decoration::default()
    };
    let lines = node_lines(&node, 40, &NodeStyles::default(), decoration);
    assert!(!lines[0].style.add_modifier.contains(Modifier::REVERSED));
    assert!(lines[1].style.add_modifier.contains(Modifier::REVERSED));
}
