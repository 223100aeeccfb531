//! Buffer of history messages not yet materialized in the view.

use crate::model::Message;

/// Ordered history (oldest first) plus a cursor counting how many messages,
/// from the newest end, have been handed out.
///
/// The cursor only grows and never exceeds the buffer length. Reaching the
/// length means there is no more history to page in.
#[derive(Debug, Default, Clone)]
pub struct HistoryBuffer {
    messages: Vec<Message>,
    cursor: usize,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole buffer and rewind the cursor.
    pub fn reset(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.cursor = 0;
    }

    /// Take up to `n` unconsumed messages, newest first.
    ///
    /// Returns exactly `min(n, remaining)` messages and advances the cursor by
    /// that amount.
    pub fn take_next(&mut self, n: usize) -> Vec<Message> {
        let count = n.min(self.remaining());
        let end = self.messages.len() - self.cursor;
        let batch = self.messages[end - count..end]
            .iter()
            .rev()
            .cloned()
            .collect();
        self.cursor += count;
        batch
    }

    pub fn has_more(&self) -> bool {
        self.cursor < self.messages.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.messages.len() - self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeliveryStatus, Direction, MessageId, SenderId};
    use chrono::DateTime;

    fn history(n: usize) -> Vec<Message> {
        (0..n)
            .map(|i| {
                Message::text(
                    MessageId::new(i.to_string()).unwrap(),
                    Direction::In,
                    SenderId::new("peer").unwrap(),
                    DateTime::from_timestamp(i as i64, 0).unwrap(),
                    DeliveryStatus::Read,
                    format!("message {i}"),
                )
            })
            .collect()
    }

    fn ids(batch: &[Message]) -> Vec<&str> {
        batch.iter().map(|m| m.id().as_str()).collect()
    }

    #[test]
    fn take_next_walks_backward_newest_first() {
        let mut buffer = HistoryBuffer::new();
        buffer.reset(history(5));

        assert_eq!(ids(&buffer.take_next(2)), vec!["4", "3"]);
        assert_eq!(buffer.cursor(), 2);
        assert_eq!(ids(&buffer.take_next(2)), vec!["2", "1"]);
        assert_eq!(ids(&buffer.take_next(2)), vec!["0"]);
        assert!(!buffer.has_more());
        assert_eq!(buffer.cursor(), 5);
    }

    #[test]
    fn take_next_on_exhausted_buffer_is_empty() {
        let mut buffer = HistoryBuffer::new();
        buffer.reset(history(1));
        buffer.take_next(10);
        assert!(buffer.take_next(10).is_empty());
        assert_eq!(buffer.cursor(), 1);
    }

    #[test]
    fn reset_rewinds_cursor() {
        let mut buffer = HistoryBuffer::new();
        buffer.reset(history(3));
        buffer.take_next(3);
        buffer.reset(history(4));
        assert_eq!(buffer.cursor(), 0);
        assert_eq!(buffer.remaining(), 4);
        assert!(buffer.has_more());
    }

    #[test]
    fn empty_buffer_has_no_more() {
        let buffer = HistoryBuffer::new();
        assert!(!buffer.has_more());
        assert!(buffer.is_empty());
    }

    #[test]
    fn forty_five_messages_in_batches_of_twenty() {
        let mut buffer = HistoryBuffer::new();
        buffer.reset(history(45));
        let sizes: Vec<usize> = std::iter::from_fn(|| {
            buffer.has_more().then(|| buffer.take_next(20).len())
        })
        .collect();
        assert_eq!(sizes, vec![20, 20, 5]);
        assert_eq!(buffer.cursor(), 45);
    }
}
