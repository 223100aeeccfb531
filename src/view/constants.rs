//! Layout constants for the terminal front-end.
//!
//! The engine works in pixels; the terminal in rows. One row is
//! [`ROW_PX`] pixels, so every engine height produced here is a whole
//! number of rows.

use crate::engine::Px;
use std::time::Duration;

/// Pixels per terminal row.
pub const ROW_PX: Px = 20;

/// Height of the status bar in lines.
pub const STATUS_BAR_HEIGHT: u16 = 1;

/// Height of the compose box when open (border + input line).
pub const COMPOSE_HEIGHT: u16 = 3;

/// Rows reserved for a loaded image or video thumbnail.
pub const MEDIA_ROWS: Px = 6;

/// Rows reserved for a loaded audio player.
pub const AUDIO_ROWS: Px = 1;

/// Width used when the terminal reports zero columns.
pub const FALLBACK_WIDTH: u16 = 80;

/// Event-loop poll interval. Drives the scroll debouncer, deferred work and
/// the command channel.
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Convert rows to engine pixels.
pub fn rows_to_px(rows: u16) -> Px {
    Px::from(rows) * ROW_PX
}

/// How often relative timestamp labels are re-derived.
pub const LABEL_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
