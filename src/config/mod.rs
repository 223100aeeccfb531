//! Configuration module.

pub mod loader;

pub use loader::{ConfigError, ConfigFile, ResolvedConfig};

use crate::engine::anchor::Px;
use crate::engine::timestamp::DEFAULT_DATE_FORMAT;
use std::time::Duration;

/// Distance from the end of the content, in pixels, still treated as
/// "at the bottom".
pub const DEFAULT_SCROLL_THRESHOLD: Px = 200;
/// History messages materialized per lazy-load step.
pub const DEFAULT_BATCH_SIZE: usize = 20;
/// Initial loading continues until the content is this many viewports tall.
pub const DEFAULT_FILL_FACTOR: u32 = 3;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Behaviour knobs of the chat view engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    pub scroll_threshold: Px,
    pub batch_size: usize,
    pub initial_fill_factor: u32,
    /// Quiet period before a scroll is acted upon.
    pub debounce: Duration,
    /// Render lone image/video links and finished media transfers inline.
    pub display_links: bool,
    /// `chrono` format of labels older than five days.
    pub date_format: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            scroll_threshold: DEFAULT_SCROLL_THRESHOLD,
            batch_size: DEFAULT_BATCH_SIZE,
            initial_fill_factor: DEFAULT_FILL_FACTOR,
            debounce: DEFAULT_DEBOUNCE,
            display_links: true,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}
