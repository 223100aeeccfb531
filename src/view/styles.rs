//! Node styling.
//!
//! Distinct colors for incoming, outgoing and generated nodes, timestamp
//! labels and error states. Colors are dropped when `NO_COLOR` is set.

use crate::engine::node::LabelClass;
use ratatui::style::{Color, Modifier, Style};

/// Whether colors are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorConfig {
    enabled: bool,
}

impl ColorConfig {
    /// Priority (first match wins):
    /// 1. `no_color_flag`
    /// 2. `NO_COLOR` env var (any value disables colors)
    /// 3. Default: colors enabled
    pub fn from_env_and_args(no_color_flag: bool) -> Self {
        let enabled = !no_color_flag && std::env::var("NO_COLOR").is_err();
        Self { enabled }
    }

    pub fn colors_enabled(self) -> bool {
        self.enabled
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStyles {
    pub incoming: Style,
    pub outgoing: Style,
    pub generated: Style,
    pub sender: Style,
    pub label: Style,
    pub error: Style,
    pub media: Style,
    pub indicator: Style,
    pub status_bar: Style,
}

impl NodeStyles {
    pub fn new() -> Self {
        Self::with_color_config(ColorConfig::from_env_and_args(false))
    }

    /// If colors are disabled only modifiers remain.
    pub fn with_color_config(config: ColorConfig) -> Self {
        let plain = Style::default();
        if !config.colors_enabled() {
            return Self {
                incoming: plain,
                outgoing: plain,
                generated: plain.add_modifier(Modifier::ITALIC),
                sender: plain.add_modifier(Modifier::BOLD),
                label: plain.add_modifier(Modifier::DIM),
                error: plain.add_modifier(Modifier::BOLD),
                media: plain,
                indicator: plain.add_modifier(Modifier::DIM),
                status_bar: plain.add_modifier(Modifier::REVERSED),
            };
        }
        Self {
            incoming: plain.fg(Color::Cyan),
            outgoing: plain.fg(Color::Green),
            generated: plain.fg(Color::Yellow).add_modifier(Modifier::ITALIC),
            sender: plain.fg(Color::Cyan).add_modifier(Modifier::BOLD),
            label: plain.fg(Color::DarkGray),
            error: plain.fg(Color::Red),
            media: plain.fg(Color::Magenta),
            indicator: plain.fg(Color::DarkGray),
            status_bar: plain.bg(Color::DarkGray).fg(Color::White),
        }
    }

    pub fn for_class(&self, class: LabelClass) -> Style {
        match class {
            LabelClass::Action => self.generated,
            LabelClass::In => self.incoming,
            LabelClass::Out => self.outgoing,
        }
    }
}

impl Default for NodeStyles {
    fn default() -> Self {
        Self::new()
    }
}
