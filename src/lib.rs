//! chatview
//!
//! Virtualized conversation transcript: a pure engine ([`engine::ChatView`])
//! that grows history upward in batches, keeps the viewport anchored while
//! content changes, and hands host events and media requests to its caller;
//! plus a terminal front-end driving it from a history file and a command
//! channel.
//!
//! Follows the Pure Core / Impure Shell split: `model`, `parser` and `engine`
//! do no I/O; `source`, `view` and `logging` do.

pub mod config;
pub mod engine;
pub mod logging;
pub mod model;
pub mod parser;
pub mod source;
pub mod view;
