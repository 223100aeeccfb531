//! chatview - Entry Point

use chatview::config::loader::{resolve, CliOverrides};
use chatview::view::{ColorConfig, EventLog, Launch, NodeStyles};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Conversation viewer with lazy history paging
#[derive(Parser, Debug)]
#[command(name = "chatview")]
#[command(version)]
#[command(about = "Terminal conversation viewer with lazy history paging and scroll anchoring")]
pub struct Args {
    /// JSON array of history messages, oldest first
    pub history: PathBuf,

    /// Host command channel: a JSON-lines file that is followed, or `-` for stdin
    #[arg(short, long)]
    pub commands: Option<PathBuf>,

    /// History messages shown per lazy-load step
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: Option<u64>,

    /// Pixels from the end still counted as the bottom
    #[arg(long)]
    pub scroll_threshold: Option<u32>,

    /// Viewports of content to fill before initial loading stops
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub fill_factor: Option<u32>,

    /// Show media links as plain text
    #[arg(long)]
    pub no_links: bool,

    /// Append host events (MESSAGES_LOADED, DELETE_INTERACTION:<id>, ...) to this file
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Disable colors
    #[arg(long)]
    pub no_color: bool,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            batch_size: self.batch_size.map(|n| n as usize),
            scroll_threshold: self.scroll_threshold,
            initial_fill_factor: self.fill_factor,
            display_links: self.no_links.then_some(false),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Defaults → Config File → Env Vars → CLI Args
    let config = resolve(args.config.clone(), &args.overrides())?;

    let _log_guard = chatview::logging::init(&config.log_file_path)?;
    info!(config = ?config, "Configuration loaded and resolved");

    let history = chatview::source::load_history(&args.history)?;
    let commands = chatview::source::open_commands(args.commands.clone())?;
    let events = match &args.events {
        Some(path) => EventLog::open(path)?,
        None => EventLog::new(),
    };

    let launch = Launch {
        config: config.view_config(),
        history,
        commands,
        events,
        styles: NodeStyles::with_color_config(ColorConfig::from_env_and_args(args.no_color)),
    };
    chatview::view::run_with_source(launch)?;

    Ok(())
}
