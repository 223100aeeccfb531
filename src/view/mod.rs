//! TUI rendering and terminal management (impure shell)
//!
//! [`TuiApp`] owns a [`ChatView`] and plays the host for it: commands read
//! from the command channel are applied to the view, queued host events go
//! to an [`EventLog`], media requests go to an [`FsMediaLoader`] whose
//! outcomes are reported back on the following step.

pub mod compose;
pub mod constants;
pub mod events;
pub mod layout;
pub mod live_indicator;
pub mod media;
pub mod message;
pub mod styles;

pub use compose::{ComposeState, Submission};
pub use events::EventLog;
pub use live_indicator::{ChannelState, LiveIndicator};
pub use media::FsMediaLoader;
pub use message::TerminalMeasure;
pub use styles::{ColorConfig, NodeStyles};

use crate::config::ViewConfig;
use crate::engine::{ActionKind, ChatView, Px};
use crate::model::{AppError, InputError, Message, MessageId};
use crate::source::CommandSource;
use constants::{
    rows_to_px, COMPOSE_HEIGHT, FALLBACK_WIDTH, LABEL_REFRESH_INTERVAL, ROW_PX, STATUS_BAR_HEIGHT,
    TICK_INTERVAL,
};
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
    },
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use layout::Chrome;
use ratatui::{backend::Backend, backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during TUI operations
#[derive(Debug, Error)]
pub enum TuiError {
    /// IO error during terminal operations
    #[error("Terminal IO error: {0}")]
    Io(#[from] io::Error),

    /// Command channel error
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Application error: {0}")]
    App(#[from] AppError),
}

/// Everything the TUI starts from, resolved by `main`.
#[derive(Debug)]
pub struct Launch {
    pub config: ViewConfig,
    pub history: Vec<Message>,
    pub commands: Option<CommandSource>,
    pub events: EventLog,
    pub styles: NodeStyles,
}

/// Main TUI application
///
/// Generic over backend to support testing with TestBackend
pub struct TuiApp<B>
where
    B: Backend,
{
    terminal: Terminal<B>,
    view: ChatView,
    commands: Option<CommandSource>,
    loader: FsMediaLoader,
    events: EventLog,
    styles: NodeStyles,
    width: u16,
    height: u16,
    /// Node targeted by action keys.
    focus: Option<MessageId>,
    compose: ComposeState,
    /// Last user-visible problem, shown in the status bar.
    notice: Option<String>,
    labels_refreshed: Instant,
}

impl TuiApp<CrosstermBackend<Stdout>> {
    /// Create and initialize a new TUI application
    ///
    /// Sets up terminal in raw mode with alternate screen
    pub fn new(launch: Launch) -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        stdout.execute(crossterm::event::EnableMouseCapture)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Self::from_terminal(terminal, launch)
    }

    /// Run the main event loop
    ///
    /// Returns when user quits (q or Ctrl+C). Every [`TICK_INTERVAL`] without
    /// input the command channel is polled and the view ticked.
    pub fn run(&mut self) -> Result<(), TuiError> {
        self.draw()?;

        loop {
            if event::poll(TICK_INTERVAL)? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key, Instant::now()) {
                            return Ok(());
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse, Instant::now()),
                    Event::Resize(width, height) => self.resize(width, height),
                    _ => {}
                }
            }
            self.step(Instant::now())?;
            self.draw()?;
        }
    }
}

impl<B> TuiApp<B>
where
    B: Backend,
{
    /// Build the app over an existing terminal and print the history.
    pub fn from_terminal(terminal: Terminal<B>, launch: Launch) -> Result<Self, TuiError> {
        let size = terminal.size()?;
        let width = if size.width > 0 {
            size.width
        } else {
            FALLBACK_WIDTH
        };

        let mut view = ChatView::new(launch.config, transcript_viewport(size.height, false))
            .with_measure(TerminalMeasure::new(width));
        view.print_history(launch.history);
        let mut app = Self {
            terminal,
            view,
            commands: launch.commands,
            loader: FsMediaLoader::new(),
            events: launch.events,
            styles: launch.styles,
            width,
            height: size.height,
            focus: None,
            compose: ComposeState::Closed,
            notice: None,
            labels_refreshed: Instant::now(),
        };
        app.flush();
        info!(
            width,
            height = size.height,
            shown = app.view.len(),
            "TUI initialized"
        );
        Ok(app)
    }

    pub fn view(&self) -> &ChatView {
        &self.view
    }

    pub fn focus(&self) -> Option<&MessageId> {
        self.focus.as_ref()
    }

    pub fn compose(&self) -> &ComposeState {
        &self.compose
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    fn sync_viewport(&mut self) {
        let viewport = transcript_viewport(self.height, self.compose.is_open());
        self.view.set_viewport(viewport);
    }

    /// Terminal resized: remeasure every node at the new width.
    pub fn resize(&mut self, width: u16, height: u16) {
        debug!(width, height, "Terminal resized");
        let width = if width > 0 { width } else { FALLBACK_WIDTH };
        self.height = height;
        if width != self.width {
            self.width = width;
            self.view.set_measure(TerminalMeasure::new(width));
        }
        self.sync_viewport();
    }

    /// Handle one key press. Returns true when the user quits.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        if self.compose.is_open() {
            self.handle_compose_key(key);
            return false;
        }

        let page = i64::from(self.view.viewport().max(ROW_PX));
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => self.view.scroll_by(-i64::from(ROW_PX), now),
            KeyCode::Down => self.view.scroll_by(i64::from(ROW_PX), now),
            KeyCode::PageUp => self.view.scroll_by(-page, now),
            KeyCode::PageDown => self.view.scroll_by(page, now),
            KeyCode::Home => self.view.scroll_to(0, now),
            KeyCode::End | KeyCode::Char('b') => self.view.back_to_bottom(),
            KeyCode::Char('j') => self.move_focus(1),
            KeyCode::Char('k') => self.move_focus(-1),
            KeyCode::Esc => {
                self.focus = None;
                self.notice = None;
            }
            KeyCode::Char('x') => self.act(ActionKind::Delete),
            KeyCode::Char('r') => self.act(ActionKind::Retry),
            KeyCode::Char('a') => self.act(ActionKind::Accept),
            KeyCode::Char('f') => self.act(ActionKind::Refuse),
            KeyCode::Char('o') => self.act(ActionKind::OpenFile),
            KeyCode::Char('i') => {
                self.compose = ComposeState::open();
                self.sync_viewport();
            }
            _ => {}
        }
        false
    }

    fn handle_compose_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                match self.compose.submit() {
                    Some(Submission::Message(text)) => self.view.send_message(&text),
                    Some(Submission::File(path)) => self.view.send_file(&path),
                    None => {}
                }
                self.sync_viewport();
            }
            KeyCode::Esc => {
                self.compose.cancel();
                self.sync_viewport();
            }
            KeyCode::Backspace => self.compose.backspace(),
            KeyCode::Left => self.compose.left(),
            KeyCode::Right => self.compose.right(),
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.compose.insert(ch);
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.view.scroll_by(-3 * i64::from(ROW_PX), now),
            MouseEventKind::ScrollDown => self.view.scroll_by(3 * i64::from(ROW_PX), now),
            _ => {}
        }
    }

    /// Move focus `delta` nodes down (negative: up). Without a focus the
    /// newest node is picked.
    fn move_focus(&mut self, delta: isize) {
        let ids: Vec<&MessageId> = self.view.nodes().map(|node| node.id()).collect();
        let Some(last) = ids.len().checked_sub(1) else {
            self.focus = None;
            return;
        };
        let next = match self
            .focus
            .as_ref()
            .and_then(|focus| ids.iter().position(|id| *id == focus))
        {
            Some(current) => current.saturating_add_signed(delta).min(last),
            None => last,
        };
        self.focus = Some(ids[next].clone());
    }

    fn act(&mut self, kind: ActionKind) {
        let Some(id) = self.focus.clone() else {
            self.notice = Some(format!("{kind}: no message focused"));
            return;
        };
        self.notice = match self.view.dispatch(&id, kind) {
            Ok(()) => None,
            Err(e) => Some(format!("{kind}: {e}")),
        };
    }

    /// Apply pending commands, advance the view's timers and settle media.
    pub fn step(&mut self, now: Instant) -> Result<(), TuiError> {
        let commands = match self.commands.as_mut() {
            Some(source) => source.poll()?,
            None => Vec::new(),
        };
        if !commands.is_empty() {
            debug!(count = commands.len(), "Applying host commands");
        }
        for command in commands {
            let name = command.name();
            if let Err(e) = command.apply(&mut self.view) {
                warn!(command = name, error = %e, "Host command rejected");
                self.notice = Some(format!("{name}: {e}"));
            }
        }

        self.view.tick(now);
        if now.duration_since(self.labels_refreshed) >= LABEL_REFRESH_INTERVAL {
            self.view.refresh_timestamps();
            self.labels_refreshed = now;
        }
        self.flush();

        if self
            .focus
            .as_ref()
            .is_some_and(|id| self.view.node(id).is_none())
        {
            self.focus = None;
        }
        Ok(())
    }

    /// Hand queued events and media requests to their consumers, then report
    /// the media outcomes back to the view.
    fn flush(&mut self) {
        self.view.flush(&mut self.events, &mut self.loader);
        for (request, outcome) in self.loader.settle() {
            self.view.media_settled(request, outcome);
        }
    }

    pub fn draw(&mut self) -> Result<(), TuiError> {
        let chrome = Chrome {
            styles: &self.styles,
            focus: self.focus.as_ref(),
            compose: &self.compose,
            channel: ChannelState::from_source(self.commands.as_ref()),
            notice: self.notice.as_deref(),
        };
        let view = &self.view;
        self.terminal.draw(|frame| layout::render(frame, view, chrome))?;
        Ok(())
    }
}

/// Pixels left to the transcript in a terminal `height` rows tall.
fn transcript_viewport(height: u16, composing: bool) -> Px {
    let compose = if composing { COMPOSE_HEIGHT } else { 0 };
    rows_to_px(height.saturating_sub(STATUS_BAR_HEIGHT + compose))
}

/// Initialize and run the TUI application
///
/// Handles terminal setup, runs the event loop, and ensures cleanup on exit.
///
/// Note: Logging must be initialized by caller before calling this function.
pub fn run_with_source(launch: Launch) -> Result<(), TuiError> {
    let mut app = match TuiApp::new(launch) {
        Ok(app) => app,
        Err(e) => {
            let _ = restore_terminal();
            return Err(e);
        }
    };

    let result = app.run();

    // Always restore terminal state
    restore_terminal()?;

    result
}

/// Restore terminal to normal state
///
/// Disables raw mode, mouse capture, and leaves alternate screen
fn restore_terminal() -> Result<(), TuiError> {
    disable_raw_mode()?;
    io::stdout().execute(crossterm::event::DisableMouseCapture)?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
