//! Tests for the TUI app, driven through a TestBackend.

use super::*;
use crate::engine::ScrollSurface;
use crate::model::{DeliveryStatus, Direction, SenderId};
use crate::source::StdinSource;
use ratatui::backend::TestBackend;
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct Shared(Arc<Mutex<Vec<u8>>>);

impl Shared {
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }
}

impl Write for Shared {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn text(id: &str, direction: Direction, body: &str) -> Message {
    Message::text(
        MessageId::new(id).unwrap(),
        direction,
        SenderId::new("alice").unwrap(),
        chrono::Utc::now(),
        DeliveryStatus::Read,
        body,
    )
}

fn conversation(count: usize) -> Vec<Message> {
    (0..count)
        .map(|i| text(&format!("m{i}"), Direction::In, &format!("message {i}")))
        .collect()
}

fn launch(history: Vec<Message>, commands: Option<CommandSource>, events: EventLog) -> Launch {
    Launch {
        config: ViewConfig::default(),
        history,
        commands,
        events,
        styles: NodeStyles::default(),
    }
}

fn create_test_app(history: Vec<Message>) -> TuiApp<TestBackend> {
    let terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
    TuiApp::from_terminal(terminal, launch(history, None, EventLog::new())).unwrap()
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn screen(app: &TuiApp<TestBackend>) -> String {
    let buffer = app.terminal().backend().buffer();
    let area = buffer.area;
    (0..area.height)
        .map(|y| {
            (0..area.width)
                .map(|x| buffer[(x, y)].symbol().to_string())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn tui_error_from_io_error() {
    let tui_err: TuiError = io::Error::other("test error").into();
    assert!(matches!(tui_err, TuiError::Io(_)));
}

#[test]
fn q_and_ctrl_c_quit() {
    let mut app = create_test_app(Vec::new());
    let now = Instant::now();
    assert!(app.handle_key(key(KeyCode::Char('q')), now));
    assert!(app.handle_key(
        KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        now
    ));
    assert!(!app.handle_key(key(KeyCode::Down), now));
}

#[test]
fn key_releases_are_ignored() {
    let mut app = create_test_app(Vec::new());
    let mut release = key(KeyCode::Char('q'));
    release.kind = KeyEventKind::Release;
    assert!(!app.handle_key(release, Instant::now()));
}

#[test]
fn history_is_drawn_at_the_bottom() {
    let mut app = create_test_app(conversation(3));
    app.draw().unwrap();
    let screen = screen(&app);
    assert!(screen.contains("message 2"), "screen:\n{screen}");
    assert!(screen.contains("3 shown"), "screen:\n{screen}");
}

#[test]
fn history_loaded_event_is_written() {
    let shared = Shared::default();
    let terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
    let app = TuiApp::from_terminal(
        terminal,
        launch(conversation(2), None, EventLog::with_writer(shared.clone())),
    )
    .unwrap();
    assert_eq!(shared.lines(), vec!["MESSAGES_LOADED"]);
    assert_eq!(app.events().emitted(), 1);
}

#[test]
fn compose_sends_message_and_restores_viewport() {
    let shared = Shared::default();
    let terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
    let mut app =
        TuiApp::from_terminal(terminal, launch(Vec::new(), None, EventLog::with_writer(shared.clone())))
            .unwrap();
    let now = Instant::now();
    let full = app.view().viewport();

    app.handle_key(key(KeyCode::Char('i')), now);
    assert!(app.compose().is_open());
    assert_eq!(app.view().viewport(), full - rows_to_px(COMPOSE_HEIGHT));

    // 'q' types while composing instead of quitting
    for ch in "hiq".chars() {
        assert!(!app.handle_key(key(KeyCode::Char(ch)), now));
    }
    app.handle_key(key(KeyCode::Backspace), now);
    app.handle_key(key(KeyCode::Enter), now);
    app.step(now).unwrap();

    assert!(!app.compose().is_open());
    assert_eq!(app.view().viewport(), full);
    assert_eq!(shared.lines(), vec!["MESSAGES_LOADED", "SEND_MESSAGE:hi"]);
}

#[test]
fn compose_file_prefix_sends_file() {
    let shared = Shared::default();
    let terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
    let mut app =
        TuiApp::from_terminal(terminal, launch(Vec::new(), None, EventLog::with_writer(shared.clone())))
            .unwrap();
    let now = Instant::now();
    app.handle_key(key(KeyCode::Char('i')), now);
    for ch in "/file /tmp/a.png".chars() {
        app.handle_key(key(KeyCode::Char(ch)), now);
    }
    app.handle_key(key(KeyCode::Enter), now);
    app.step(now).unwrap();
    assert_eq!(shared.lines().last().map(String::as_str), Some("SEND_FILE:/tmp/a.png"));
}

#[test]
fn focus_starts_at_newest_and_clamps() {
    let mut app = create_test_app(conversation(3));
    let now = Instant::now();
    assert_eq!(app.focus(), None);

    app.handle_key(key(KeyCode::Char('k')), now);
    assert_eq!(app.focus().map(MessageId::as_str), Some("m2"));
    app.handle_key(key(KeyCode::Char('k')), now);
    app.handle_key(key(KeyCode::Char('k')), now);
    app.handle_key(key(KeyCode::Char('k')), now);
    assert_eq!(app.focus().map(MessageId::as_str), Some("m0"));
    app.handle_key(key(KeyCode::Char('j')), now);
    assert_eq!(app.focus().map(MessageId::as_str), Some("m1"));

    app.handle_key(key(KeyCode::Esc), now);
    assert_eq!(app.focus(), None);
}

#[test]
fn delete_on_focused_node_emits_action() {
    let shared = Shared::default();
    let terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
    let mut app = TuiApp::from_terminal(
        terminal,
        launch(conversation(2), None, EventLog::with_writer(shared.clone())),
    )
    .unwrap();
    let now = Instant::now();
    app.handle_key(key(KeyCode::Char('k')), now);
    app.handle_key(key(KeyCode::Char('x')), now);
    app.step(now).unwrap();

    assert_eq!(app.notice(), None);
    assert_eq!(
        shared.lines(),
        vec!["MESSAGES_LOADED", "DELETE_INTERACTION:m1"]
    );
}

#[test]
fn unavailable_action_shows_notice() {
    let mut app = create_test_app(conversation(1));
    let now = Instant::now();

    app.handle_key(key(KeyCode::Char('x')), now);
    assert!(app.notice().is_some_and(|n| n.contains("no message focused")));

    app.handle_key(key(KeyCode::Char('k')), now);
    app.handle_key(key(KeyCode::Char('r')), now);
    assert!(app.notice().is_some_and(|n| n.starts_with("retry")));
}

#[test]
fn home_and_end_move_the_viewport() {
    let mut app = create_test_app(conversation(20));
    let now = Instant::now();
    let bottom = app.view().scroll_top();
    assert!(bottom > 0);

    app.handle_key(key(KeyCode::Home), now);
    assert_eq!(app.view().scroll_top(), 0);

    app.handle_key(key(KeyCode::End), now);
    assert_eq!(app.view().scroll_top(), bottom);

    app.handle_key(key(KeyCode::Up), now);
    assert_eq!(app.view().scroll_top(), bottom - ROW_PX);
}

#[test]
fn resize_updates_viewport() {
    let mut app = create_test_app(conversation(2));
    app.resize(40, 30);
    assert_eq!(
        app.view().viewport(),
        rows_to_px(30 - STATUS_BAR_HEIGHT)
    );
}

#[test]
fn piped_commands_are_applied_on_step() {
    let input = concat!(
        r#"{"command":"add","message":{"id":"n1","type":"text","direction":"in","sender":"bob","timestamp":1500000000,"delivery_status":"read","text":"fresh"}}"#,
        "\n",
        r#"{"command":"remove","id":"m0"}"#,
        "\n",
        r#"{"command":"remove","id":"nope"}"#,
        "\n",
    );
    let commands = CommandSource::stdin(StdinSource::from_reader(Cursor::new(input)));
    let terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
    let mut app =
        TuiApp::from_terminal(terminal, launch(conversation(1), Some(commands), EventLog::new()))
            .unwrap();
    let now = Instant::now();
    app.handle_key(key(KeyCode::Char('k')), now);
    assert_eq!(app.focus().map(MessageId::as_str), Some("m0"));

    for _ in 0..200 {
        app.step(now).unwrap();
        if app.view().node(&MessageId::new("n1").unwrap()).is_some() && app.notice().is_some() {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    assert!(app.view().node(&MessageId::new("n1").unwrap()).is_some());
    assert!(app.view().node(&MessageId::new("m0").unwrap()).is_none());
    assert_eq!(app.focus(), None, "focus on a removed node is dropped");
    assert!(app.notice().is_some_and(|n| n.starts_with("remove")));
}

#[test]
fn undecodable_command_line_does_not_end_the_session() {
    let mut input = b"{\"command\":\"remove\",\"id\":\"\xff\xfe\"}\n".to_vec();
    input.extend_from_slice(b"{\"command\":\"remove\",\"id\":\"m0\"}\n");
    let commands = CommandSource::stdin(StdinSource::from_reader(Cursor::new(input)));
    let terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
    let mut app =
        TuiApp::from_terminal(terminal, launch(conversation(2), Some(commands), EventLog::new()))
            .unwrap();
    let now = Instant::now();

    for _ in 0..200 {
        app.step(now).unwrap();
        if app.view().node(&MessageId::new("m0").unwrap()).is_none() {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    assert!(app.view().node(&MessageId::new("m0").unwrap()).is_none());
    assert_eq!(app.view().len(), 1);
    assert_eq!(app.notice(), None);
}
