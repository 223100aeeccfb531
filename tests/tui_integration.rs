//! Integration tests: a host session driven through files, rendered on a
//! TestBackend.

use chatview::config::ViewConfig;
use chatview::engine::ScrollSurface;
use chatview::model::MessageId;
use chatview::source::{load_history, open_commands};
use chatview::view::{EventLog, Launch, NodeStyles, TuiApp};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[derive(Clone, Default)]
struct Shared(Arc<Mutex<Vec<u8>>>);

impl Shared {
    fn joined(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .collect::<Vec<_>>()
            .join(" | ")
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

/// Scratch files for one test.
struct Session {
    history: PathBuf,
    commands: PathBuf,
}

impl Session {
    fn new(name: &str, history: &str) -> Self {
        let dir = std::env::temp_dir();
        let session = Self {
            history: dir.join(format!("chatview_it_{name}_history.json")),
            commands: dir.join(format!("chatview_it_{name}_commands.jsonl")),
        };
        fs::write(&session.history, history).unwrap();
        fs::write(&session.commands, "").unwrap();
        session
    }

    fn send(&self, line: &str) {
        let mut file = OpenOptions::new().append(true).open(&self.commands).unwrap();
        writeln!(file, "{line}").unwrap();
    }

    fn launch(&self, events: EventLog) -> TuiApp<TestBackend> {
        let terminal = Terminal::new(TestBackend::new(70, 16)).unwrap();
        let launch = Launch {
            config: ViewConfig::default(),
            history: load_history(&self.history).unwrap(),
            commands: open_commands(Some(self.commands.clone())).unwrap(),
            events,
            styles: NodeStyles::default(),
        };
        TuiApp::from_terminal(terminal, launch).unwrap()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.history);
        let _ = fs::remove_file(&self.commands);
    }
}

fn text_json(id: &str, direction: &str, status: &str, text: &str) -> String {
    format!(
        r#"{{"id":"{id}","type":"text","direction":"{direction}","sender":"alice","timestamp":{ts},"delivery_status":"{status}","text":"{text}"}}"#,
        ts = chrono::Utc::now().timestamp(),
    )
}

fn screen(app: &TuiApp<TestBackend>) -> String {
    let buffer = app.terminal().backend().buffer();
    let area = buffer.area;
    let mut lines = Vec::new();
    for y in area.top()..area.bottom() {
        let line: String = (area.left()..area.right())
            .map(|x| buffer[(x, y)].symbol())
            .collect();
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

#[test]
fn live_commands_from_file_update_the_screen() {
    let history = format!(
        "[{},{}]",
        text_json("1", "in", "read", "hello there"),
        text_json("2", "out", "read", "hi alice")
    );
    let session = Session::new("live", &history);
    let shared = Shared::default();
    let mut app = session.launch(EventLog::with_writer(shared.clone()));
    let now = Instant::now();

    app.draw().unwrap();
    let first = screen(&app);
    assert!(first.contains("hello there"), "screen:\n{first}");
    assert!(first.contains("[LIVE]"), "screen:\n{first}");

    session.send(&format!(
        r#"{{"command":"add","message":{}}}"#,
        text_json("3", "in", "read", "are you around?")
    ));
    session.send("this line is not a command");
    session.send(&format!(
        r#"{{"command":"update","message":{}}}"#,
        text_json("2", "out", "failure", "hi alice")
    ));
    app.step(now).unwrap();
    app.draw().unwrap();

    let second = screen(&app);
    assert!(second.contains("are you around?"), "screen:\n{second}");
    assert!(second.contains('✗'), "failed delivery is marked:\n{second}");
    assert!(app.view().is_at_bottom());
    assert_eq!(app.view().len(), 3);

    session.send(r#"{"command":"clear"}"#);
    app.step(now).unwrap();
    assert!(app.view().is_empty());
    insta::assert_snapshot!(shared.joined(), @"MESSAGES_LOADED | MESSAGES_CLEARED");
}

#[test]
fn print_history_command_replaces_transcript() {
    let session = Session::new("reprint", &format!("[{}]", text_json("old", "in", "read", "old")));
    let shared = Shared::default();
    let mut app = session.launch(EventLog::with_writer(shared.clone()));

    let messages: Vec<String> = (0..30)
        .map(|i| text_json(&format!("n{i}"), "in", "read", &format!("line {i}")))
        .collect();
    session.send(&format!(
        r#"{{"command":"print_history","messages":[{}]}}"#,
        messages.join(",")
    ));
    let now = Instant::now();
    app.step(now).unwrap();
    // First batch, then the initial fill pages in the rest.
    app.step(now).unwrap();

    assert!(app
        .view()
        .node(&MessageId::new("old").unwrap())
        .is_none());
    assert_eq!(app.view().history().len(), 30);
    assert_eq!(app.view().len(), 30);
    assert!(!app.view().shows_lazy_indicator());
    assert!(app.view().is_at_bottom());
    assert!(app.view().scroll_top() > 0);
    insta::assert_snapshot!(shared.joined(), @"MESSAGES_LOADED | MESSAGES_LOADED");
}

#[test]
fn accepting_an_incoming_file_reaches_the_host() {
    let transfer = format!(
        r#"{{"id":"f1","type":"data_transfer","direction":"in","sender":"alice","timestamp":{ts},"delivery_status":"awaiting host","text":"/tmp/report.pdf","progress":0,"totalSize":2048}}"#,
        ts = chrono::Utc::now().timestamp(),
    );
    let session = Session::new("accept", &format!("[{transfer}]"));
    let shared = Shared::default();
    let mut app = session.launch(EventLog::with_writer(shared.clone()));
    let now = Instant::now();

    app.draw().unwrap();
    assert!(screen(&app).contains("report.pdf"));

    app.handle_key(key(KeyCode::Char('k')), now);
    app.handle_key(key(KeyCode::Char('a')), now);
    app.handle_key(key(KeyCode::Char('f')), now);
    app.step(now).unwrap();

    insta::assert_snapshot!(
        shared.joined(),
        @"MESSAGES_LOADED | ACCEPT_FILE:f1 | REFUSE_FILE:f1"
    );
}
