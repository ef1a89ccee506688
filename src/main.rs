mod app;
mod bridge;
mod config;
mod host;
mod i18n;
mod logging;
mod message;
mod model;
mod session;
mod ui;
mod view;

use anyhow::Context;
use app::App;
use bridge::{BridgeGate, Connector, ReadyConnector, SocketConnector};
use clap::Parser;
use config::Config;
use host::{HostApi, MemoryHost};
use message::Message;
use model::{FocusArea, Timer};
use ratatui::{
    backend::CrosstermBackend,
    crossterm::{
        event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
        execute,
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    },
    Terminal,
};
use session::{Session, SessionEvent};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Simulated round trip of the `--demo` host
const DEMO_LATENCY: Duration = Duration::from_millis(150);

/// Terminal control panel for a host-side timer service
#[derive(Debug, Parser)]
#[command(name = "timerdeck", version, about)]
struct Cli {
    /// Config file (default: <config_dir>/timerdeck/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host socket, overrides the config file
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Run against a built-in in-memory host
    #[arg(long)]
    demo: bool,

    /// Stop waiting for the host after this many milliseconds
    #[arg(long, value_name = "MS")]
    bridge_timeout_ms: Option<u64>,

    /// Print the effective config as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_file = cli.config.clone().unwrap_or_else(config::config_path);
    let mut config = Config::load(&config_file)?;
    if let Some(socket) = cli.socket {
        config.socket_path = socket;
    }
    if cli.bridge_timeout_ms.is_some() {
        config.bridge_timeout_ms = cli.bridge_timeout_ms;
    }

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let _log_guard = logging::init(&config.log_dir)?;
    tracing::info!(
        socket = %config.socket_path.display(),
        demo = cli.demo,
        "timerdeck starting"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let connector: Box<dyn Connector> = if cli.demo {
        let host: Arc<dyn HostApi> = Arc::new(
            MemoryHost::new()
                .with_timers(vec![
                    Timer::new("f5", 1000u64, true),
                    Timer::new("backup", 3_600_000u64, false),
                ])
                .with_latency(DEMO_LATENCY),
        );
        Box::new(ReadyConnector::new(host))
    } else {
        Box::new(SocketConnector::new(config.socket_path.clone()))
    };
    let gate = BridgeGate::new(connector)
        .with_poll_interval(config.poll_interval())
        .with_timeout(config.bridge_timeout());

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let session = Session::new(gate, config.remove_missing).with_events(events_tx);
    let mut app = App::new(Arc::new(session), runtime.handle().clone());
    process(&mut app, Message::Startup);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the main loop
    let result = run_app(&mut terminal, &mut app, events_rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        tracing::error!(error = %e, "timerdeck exited with error");
    }
    runtime.shutdown_timeout(Duration::from_millis(500));
    tracing::info!("timerdeck stopped");

    result
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut events: UnboundedReceiver<SessionEvent>,
) -> anyhow::Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        // Render
        terminal.draw(|frame| ui::view(frame, app))?;

        // Fold in whatever the session published since the last frame
        while let Ok(event) = events.try_recv() {
            process(app, Message::Session(event));
        }

        // Handle events with timeout for tick
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                // Only handle Press events, ignore Release and Repeat
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                for msg in handle_key_event(key, app) {
                    process(app, msg);
                }
            }
        } else {
            // Tick for background updates
            app.update(Message::Tick);
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Apply a message and the commands it produces
fn process(app: &mut App, msg: Message) {
    let commands = app.update(msg);
    for cmd in commands {
        app.update(cmd);
    }
}

fn handle_key_event(key: KeyEvent, app: &App) -> Vec<Message> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Any key closes the help overlay
    if app.model.ui_state.show_help {
        return match key.code {
            KeyCode::Char('c') if ctrl => vec![Message::Quit],
            _ => vec![Message::ToggleHelp],
        };
    }

    // Global bindings
    match key.code {
        KeyCode::Char('c') if ctrl => return vec![Message::Quit],
        KeyCode::Char('r') if ctrl => return vec![Message::RefreshTimers],
        KeyCode::Esc => return vec![Message::Quit],
        KeyCode::Tab => return vec![Message::FocusNext],
        KeyCode::BackTab => return vec![Message::FocusPrev],
        KeyCode::F(1) => return vec![Message::ToggleHelp],
        KeyCode::F(2) => return vec![Message::CycleLanguage],
        KeyCode::F(3) => return vec![Message::RefreshTimers],
        KeyCode::F(5) => return vec![Message::StartTimers],
        KeyCode::F(6) => return vec![Message::StopTimers],
        _ => {}
    }

    match app.model.ui_state.focus {
        FocusArea::KeyInput | FocusArea::IntervalInput => handle_input_key(key),
        FocusArea::TimerTable => handle_table_key(key),
    }
}

fn handle_input_key(key: KeyEvent) -> Vec<Message> {
    match key.code {
        KeyCode::Enter => vec![Message::SubmitAddTimer],
        KeyCode::Backspace => vec![Message::InputBackspace],
        KeyCode::Delete => vec![Message::InputDelete],
        KeyCode::Left => vec![Message::InputLeft],
        KeyCode::Right => vec![Message::InputRight],
        KeyCode::Home => vec![Message::InputHome],
        KeyCode::End => vec![Message::InputEnd],
        KeyCode::Down => vec![Message::FocusNext],
        KeyCode::Up => vec![Message::FocusPrev],
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            vec![Message::InputChar(c)]
        }
        _ => vec![],
    }
}

fn handle_table_key(key: KeyEvent) -> Vec<Message> {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => vec![Message::SelectPrev],
        KeyCode::Down | KeyCode::Char('j') => vec![Message::SelectNext],
        KeyCode::Char(' ') | KeyCode::Enter => vec![Message::ToggleSelected],
        KeyCode::Char('d') | KeyCode::Delete => vec![Message::RemoveSelected],
        KeyCode::Char('a') | KeyCode::Char('i') => {
            vec![Message::FocusChanged(FocusArea::KeyInput)]
        }
        KeyCode::Char('s') => vec![Message::StartTimers],
        KeyCode::Char('x') => vec![Message::StopTimers],
        KeyCode::Char('l') => vec![Message::CycleLanguage],
        KeyCode::Char('r') => vec![Message::RefreshTimers],
        KeyCode::Char('?') => vec![Message::ToggleHelp],
        KeyCode::Char('q') => vec![Message::Quit],
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "timerdeck",
            "--socket",
            "/tmp/host.sock",
            "--bridge-timeout-ms",
            "2500",
            "--demo",
        ]);
        assert_eq!(cli.socket, Some(PathBuf::from("/tmp/host.sock")));
        assert_eq!(cli.bridge_timeout_ms, Some(2500));
        assert!(cli.demo);
        assert!(!cli.print_config);
    }

    #[test]
    fn test_input_keys_map_to_editing() {
        assert!(matches!(
            handle_input_key(key(KeyCode::Char('a')))[..],
            [Message::InputChar('a')]
        ));
        assert!(matches!(
            handle_input_key(key(KeyCode::Enter))[..],
            [Message::SubmitAddTimer]
        ));
        let ctrl_a = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert!(handle_input_key(ctrl_a).is_empty());
    }

    #[test]
    fn test_table_keys() {
        assert!(matches!(
            handle_table_key(key(KeyCode::Char(' ')))[..],
            [Message::ToggleSelected]
        ));
        assert!(matches!(
            handle_table_key(key(KeyCode::Char('d')))[..],
            [Message::RemoveSelected]
        ));
        assert!(matches!(
            handle_table_key(key(KeyCode::Char('j')))[..],
            [Message::SelectNext]
        ));
        assert!(matches!(
            handle_table_key(key(KeyCode::Char('a')))[..],
            [Message::FocusChanged(FocusArea::KeyInput)]
        ));
    }
}
