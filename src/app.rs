use crate::i18n::TextKey;
use crate::message::Message;
use crate::model::{AppModel, FocusArea, StatusMessage};
use crate::session::{validate_new_timer, Session, SessionEvent};
use crate::view::Controls;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Application state and update logic (TEA pattern)
///
/// Host commands are spawned onto the runtime and never awaited here; their
/// outcome comes back as `Message::Session` events.
pub struct App {
    pub model: AppModel,
    pub should_quit: bool,
    session: Arc<Session>,
    runtime: Handle,
}

impl App {
    pub fn new(session: Arc<Session>, runtime: Handle) -> Self {
        Self {
            model: AppModel::default(),
            should_quit: false,
            session,
            runtime,
        }
    }

    fn controls(&self) -> Controls {
        self.model.panel.controls
    }

    /// Run a session command in the background
    fn spawn<F, Fut>(&self, command: F)
    where
        F: FnOnce(Arc<Session>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let session = Arc::clone(&self.session);
        self.runtime.spawn(command(session));
    }

    fn set_status(&mut self, status: StatusMessage) {
        self.model.ui_state.status_message = Some(status);
    }

    /// Controls are locked while timers run
    fn locked(&mut self) {
        self.set_status(StatusMessage::info("Stop the timers to edit"));
    }

    pub fn update(&mut self, msg: Message) -> Vec<Message> {
        let mut commands = Vec::new();

        match msg {
            Message::Startup => {
                self.set_status(StatusMessage::info("Waiting for host..."));
                self.spawn(|session| async move { session.startup().await });
            }

            Message::InputChar(c) => {
                if self.focused_input_enabled() {
                    if let Some(input) = self.model.ui_state.focused_input_mut() {
                        input.insert(c);
                    }
                }
            }
            Message::InputBackspace => {
                if self.focused_input_enabled() {
                    if let Some(input) = self.model.ui_state.focused_input_mut() {
                        input.backspace();
                    }
                }
            }
            Message::InputDelete => {
                if self.focused_input_enabled() {
                    if let Some(input) = self.model.ui_state.focused_input_mut() {
                        input.delete();
                    }
                }
            }
            Message::InputLeft => {
                if let Some(input) = self.model.ui_state.focused_input_mut() {
                    input.left();
                }
            }
            Message::InputRight => {
                if let Some(input) = self.model.ui_state.focused_input_mut() {
                    input.right();
                }
            }
            Message::InputHome => {
                if let Some(input) = self.model.ui_state.focused_input_mut() {
                    input.home();
                }
            }
            Message::InputEnd => {
                if let Some(input) = self.model.ui_state.focused_input_mut() {
                    input.end();
                }
            }
            Message::FocusNext => {
                self.model.ui_state.focus = self.model.ui_state.focus.next();
            }
            Message::FocusPrev => {
                self.model.ui_state.focus = self.model.ui_state.focus.prev();
            }
            Message::FocusChanged(focus) => {
                self.model.ui_state.focus = focus;
            }

            Message::SelectPrev => {
                if let Some(idx) = self.model.ui_state.selected_row {
                    self.model.ui_state.selected_row = Some(idx.saturating_sub(1));
                }
                self.model.clamp_selection();
            }
            Message::SelectNext => {
                self.model.ui_state.selected_row = Some(
                    self.model.ui_state.selected_row.map_or(0, |idx| idx + 1),
                );
                self.model.clamp_selection();
            }

            Message::SubmitAddTimer => {
                if !self.controls().add {
                    self.locked();
                    return commands;
                }
                let key = self.model.ui_state.key_input.value().to_string();
                let interval = self.model.ui_state.interval_input.value().to_string();
                // Rejected here, before anything is sent to the host
                if let Err(e) = validate_new_timer(&key, &interval) {
                    tracing::warn!(error = %e, "add timer rejected");
                    self.set_status(StatusMessage::error(e.to_string()));
                    return commands;
                }
                self.spawn(|session| async move {
                    let _ = session.add_timer(&key, &interval).await;
                });
            }
            Message::ToggleSelected => {
                if let Some(key) = self.model.selected_key() {
                    commands.push(Message::ToggleTimer(key.to_string()));
                }
            }
            Message::RemoveSelected => {
                if let Some(key) = self.model.selected_key() {
                    commands.push(Message::RemoveTimer(key.to_string()));
                }
            }
            Message::ToggleTimer(key) => {
                if !self.controls().rows {
                    self.locked();
                    return commands;
                }
                self.spawn(|session| async move {
                    let _ = session.toggle_timer(&key).await;
                });
            }
            Message::RemoveTimer(key) => {
                if !self.controls().rows {
                    self.locked();
                    return commands;
                }
                self.spawn(|session| async move {
                    let _ = session.remove_timer(&key).await;
                });
            }
            Message::StartTimers => {
                if self.controls().start {
                    self.spawn(|session| async move {
                        let _ = session.start().await;
                    });
                }
            }
            Message::StopTimers => {
                if self.controls().stop {
                    self.spawn(|session| async move {
                        let _ = session.stop().await;
                    });
                }
            }
            Message::RefreshTimers => {
                self.spawn(|session| async move {
                    let _ = session.refresh_timers().await;
                });
            }
            Message::CycleLanguage => {
                if let Some(next) = self.model.next_language() {
                    commands.push(Message::ChangeLanguage(next.clone()));
                }
            }
            Message::ChangeLanguage(code) => {
                self.spawn(|session| async move {
                    let _ = session.change_language(&code).await;
                });
            }

            Message::Session(event) => self.apply_session_event(event),

            Message::ToggleHelp => {
                self.model.ui_state.show_help = !self.model.ui_state.show_help;
            }
            Message::Tick => {
                let now = Utc::now();
                if self
                    .model
                    .ui_state
                    .status_message
                    .as_ref()
                    .is_some_and(|msg| msg.is_expired(now))
                {
                    self.model.ui_state.status_message = None;
                }
            }
            Message::Quit => {
                self.should_quit = true;
            }
        }

        commands
    }

    fn focused_input_enabled(&self) -> bool {
        let controls = self.controls();
        match self.model.ui_state.focus {
            FocusArea::KeyInput => controls.key_input,
            FocusArea::IntervalInput => controls.interval_input,
            FocusArea::TimerTable => false,
        }
    }

    /// Fold a session event into the model and re-project the panel
    fn apply_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::BridgeReady => {
                self.model.bridge_ready = true;
                self.set_status(StatusMessage::info("Connected to host"));
            }
            SessionEvent::TimersReplaced(timers) => {
                self.model.timers = timers;
                self.model
                    .panel
                    .render_rows(&self.model.timers, &self.model.translations);
                self.model.clamp_selection();
            }
            SessionEvent::TranslationsReplaced(table) => {
                self.model.panel.apply_static_text(&table);
                self.model.translations = table;
            }
            SessionEvent::LanguagesLoaded { available, current } => {
                self.model.languages = available;
                self.model.current_language = current;
            }
            SessionEvent::LanguageSelected(code) => {
                self.model.current_language = Some(code);
            }
            SessionEvent::ModeChanged(mode) => {
                self.model.mode = mode;
                self.model.panel.apply_controls(Controls::for_mode(mode));
            }
            SessionEvent::TimerAdded { key } => {
                self.model.ui_state.key_input.clear();
                let success = self.session.translations().text(TextKey::Success);
                self.set_status(StatusMessage::info(format!("{}: {}", success, key)));
            }
            SessionEvent::CommandFailed { command, message } => {
                let error = self.session.translations().text(TextKey::Error);
                self.set_status(StatusMessage::error(format!(
                    "{} ({}): {}",
                    error,
                    command.label(),
                    message
                )));
            }
        }
    }
}
