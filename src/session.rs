//! Session context: command dispatch and replica synchronization
//!
//! A `Session` owns everything one panel needs to talk to the host: the
//! readiness gate, the translation store, the timer replica and the mode
//! machine. Commands follow one protocol: validate input, wait for the bridge,
//! call the host, then on success re-fetch the replica. Failures are logged,
//! published as `SessionEvent::CommandFailed`, and leave local state as it was.
//!
//! Subscribers (the TUI) receive `SessionEvent`s and never read host state
//! directly.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::bridge::BridgeGate;
use crate::host::{HostApi, HostError};
use crate::i18n::{TranslationStore, TranslationTable};
use crate::model::{LanguageCode, ModeMachine, TimerList, UiMode};

/// How a host `TIMER_NOT_FOUND` on remove is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RemoveMissing {
    /// The timer is gone either way; refresh as after a normal remove
    #[default]
    Succeed,
    /// Surface the rejection like any other host failure
    Fail,
}

/// Commands a session runs, for logging and failure reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Startup,
    LoadLanguages,
    LoadTranslations,
    ChangeLanguage,
    Refresh,
    AddTimer,
    RemoveTimer,
    ToggleTimer,
    Start,
    Stop,
}

impl Command {
    pub fn label(&self) -> &'static str {
        match self {
            Command::Startup => "startup",
            Command::LoadLanguages => "load languages",
            Command::LoadTranslations => "load translations",
            Command::ChangeLanguage => "change language",
            Command::Refresh => "refresh timers",
            Command::AddTimer => "add timer",
            Command::RemoveTimer => "remove timer",
            Command::ToggleTimer => "toggle timer",
            Command::Start => "start timers",
            Command::Stop => "stop timers",
        }
    }
}

/// State changes published to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    BridgeReady,
    TimersReplaced(TimerList),
    TranslationsReplaced(TranslationTable),
    LanguagesLoaded {
        available: Vec<LanguageCode>,
        current: Option<LanguageCode>,
    },
    LanguageSelected(LanguageCode),
    ModeChanged(UiMode),
    TimerAdded {
        key: String,
    },
    CommandFailed {
        command: Command,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please enter a key")]
    MissingKey,
    #[error("please enter an interval")]
    MissingInterval,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Check a new timer's fields before anything is sent to the host.
/// Only empty fields are rejected; the values go to the host as typed.
pub fn validate_new_timer(key: &str, interval: &str) -> Result<(), ValidationError> {
    if key.is_empty() {
        return Err(ValidationError::MissingKey);
    }
    if interval.is_empty() {
        return Err(ValidationError::MissingInterval);
    }
    Ok(())
}

pub struct Session {
    gate: BridgeGate,
    translations: TranslationStore,
    timers: RwLock<TimerList>,
    mode: Mutex<ModeMachine>,
    remove_missing: RemoveMissing,
    events: Option<UnboundedSender<SessionEvent>>,
}

impl Session {
    pub fn new(gate: BridgeGate, remove_missing: RemoveMissing) -> Self {
        Self {
            gate,
            translations: TranslationStore::new(),
            timers: RwLock::new(TimerList::default()),
            mode: Mutex::new(ModeMachine::default()),
            remove_missing,
            events: None,
        }
    }

    /// Publish state changes on `events`
    pub fn with_events(mut self, events: UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    #[cfg(test)]
    pub fn timers(&self) -> TimerList {
        self.timers.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn translations(&self) -> &TranslationStore {
        &self.translations
    }

    /// Mode the controls should currently reflect
    pub fn mode(&self) -> UiMode {
        self.mode.lock().unwrap_or_else(PoisonError::into_inner).displayed()
    }

    /// Initial population: languages, translations, then the timer list.
    /// Each step reports its own failure; a failed step does not stop the next.
    pub async fn startup(&self) {
        if let Err(e) = self.host().await {
            let _ = self.report::<()>(Command::Startup, Err(e.into()));
            return;
        }
        self.emit(SessionEvent::BridgeReady);
        self.emit(SessionEvent::ModeChanged(self.mode()));

        let _ = self.populate_languages().await;
        let _ = self.load_translations().await;
        let _ = self.refresh_timers().await;
    }

    pub async fn populate_languages(&self) -> Result<Vec<LanguageCode>, CommandError> {
        let result = async {
            let host = self.host().await?;
            let available = host.get_available_languages().await?;
            let current = match host.get_language().await {
                Ok(code) => Some(code),
                // Older hosts do not report the current language
                Err(e) if e.is_method_not_found() => None,
                Err(e) => {
                    tracing::warn!(error = %e, "host did not report current language");
                    None
                }
            };
            self.emit(SessionEvent::LanguagesLoaded {
                available: available.clone(),
                current,
            });
            Ok::<_, CommandError>(available)
        }
        .await;
        self.report(Command::LoadLanguages, result)
    }

    /// Fetch the current language's table and swap it into the store
    pub async fn load_translations(&self) -> Result<(), CommandError> {
        let result = async {
            let host = self.host().await?;
            let table = self.translations.load(host.as_ref()).await?;
            self.emit(SessionEvent::TranslationsReplaced(table));
            Ok::<_, CommandError>(())
        }
        .await;
        self.report(Command::LoadTranslations, result)
    }

    /// Persist a new language on the host, then reload the table
    pub async fn change_language(&self, code: &str) -> Result<(), CommandError> {
        let result = async {
            let host = self.host().await?;
            host.set_language(code).await?;
            tracing::info!(language = code, "language changed");
            self.emit(SessionEvent::LanguageSelected(code.to_string()));
            Ok::<_, CommandError>(())
        }
        .await;
        self.report(Command::ChangeLanguage, result)?;
        self.load_translations().await
    }

    /// Re-fetch the whole timer collection and replace the replica.
    /// On failure the previous replica stays untouched.
    pub async fn refresh_timers(&self) -> Result<(), CommandError> {
        let result = async {
            let host = self.host().await?;
            let fetched = TimerList::from_fetch(host.get_timers().await?);
            {
                // Publish under the write lock so events arrive in write order
                let mut replica = self.timers.write().unwrap_or_else(PoisonError::into_inner);
                *replica = fetched.clone();
                tracing::debug!(count = fetched.len(), "timer replica replaced");
                self.emit(SessionEvent::TimersReplaced(fetched));
            }
            Ok::<_, CommandError>(())
        }
        .await;
        self.report(Command::Refresh, result)
    }

    pub async fn add_timer(&self, key: &str, interval: &str) -> Result<(), CommandError> {
        let result = async {
            validate_new_timer(key, interval)?;
            let host = self.host().await?;
            host.add_timer(key, interval).await?;
            tracing::info!(key, interval, "timer added");
            self.emit(SessionEvent::TimerAdded {
                key: key.to_string(),
            });
            Ok::<_, CommandError>(())
        }
        .await;
        self.report(Command::AddTimer, result)?;
        let _ = self.refresh_timers().await;
        Ok(())
    }

    pub async fn remove_timer(&self, key: &str) -> Result<(), CommandError> {
        let result = async {
            let host = self.host().await?;
            match host.remove_timer(key).await {
                Ok(()) => tracing::info!(key, "timer removed"),
                Err(e) if e.is_not_found() && self.remove_missing == RemoveMissing::Succeed => {
                    tracing::debug!(key, "remove of unknown timer treated as success");
                }
                Err(e) => return Err(e.into()),
            }
            Ok::<_, CommandError>(())
        }
        .await;
        self.report(Command::RemoveTimer, result)?;
        let _ = self.refresh_timers().await;
        Ok(())
    }

    pub async fn toggle_timer(&self, key: &str) -> Result<(), CommandError> {
        let result = async {
            let host = self.host().await?;
            host.toggle_timer(key).await?;
            tracing::info!(key, "timer toggled");
            Ok::<_, CommandError>(())
        }
        .await;
        self.report(Command::ToggleTimer, result)?;
        let _ = self.refresh_timers().await;
        Ok(())
    }

    /// Lock the controls and ask the host to run timers.
    /// The lock is shown before the host answers and lifted again on failure.
    pub async fn start(&self) -> Result<(), CommandError> {
        self.switch_mode(UiMode::Running).await
    }

    /// Unlock the controls and ask the host to stop timers.
    /// On failure the controls are locked again.
    pub async fn stop(&self) -> Result<(), CommandError> {
        self.switch_mode(UiMode::Editing).await
    }

    async fn switch_mode(&self, target: UiMode) -> Result<(), CommandError> {
        let command = match target {
            UiMode::Running => Command::Start,
            UiMode::Editing => Command::Stop,
        };

        self.transition(|m| m.request(target));

        let result = async {
            let host = self.host().await?;
            match target {
                UiMode::Running => host.start_timers().await?,
                UiMode::Editing => host.stop_timers().await?,
            }
            Ok::<_, CommandError>(())
        }
        .await;

        match &result {
            Ok(()) => {
                tracing::info!("{}: confirmed by host", command.label());
                self.transition(|m| m.confirm(target));
            }
            Err(_) => self.transition(|m| m.reject(target)),
        }

        self.report(command, result)
    }

    async fn host(&self) -> Result<Arc<dyn HostApi>, HostError> {
        Ok(self.gate.acquire().await?)
    }

    /// Apply a mode transition and publish the mode it leaves displayed.
    /// The event is sent under the lock so subscribers see transitions in order.
    fn transition(&self, f: impl FnOnce(&mut ModeMachine) -> UiMode) {
        let mut machine = self.mode.lock().unwrap_or_else(PoisonError::into_inner);
        let shown = f(&mut machine);
        self.emit(SessionEvent::ModeChanged(shown));
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(events) = &self.events {
            // Receiver gone means the UI is shutting down
            let _ = events.send(event);
        }
    }

    /// Log and publish a failed command, passing the result through
    fn report<T>(
        &self,
        command: Command,
        result: Result<T, CommandError>,
    ) -> Result<T, CommandError> {
        if let Err(e) = &result {
            match e {
                CommandError::Validation(_) => {
                    tracing::warn!(
                        command = command.label(),
                        error = %e,
                        "command rejected locally"
                    )
                }
                CommandError::Host(_) => {
                    tracing::error!(command = command.label(), error = %e, "command failed")
                }
            }
            self.emit(SessionEvent::CommandFailed {
                command,
                message: e.to_string(),
            });
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::ReadyConnector;
    use crate::host::{HostMethod, MemoryHost};
    use crate::i18n::TextKey;
    use crate::model::Timer;
    use crate::view::{self, Controls};
    use std::time::Duration;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn session_with(
        host: &Arc<MemoryHost>,
        policy: RemoveMissing,
    ) -> (Session, UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let host: Arc<dyn HostApi> = host.clone();
        let gate = BridgeGate::new(Box::new(ReadyConnector::new(host)));
        (Session::new(gate, policy).with_events(tx), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn backup_host() -> Arc<MemoryHost> {
        Arc::new(
            MemoryHost::new()
                .with_languages(&["en", "fr"])
                .with_language("en")
                .with_timers(vec![Timer::new("backup", "3600", true)]),
        )
    }

    #[tokio::test]
    async fn test_initial_load_scenario() {
        let host = backup_host();
        let (session, mut rx) = session_with(&host, RemoveMissing::Succeed);

        session.startup().await;

        let events = drain(&mut rx);
        assert!(events.contains(&SessionEvent::LanguagesLoaded {
            available: vec!["en".to_string(), "fr".to_string()],
            current: Some("en".to_string()),
        }));

        let controls = Controls::for_mode(session.mode());
        let table = view::render(&session.timers(), &session.translations().snapshot(), controls);
        assert_eq!(table.rows.len(), 1);
        let row = &table.rows[0];
        assert!(row.checked);
        assert_eq!(row.key, "backup");
        assert_eq!(row.interval, "3600");
        assert_eq!(row.remove_label, "Remove");

        assert_eq!(session.mode(), UiMode::Editing);
        assert!(controls.start);
        assert!(!controls.stop);
    }

    #[tokio::test]
    async fn test_toggle_unchecks_after_refresh() {
        let host = backup_host();
        let (session, _rx) = session_with(&host, RemoveMissing::Succeed);
        session.startup().await;

        session.toggle_timer("backup").await.unwrap();

        let table = view::render(
            &session.timers(),
            &session.translations().snapshot(),
            Controls::for_mode(session.mode()),
        );
        assert!(!table.rows[0].checked);
    }

    #[tokio::test]
    async fn test_failed_start_restores_every_control() {
        let host = backup_host();
        let (session, mut rx) = session_with(&host, RemoveMissing::Succeed);
        session.startup().await;
        let before = Controls::for_mode(session.mode());

        host.fail_next(HostMethod::StartTimers);
        assert!(session.start().await.is_err());

        let after = Controls::for_mode(session.mode());
        assert_eq!(after, before);
        assert!(after.key_input && after.interval_input && after.add && after.start);
        assert!(!after.stop);

        let table = view::render(&session.timers(), &session.translations().snapshot(), after);
        assert!(table.rows.iter().all(|r| r.toggle_enabled && r.remove_enabled));

        let events = drain(&mut rx);
        let modes: Vec<UiMode> = events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::ModeChanged(mode) => Some(*mode),
                _ => None,
            })
            .collect();
        // initial, optimistic, rollback
        assert_eq!(modes, vec![UiMode::Editing, UiMode::Running, UiMode::Editing]);
        assert!(events.iter().any(|e| matches!(
            e,
            SessionEvent::CommandFailed { command: Command::Start, .. }
        )));
    }

    #[tokio::test]
    async fn test_failed_stop_rolls_forward_to_running() {
        let host = backup_host();
        let (session, _rx) = session_with(&host, RemoveMissing::Succeed);
        session.start().await.unwrap();
        let before = Controls::for_mode(session.mode());
        assert_eq!(session.mode(), UiMode::Running);

        host.fail_next(HostMethod::StopTimers);
        assert!(session.stop().await.is_err());

        assert_eq!(session.mode(), UiMode::Running);
        assert_eq!(Controls::for_mode(session.mode()), before);
        assert!(host.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_optimistic() {
        let host = Arc::new(MemoryHost::new().with_latency(Duration::from_millis(50)));
        let (session, _rx) = session_with(&host, RemoveMissing::Succeed);
        let session = Arc::new(session);

        let pending = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.start().await }
        });
        tokio::task::yield_now().await;

        // host has not answered yet
        assert!(!host.is_running());
        assert_eq!(session.mode(), UiMode::Running);

        pending.await.unwrap().unwrap();
        assert!(host.is_running());
        assert_eq!(session.mode(), UiMode::Running);
    }

    #[tokio::test]
    async fn test_add_validation_never_reaches_host() {
        let host = backup_host();
        let (session, mut rx) = session_with(&host, RemoveMissing::Succeed);

        let err = session.add_timer("", "5").await.unwrap_err();
        assert!(matches!(err, CommandError::Validation(ValidationError::MissingKey)));
        let err = session.add_timer("k", "").await.unwrap_err();
        assert!(matches!(err, CommandError::Validation(ValidationError::MissingInterval)));

        assert_eq!(host.call_count(HostMethod::AddTimer), 0);
        assert_eq!(host.call_count(HostMethod::GetTimers), 0);
        let failures = drain(&mut rx)
            .into_iter()
            .filter(|e| {
                matches!(e, SessionEvent::CommandFailed { command: Command::AddTimer, .. })
            })
            .count();
        assert_eq!(failures, 2);
    }

    #[tokio::test]
    async fn test_add_refreshes_and_announces_key() {
        let host = backup_host();
        let (session, mut rx) = session_with(&host, RemoveMissing::Succeed);

        session.add_timer("f5", "250").await.unwrap();

        assert_eq!(host.timers().last().unwrap().key, "f5");
        assert!(session.timers().get("f5").is_some());
        let events = drain(&mut rx);
        assert!(events.contains(&SessionEvent::TimerAdded { key: "f5".to_string() }));
    }

    #[tokio::test]
    async fn test_whitespace_key_is_sent_as_typed() {
        let host = backup_host();
        let (session, _rx) = session_with(&host, RemoveMissing::Succeed);

        session.add_timer(" ", "100").await.unwrap();
        session.add_timer(" f5 ", "250").await.unwrap();

        assert_eq!(host.call_count(HostMethod::AddTimer), 2);
        let keys: Vec<String> = host.timers().into_iter().map(|t| t.key).collect();
        assert_eq!(keys, vec!["backup", " ", " f5 "]);
        assert!(session.timers().get(" ").is_some());
    }

    #[tokio::test]
    async fn test_remove_existing_timer_drops_its_row() {
        let host = backup_host();
        let (session, mut rx) = session_with(&host, RemoveMissing::Fail);
        session.startup().await;
        host.add_timer("f5", "250").await.unwrap();
        session.refresh_timers().await.unwrap();
        drain(&mut rx);

        session.remove_timer("backup").await.unwrap();

        assert!(host.timers().iter().all(|t| t.key != "backup"));
        let table = view::render(
            &session.timers(),
            &session.translations().snapshot(),
            Controls::for_mode(session.mode()),
        );
        let keys: Vec<&str> = table.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["f5"]);

        let events = drain(&mut rx);
        assert!(matches!(
            events.last(),
            Some(SessionEvent::TimersReplaced(list)) if list.len() == 1
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_refreshes_publish_in_write_order() {
        let host = backup_host();
        let (session, mut rx) = session_with(&host, RemoveMissing::Succeed);
        let session = Arc::new(session);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let session = Arc::clone(&session);
                tokio::spawn(async move { session.refresh_timers().await })
            })
            .collect();
        host.add_timer("f5", "250").await.unwrap();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let last_published = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::TimersReplaced(list) => Some(list),
                _ => None,
            })
            .last()
            .unwrap();
        assert_eq!(last_published, session.timers());
    }

    #[tokio::test]
    async fn test_refresh_replaces_rather_than_merges() {
        let host = backup_host();
        let (session, _rx) = session_with(&host, RemoveMissing::Succeed);
        session.refresh_timers().await.unwrap();

        // another client changes the host behind our back
        host.remove_timer("backup").await.unwrap();
        host.add_timer("f1", "10").await.unwrap();
        host.add_timer("f2", "20").await.unwrap();

        session.refresh_timers().await.unwrap();
        let keys: Vec<String> = session.timers().timers().iter().map(|t| t.key.clone()).collect();
        assert_eq!(keys, vec!["f1", "f2"]);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_replica() {
        let host = backup_host();
        let (session, mut rx) = session_with(&host, RemoveMissing::Succeed);
        session.refresh_timers().await.unwrap();
        let before = session.timers();
        drain(&mut rx);

        host.add_timer("f1", "10").await.unwrap();
        host.fail_next(HostMethod::GetTimers);
        assert!(session.refresh_timers().await.is_err());

        assert_eq!(session.timers(), before);
        let events = drain(&mut rx);
        assert!(!events.iter().any(|e| matches!(e, SessionEvent::TimersReplaced(_))));
    }

    #[tokio::test]
    async fn test_failed_toggle_does_not_refresh() {
        let host = backup_host();
        let (session, _rx) = session_with(&host, RemoveMissing::Succeed);
        session.refresh_timers().await.unwrap();

        host.fail_next(HostMethod::ToggleTimer);
        assert!(session.toggle_timer("backup").await.is_err());

        assert_eq!(host.call_count(HostMethod::GetTimers), 1);
        assert!(session.timers().get("backup").unwrap().is_active);
    }

    #[tokio::test]
    async fn test_remove_missing_key_follows_policy() {
        let host = Arc::new(MemoryHost::new().with_strict_remove());

        let (lenient, _rx) = session_with(&host, RemoveMissing::Succeed);
        assert!(lenient.remove_timer("ghost").await.is_ok());
        assert_eq!(host.call_count(HostMethod::GetTimers), 1);

        let (strict, _rx) = session_with(&host, RemoveMissing::Fail);
        let err = strict.remove_timer("ghost").await.unwrap_err();
        assert!(matches!(err, CommandError::Host(ref e) if e.is_not_found()));
        assert_eq!(host.call_count(HostMethod::GetTimers), 1);
    }

    #[tokio::test]
    async fn test_change_language_reloads_table() {
        let host = backup_host();
        let (session, mut rx) = session_with(&host, RemoveMissing::Succeed);
        session.startup().await;
        drain(&mut rx);

        session.change_language("fr").await.unwrap();

        assert_eq!(host.language(), "fr");
        assert_eq!(session.translations().text(TextKey::Remove), "Supprimer");
        let events = drain(&mut rx);
        assert_eq!(events[0], SessionEvent::LanguageSelected("fr".to_string()));
        assert!(matches!(events[1], SessionEvent::TranslationsReplaced(_)));
    }

    #[tokio::test]
    async fn test_rejected_language_keeps_table() {
        let host = backup_host();
        let (session, _rx) = session_with(&host, RemoveMissing::Succeed);
        session.load_translations().await.unwrap();

        assert!(session.change_language("de").await.is_err());
        assert_eq!(session.translations().text(TextKey::Remove), "Remove");
        assert_eq!(host.call_count(HostMethod::GetTranslations), 1);
    }

    #[test]
    fn test_validate_rejects_only_empty_fields() {
        assert_eq!(validate_new_timer(" ", " 10 "), Ok(()));
        assert_eq!(validate_new_timer("", "10"), Err(ValidationError::MissingKey));
        assert_eq!(validate_new_timer("a", ""), Err(ValidationError::MissingInterval));
    }
}
