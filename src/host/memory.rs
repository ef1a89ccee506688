//! In-process host used by `--demo` and by the tests.
//!
//! Keeps timers in memory with the same semantics the real host has: add
//! appends, remove filters by key, toggle flips `is_active`, start/stop set a
//! running flag. Failures and latency can be injected per method.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::protocol::error_codes;
use super::{HostApi, HostError, HostMethod};
use crate::i18n::{TextKey, TranslationTable};
use crate::model::{LanguageCode, Timer, TimerInterval};

#[derive(Debug, Default)]
struct MemoryState {
    timers: Vec<Timer>,
    running: bool,
    language: LanguageCode,
    languages: Vec<LanguageCode>,
    /// Remaining injected failures per method
    failures: HashMap<HostMethod, usize>,
    calls: Vec<HostMethod>,
    strict_remove: bool,
    latency: Duration,
}

pub struct MemoryHost {
    state: Mutex<MemoryState>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                language: "en".to_string(),
                languages: builtin_languages().iter().map(|c| c.to_string()).collect(),
                ..MemoryState::default()
            }),
        }
    }

    pub fn with_timers(self, timers: Vec<Timer>) -> Self {
        self.lock().timers = timers;
        self
    }

    /// Delay every call by `latency`
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = latency;
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call, apply latency, and consume an injected failure
    async fn enter(&self, method: HostMethod) -> Result<(), HostError> {
        let latency = {
            let mut state = self.lock();
            state.calls.push(method);
            state.latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.lock();
        if let Some(remaining) = state.failures.get_mut(&method) {
            *remaining -= 1;
            if *remaining == 0 {
                state.failures.remove(&method);
            }
            return Err(HostError::rejected(
                method,
                error_codes::HOST_FAILURE,
                "injected failure",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
impl MemoryHost {
    /// Restrict the language list (codes must be built in)
    pub fn with_languages(self, codes: &[&str]) -> Self {
        self.lock().languages = codes.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_language(self, code: &str) -> Self {
        self.lock().language = code.to_string();
        self
    }

    /// Report a missing key on remove as `TIMER_NOT_FOUND` instead of succeeding
    pub fn with_strict_remove(self) -> Self {
        self.lock().strict_remove = true;
        self
    }

    pub fn fail_next(&self, method: HostMethod) {
        *self.lock().failures.entry(method).or_insert(0) += 1;
    }

    pub fn call_count(&self, method: HostMethod) -> usize {
        self.lock().calls.iter().filter(|m| **m == method).count()
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn timers(&self) -> Vec<Timer> {
        self.lock().timers.clone()
    }

    pub fn language(&self) -> LanguageCode {
        self.lock().language.clone()
    }
}

#[async_trait]
impl HostApi for MemoryHost {
    async fn ping(&self) -> Result<(), HostError> {
        self.enter(HostMethod::Ping).await
    }

    async fn get_translations(&self) -> Result<TranslationTable, HostError> {
        self.enter(HostMethod::GetTranslations).await?;
        let language = self.lock().language.clone();
        Ok(builtin_table(&language))
    }

    async fn get_available_languages(&self) -> Result<Vec<LanguageCode>, HostError> {
        self.enter(HostMethod::GetAvailableLanguages).await?;
        Ok(self.lock().languages.clone())
    }

    async fn get_language(&self) -> Result<LanguageCode, HostError> {
        self.enter(HostMethod::GetLanguage).await?;
        Ok(self.lock().language.clone())
    }

    async fn set_language(&self, code: &str) -> Result<(), HostError> {
        self.enter(HostMethod::SetLanguage).await?;
        let mut state = self.lock();
        if !state.languages.iter().any(|l| l == code) {
            return Err(HostError::rejected(
                HostMethod::SetLanguage,
                error_codes::INVALID_PARAMS,
                format!("unknown language '{}'", code),
            ));
        }
        state.language = code.to_string();
        Ok(())
    }

    async fn get_timers(&self) -> Result<Vec<Timer>, HostError> {
        self.enter(HostMethod::GetTimers).await?;
        Ok(self.lock().timers.clone())
    }

    async fn add_timer(&self, key: &str, interval: &str) -> Result<(), HostError> {
        self.enter(HostMethod::AddTimer).await?;
        let millis: u64 = interval.trim().parse().map_err(|_| {
            HostError::rejected(
                HostMethod::AddTimer,
                error_codes::INVALID_PARAMS,
                format!("interval '{}' is not a number of milliseconds", interval),
            )
        })?;

        let mut state = self.lock();
        if state.timers.iter().any(|t| t.key == key) {
            return Err(HostError::rejected(
                HostMethod::AddTimer,
                error_codes::DUPLICATE_KEY,
                format!("timer '{}' already exists", key),
            ));
        }
        state
            .timers
            .push(Timer::new(key, TimerInterval::Millis(millis), true));
        Ok(())
    }

    async fn remove_timer(&self, key: &str) -> Result<(), HostError> {
        self.enter(HostMethod::RemoveTimer).await?;
        let mut state = self.lock();
        let before = state.timers.len();
        state.timers.retain(|t| t.key != key);
        if state.timers.len() == before && state.strict_remove {
            return Err(HostError::rejected(
                HostMethod::RemoveTimer,
                error_codes::TIMER_NOT_FOUND,
                format!("no timer '{}'", key),
            ));
        }
        Ok(())
    }

    async fn toggle_timer(&self, key: &str) -> Result<(), HostError> {
        self.enter(HostMethod::ToggleTimer).await?;
        let mut state = self.lock();
        match state.timers.iter_mut().find(|t| t.key == key) {
            Some(timer) => {
                timer.is_active = !timer.is_active;
                Ok(())
            }
            None => Err(HostError::rejected(
                HostMethod::ToggleTimer,
                error_codes::TIMER_NOT_FOUND,
                format!("no timer '{}'", key),
            )),
        }
    }

    async fn start_timers(&self) -> Result<(), HostError> {
        self.enter(HostMethod::StartTimers).await?;
        self.lock().running = true;
        Ok(())
    }

    async fn stop_timers(&self) -> Result<(), HostError> {
        self.enter(HostMethod::StopTimers).await?;
        self.lock().running = false;
        Ok(())
    }
}

fn builtin_languages() -> [&'static str; 6] {
    ["en", "es", "pt", "zh", "fr", "de"]
}

/// String table for a built-in language; unknown codes get English
fn builtin_table(code: &str) -> TranslationTable {
    use TextKey::*;

    let texts: [&str; 12] = match code {
        "es" => [
            "TimerDeck", "Idioma", "Tecla", "Intervalo (ms)", "Agregar", "Iniciar",
            "Detener", "Activo", "Acciones", "Eliminar", "Ocurrió un error",
            "Operación exitosa",
        ],
        "pt" => [
            "TimerDeck", "Idioma", "Tecla", "Intervalo (ms)", "Adicionar", "Iniciar",
            "Parar", "Ativo", "Ações", "Remover", "Ocorreu um erro",
            "Operação bem-sucedida",
        ],
        "zh" => [
            "TimerDeck", "语言", "按键", "间隔 (毫秒)", "添加", "开始",
            "停止", "激活", "操作", "移除", "发生错误", "操作成功",
        ],
        "fr" => [
            "TimerDeck", "Langue", "Touche", "Intervalle (ms)", "Ajouter", "Démarrer",
            "Arrêter", "Actif", "Actions", "Supprimer", "Une erreur s'est produite",
            "Opération réussie",
        ],
        "de" => [
            "TimerDeck", "Sprache", "Taste", "Intervall (ms)", "Hinzufügen", "Starten",
            "Stoppen", "Aktiv", "Aktionen", "Entfernen", "Ein Fehler ist aufgetreten",
            "Operation erfolgreich",
        ],
        _ => [
            "TimerDeck", "Language", "Key", "Interval (ms)", "Add", "Start", "Stop",
            "Active", "Actions", "Remove", "An error occurred", "Operation successful",
        ],
    };

    let keys = [
        AppTitle, Language, Key, Interval, Add, Start, Stop, Active, Actions, Remove, Error,
        Success,
    ];
    TranslationTable::new(keys.into_iter().zip(texts))
}
