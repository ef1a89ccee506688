//! Host bridge: the request/response interface to the timer-hosting process
//!
//! `HostApi` is the only way the panel reads or mutates timer state. Two
//! implementations exist: `HostClient` (JSON-RPC over a Unix socket) and
//! `MemoryHost` (in-process, used by `--demo` and the tests).

pub mod client;
pub mod memory;
pub mod protocol;

use async_trait::async_trait;
use thiserror::Error;

use crate::bridge::BridgeError;
use crate::i18n::TranslationTable;
use crate::model::{LanguageCode, Timer};

pub use client::HostClient;
pub use memory::MemoryHost;

/// Operations the host exposes. Every call is a round trip that may fail.
#[async_trait]
pub trait HostApi: Send + Sync {
    async fn ping(&self) -> Result<(), HostError>;
    async fn get_translations(&self) -> Result<TranslationTable, HostError>;
    async fn get_available_languages(&self) -> Result<Vec<LanguageCode>, HostError>;
    async fn get_language(&self) -> Result<LanguageCode, HostError>;
    async fn set_language(&self, code: &str) -> Result<(), HostError>;
    async fn get_timers(&self) -> Result<Vec<Timer>, HostError>;
    async fn add_timer(&self, key: &str, interval: &str) -> Result<(), HostError>;
    async fn remove_timer(&self, key: &str) -> Result<(), HostError>;
    async fn toggle_timer(&self, key: &str) -> Result<(), HostError>;
    async fn start_timers(&self) -> Result<(), HostError>;
    async fn stop_timers(&self) -> Result<(), HostError>;
}

/// Wire name of every host operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostMethod {
    Ping,
    GetTranslations,
    GetAvailableLanguages,
    GetLanguage,
    SetLanguage,
    GetTimers,
    AddTimer,
    RemoveTimer,
    ToggleTimer,
    StartTimers,
    StopTimers,
}

impl HostMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostMethod::Ping => "ping",
            HostMethod::GetTranslations => "get_translations",
            HostMethod::GetAvailableLanguages => "get_available_languages",
            HostMethod::GetLanguage => "get_language",
            HostMethod::SetLanguage => "set_language",
            HostMethod::GetTimers => "get_timers",
            HostMethod::AddTimer => "add_timer",
            HostMethod::RemoveTimer => "remove_timer",
            HostMethod::ToggleTimer => "toggle_timer",
            HostMethod::StartTimers => "start_timers",
            HostMethod::StopTimers => "stop_timers",
        }
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("host bridge unavailable: {0}")]
    Bridge(#[from] BridgeError),

    #[error("{method} rejected by host: {message} (code {code})")]
    Rejected {
        method: &'static str,
        code: i32,
        message: String,
    },

    #[error("host connection failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed host message: {0}")]
    Protocol(String),
}

impl From<serde_json::Error> for HostError {
    fn from(err: serde_json::Error) -> Self {
        HostError::Protocol(err.to_string())
    }
}

impl HostError {
    pub fn rejected(method: HostMethod, code: i32, message: impl Into<String>) -> Self {
        HostError::Rejected {
            method: method.as_str(),
            code,
            message: message.into(),
        }
    }

    /// The host reported that the addressed timer does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            HostError::Rejected { code, .. } if *code == protocol::error_codes::TIMER_NOT_FOUND
        )
    }

    /// The host does not implement the called method
    pub fn is_method_not_found(&self) -> bool {
        matches!(
            self,
            HostError::Rejected { code, .. } if *code == protocol::error_codes::METHOD_NOT_FOUND
        )
    }
}
