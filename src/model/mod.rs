use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

mod app_model;
mod mode;

pub use app_model::{AppModel, FocusArea, StatusKind, StatusMessage, TextInput};
pub use mode::{ModeMachine, UiMode};

/// Language identifier as served by the host (e.g. "en", "fr")
pub type LanguageCode = String;

/// A named, interval-scheduled unit of work executed by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub key: String,
    pub interval: TimerInterval,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Timer {
    pub fn new(
        key: impl Into<String>,
        interval: impl Into<TimerInterval>,
        is_active: bool,
    ) -> Self {
        Self {
            key: key.into(),
            interval: interval.into(),
            is_active,
        }
    }
}

/// Interval as the host reports it: numeric milliseconds or free text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimerInterval {
    Millis(u64),
    Text(String),
}

impl fmt::Display for TimerInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerInterval::Millis(ms) => write!(f, "{}", ms),
            TimerInterval::Text(text) => f.write_str(text),
        }
    }
}

impl From<u64> for TimerInterval {
    fn from(ms: u64) -> Self {
        TimerInterval::Millis(ms)
    }
}

impl From<&str> for TimerInterval {
    fn from(text: &str) -> Self {
        TimerInterval::Text(text.to_string())
    }
}

impl From<String> for TimerInterval {
    fn from(text: String) -> Self {
        TimerInterval::Text(text)
    }
}

/// Local read replica of the host's timer collection.
///
/// Only ever replaced wholesale from a successful fetch. There is no API for
/// patching individual timers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerList {
    timers: Vec<Timer>,
}

impl TimerList {
    /// Build a replica from a fetch result, keeping host order.
    /// Duplicate keys keep their first occurrence.
    pub fn from_fetch(fetched: Vec<Timer>) -> Self {
        let mut seen = HashSet::new();
        let mut timers = Vec::with_capacity(fetched.len());
        for timer in fetched {
            if seen.insert(timer.key.clone()) {
                timers.push(timer);
            } else {
                tracing::warn!(
                    key = %timer.key,
                    "host returned duplicate timer key, keeping first"
                );
            }
        }
        Self { timers }
    }

    pub fn timers(&self) -> &[Timer] {
        &self.timers
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&Timer> {
        self.timers.iter().find(|t| t.key == key)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.timers.iter().filter(|t| t.is_active).count()
    }
}
