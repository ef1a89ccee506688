use chrono::{DateTime, Duration, Utc};
use unicode_width::UnicodeWidthChar;

use super::{LanguageCode, TimerList, UiMode};
use crate::i18n::TranslationTable;
use crate::view::PanelView;

/// How long a status message stays in the status bar
pub const STATUS_MESSAGE_TTL_SECS: i64 = 6;

/// Application state following The Elm Architecture.
///
/// `timers`, `translations` and `mode` mirror the last values the session
/// published; `panel` is their projection.
#[derive(Debug, Default)]
pub struct AppModel {
    pub panel: PanelView,
    pub timers: TimerList,
    pub translations: TranslationTable,
    pub mode: UiMode,
    pub languages: Vec<LanguageCode>,
    pub current_language: Option<LanguageCode>,
    pub bridge_ready: bool,
    pub ui_state: UiState,
}

impl AppModel {
    pub fn selected_key(&self) -> Option<&str> {
        self.ui_state
            .selected_row
            .and_then(|idx| self.panel.table.rows.get(idx))
            .map(|row| row.key.as_str())
    }

    /// Language after the current one, wrapping around
    pub fn next_language(&self) -> Option<&LanguageCode> {
        if self.languages.is_empty() {
            return None;
        }
        let current_idx = self
            .current_language
            .as_ref()
            .and_then(|cur| self.languages.iter().position(|l| l == cur));
        let next_idx = match current_idx {
            Some(idx) => (idx + 1) % self.languages.len(),
            None => 0,
        };
        self.languages.get(next_idx)
    }

    /// Keep the row selection inside the table after it was rebuilt
    pub fn clamp_selection(&mut self) {
        let len = self.panel.table.rows.len();
        self.ui_state.selected_row = match self.ui_state.selected_row {
            _ if len == 0 => None,
            Some(idx) if idx >= len => Some(len - 1),
            Some(idx) => Some(idx),
            None => Some(0),
        };
    }
}

/// Which part of the panel receives key presses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusArea {
    #[default]
    KeyInput,
    IntervalInput,
    TimerTable,
}

impl FocusArea {
    pub fn next(self) -> FocusArea {
        match self {
            FocusArea::KeyInput => FocusArea::IntervalInput,
            FocusArea::IntervalInput => FocusArea::TimerTable,
            FocusArea::TimerTable => FocusArea::KeyInput,
        }
    }

    pub fn prev(self) -> FocusArea {
        match self {
            FocusArea::KeyInput => FocusArea::TimerTable,
            FocusArea::IntervalInput => FocusArea::KeyInput,
            FocusArea::TimerTable => FocusArea::IntervalInput,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    pub set_at: DateTime<Utc>,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Info,
            set_at: Utc::now(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Error,
            set_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.set_at >= Duration::seconds(STATUS_MESSAGE_TTL_SECS)
    }
}

/// UI state that only exists in the panel
#[derive(Debug, Default)]
pub struct UiState {
    pub focus: FocusArea,
    pub key_input: TextInput,
    pub interval_input: TextInput,
    pub selected_row: Option<usize>,
    pub status_message: Option<StatusMessage>,
    pub show_help: bool,
}

impl UiState {
    pub fn focused_input_mut(&mut self) -> Option<&mut TextInput> {
        match self.focus {
            FocusArea::KeyInput => Some(&mut self.key_input),
            FocusArea::IntervalInput => Some(&mut self.interval_input),
            FocusArea::TimerTable => None,
        }
    }
}

/// Single-line text field with a character cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
    /// Cursor position in chars
    cursor: usize,
}

impl TextInput {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let at = self.byte_offset(self.cursor - 1);
        self.value.remove(at);
        self.cursor -= 1;
    }

    pub fn delete(&mut self) {
        if self.cursor >= self.value.chars().count() {
            return;
        }
        let at = self.byte_offset(self.cursor);
        self.value.remove(at);
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    /// Display columns before the cursor (wide chars count double)
    pub fn cursor_column(&self) -> usize {
        self.value
            .chars()
            .take(self.cursor)
            .map(|c| c.width().unwrap_or(0))
            .sum()
    }

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }
}
