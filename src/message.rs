use crate::model::{FocusArea, LanguageCode};
use crate::session::SessionEvent;

/// Messages that can be dispatched to update application state (TEA pattern)
#[derive(Debug, Clone)]
pub enum Message {
    /// Wait for the host, then load languages, translations and timers
    Startup,

    // Form editing
    InputChar(char),
    InputBackspace,
    InputDelete,
    InputLeft,
    InputRight,
    InputHome,
    InputEnd,
    FocusNext,
    FocusPrev,
    FocusChanged(FocusArea),

    // Timer table navigation
    SelectPrev,
    SelectNext,

    // Commands sent to the host
    /// Add a timer from the key/interval fields
    SubmitAddTimer,
    ToggleSelected,
    RemoveSelected,
    ToggleTimer(String),
    RemoveTimer(String),
    StartTimers,
    StopTimers,
    RefreshTimers,
    /// Switch to the next available language
    CycleLanguage,
    ChangeLanguage(LanguageCode),

    /// State change published by the session
    Session(SessionEvent),

    // UI events
    ToggleHelp,
    Tick,
    Quit,
}
