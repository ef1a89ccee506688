//! Pure projection of session state into what the panel displays.
//!
//! Nothing here touches the terminal; `ui` draws a `PanelView` as-is.

use crate::i18n::{TextKey, TranslationTable};
use crate::model::{TimerList, UiMode};

/// Enablement of every interactive control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub key_input: bool,
    pub interval_input: bool,
    pub add: bool,
    /// Per-row checkboxes and remove buttons
    pub rows: bool,
    pub start: bool,
    pub stop: bool,
}

impl Controls {
    pub fn for_mode(mode: UiMode) -> Self {
        let editing = mode == UiMode::Editing;
        Self {
            key_input: editing,
            interval_input: editing,
            add: editing,
            rows: editing,
            start: editing,
            stop: !editing,
        }
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::for_mode(UiMode::default())
    }
}

/// Fixed labels: title, form, column headers, buttons
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StaticLabels {
    pub title: String,
    pub language: String,
    pub key_field: String,
    pub interval_field: String,
    pub add: String,
    pub start: String,
    pub stop: String,
    pub col_active: String,
    pub col_key: String,
    pub col_interval: String,
    pub col_actions: String,
}

impl StaticLabels {
    pub fn from_table(table: &TranslationTable) -> Self {
        Self {
            title: table.text(TextKey::AppTitle).to_string(),
            language: table.text(TextKey::Language).to_string(),
            key_field: format!("{}:", table.text(TextKey::Key)),
            interval_field: format!("{}:", table.text(TextKey::Interval)),
            add: table.text(TextKey::Add).to_string(),
            start: table.text(TextKey::Start).to_string(),
            stop: table.text(TextKey::Stop).to_string(),
            col_active: table.text(TextKey::Active).to_string(),
            col_key: table.text(TextKey::Key).to_string(),
            col_interval: table.text(TextKey::Interval).to_string(),
            col_actions: table.text(TextKey::Actions).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub checked: bool,
    pub key: String,
    pub interval: String,
    pub remove_label: String,
    pub toggle_enabled: bool,
    pub remove_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimerTable {
    pub rows: Vec<RowView>,
}

/// Build the timer table from the replica, in host order
pub fn render(
    timers: &TimerList,
    translations: &TranslationTable,
    controls: Controls,
) -> TimerTable {
    let remove_label = translations.text(TextKey::Remove);
    let rows = timers
        .timers()
        .iter()
        .map(|timer| RowView {
            checked: timer.is_active,
            key: timer.key.clone(),
            interval: timer.interval.to_string(),
            remove_label: remove_label.to_string(),
            toggle_enabled: controls.rows,
            remove_enabled: controls.rows,
        })
        .collect();
    TimerTable { rows }
}

/// Everything the panel shows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelView {
    pub labels: StaticLabels,
    pub table: TimerTable,
    pub controls: Controls,
}

impl PanelView {
    /// Push the current table's labels into the view, including the remove
    /// button of every row already drawn
    pub fn apply_static_text(&mut self, translations: &TranslationTable) {
        self.labels = StaticLabels::from_table(translations);
        let remove_label = translations.text(TextKey::Remove);
        for row in &mut self.table.rows {
            row.remove_label = remove_label.to_string();
        }
    }

    pub fn apply_controls(&mut self, controls: Controls) {
        self.controls = controls;
        for row in &mut self.table.rows {
            row.toggle_enabled = controls.rows;
            row.remove_enabled = controls.rows;
        }
    }

    pub fn render_rows(&mut self, timers: &TimerList, translations: &TranslationTable) {
        self.table = render(timers, translations, self.controls);
    }
}
