//! Translation table and the session-wide store that caches it

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use crate::host::{HostApi, HostError};

/// Fixed set of labels the panel displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TextKey {
    AppTitle,
    Language,
    Key,
    Interval,
    Add,
    Start,
    Stop,
    Active,
    Actions,
    Remove,
    Error,
    Success,
}

impl TextKey {
    pub const ALL: [TextKey; 12] = [
        TextKey::AppTitle,
        TextKey::Language,
        TextKey::Key,
        TextKey::Interval,
        TextKey::Add,
        TextKey::Start,
        TextKey::Stop,
        TextKey::Active,
        TextKey::Actions,
        TextKey::Remove,
        TextKey::Error,
        TextKey::Success,
    ];

    /// Wire name used by the host
    pub fn as_str(&self) -> &'static str {
        match self {
            TextKey::AppTitle => "app_title",
            TextKey::Language => "language",
            TextKey::Key => "key",
            TextKey::Interval => "interval",
            TextKey::Add => "add",
            TextKey::Start => "start",
            TextKey::Stop => "stop",
            TextKey::Active => "active",
            TextKey::Actions => "actions",
            TextKey::Remove => "remove",
            TextKey::Error => "error",
            TextKey::Success => "success",
        }
    }

    pub fn from_wire(name: &str) -> Option<TextKey> {
        TextKey::ALL.iter().copied().find(|k| k.as_str() == name)
    }
}

/// Localized strings for one language. Keys the host does not know about are
/// dropped on load; keys the host omits fall back to their wire name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct TranslationTable {
    entries: BTreeMap<TextKey, String>,
}

impl TranslationTable {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (TextKey, S)>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }

    pub fn text(&self, key: TextKey) -> &str {
        self.entries
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| key.as_str())
    }

    pub fn contains(&self, key: TextKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<BTreeMap<String, String>> for TranslationTable {
    fn from(raw: BTreeMap<String, String>) -> Self {
        let entries = raw
            .into_iter()
            .filter_map(|(name, text)| TextKey::from_wire(&name).map(|key| (key, text)))
            .collect();
        Self { entries }
    }
}

impl From<TranslationTable> for BTreeMap<String, String> {
    fn from(table: TranslationTable) -> Self {
        table
            .entries
            .into_iter()
            .map(|(key, text)| (key.as_str().to_string(), text))
            .collect()
    }
}

/// Cache of the current language's table, shared by the session.
///
/// The table is swapped as a whole; readers never see a mix of two languages.
#[derive(Debug, Default)]
pub struct TranslationStore {
    table: RwLock<TranslationTable>,
}

impl TranslationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the current language's table from the host and swap it in.
    /// On failure the previous table stays in place.
    pub async fn load(&self, host: &dyn HostApi) -> Result<TranslationTable, HostError> {
        let table = host.get_translations().await?;
        if table.is_empty() {
            tracing::warn!("host returned an empty translation table");
        } else {
            let missing: Vec<&str> = TextKey::ALL
                .iter()
                .filter(|key| !table.contains(**key))
                .map(|key| key.as_str())
                .collect();
            if !missing.is_empty() {
                tracing::debug!(?missing, "translation table is incomplete");
            }
        }
        self.replace(table.clone());
        Ok(table)
    }

    pub fn replace(&self, table: TranslationTable) {
        *self.table.write().unwrap_or_else(PoisonError::into_inner) = table;
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> TranslationTable {
        self.table.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn text(&self, key: TextKey) -> String {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .text(key)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ignores_unknown_keys() {
        let table: TranslationTable =
            serde_json::from_str(r#"{"remove":"Remove","tooltip":"ignored"}"#).unwrap();
        assert_eq!(table.text(TextKey::Remove), "Remove");
        assert!(!table.contains(TextKey::Add));
    }

    #[test]
    fn test_missing_key_falls_back_to_wire_name() {
        let table = TranslationTable::default();
        assert_eq!(table.text(TextKey::AppTitle), "app_title");
    }

    #[test]
    fn test_table_serializes_with_wire_names() {
        let table = TranslationTable::new([(TextKey::Stop, "Stop"), (TextKey::AppTitle, "Deck")]);
        let value = serde_json::to_value(&table).unwrap();
        assert_eq!(value["stop"], "Stop");
        assert_eq!(value["app_title"], "Deck");
    }

    #[test]
    fn test_store_replaces_wholesale() {
        let store = TranslationStore::new();
        store.replace(TranslationTable::new([(TextKey::Add, "Add"), (TextKey::Remove, "Remove")]));
        store.replace(TranslationTable::new([(TextKey::Add, "Ajouter")]));

        assert_eq!(store.text(TextKey::Add), "Ajouter");
        // no leftover from the previous language
        assert_eq!(store.text(TextKey::Remove), "remove");
    }

    #[test]
    fn test_wire_names_round_trip_through_from_wire() {
        for key in TextKey::ALL {
            assert_eq!(TextKey::from_wire(key.as_str()), Some(key));
        }
        assert_eq!(TextKey::from_wire("nope"), None);
    }
}
