//! Request parameters, attachments and response DTOs.
//!
//! # Design
//! `ParameterSet` is the single representation of what gets sent: every
//! option setter writes one string value into it, and the encoder turns it
//! into a body. Keys are unique (last write wins) and iterate in the order
//! they were first inserted so multipart bodies are reproducible.
//!
//! The JSON DTOs keep any field they do not name in `extra`, so new server
//! fields are never silently dropped.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Serialize a boolean the way the API expects it.
pub fn serialize_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// String-keyed request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    entries: Vec<(String, String)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`. An overwritten key keeps its position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Overlay `other` on top of `self`.
    pub fn extend(&mut self, other: &ParameterSet) {
        for (k, v) in other.iter() {
            self.set(k, v);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ParameterSet::new();
        for (k, v) in iter {
            set.set(k, v);
        }
        set
    }
}

/// A multipart part whose content is read from a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub field: String,
    pub path: PathBuf,
}

impl FileAttachment {
    pub fn new(field: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            field: field.into(),
            path: path.into(),
        }
    }
}

/// A multipart part whose content is already in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryAttachment {
    pub field: String,
    pub bytes: Vec<u8>,
}

/// API usage report returned by the usage endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Usage {
    /// Conversions still available in the current period.
    #[serde(default)]
    pub available: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<serde_json::Value>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One match returned by a PDF text search.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct TextPosition {
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Position of an HTML element, matched by a CSS selector, in the resulting PDF.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct WebElement {
    #[serde(default)]
    pub page_index: u32,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
