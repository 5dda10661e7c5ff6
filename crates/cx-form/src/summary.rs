//! Per-leaf change summary
//!
//! Tracks for every leaf path the value it first had, the value before the
//! latest change and the current value. Driven by document transitions.

use cx_path::flatten;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Change state of one leaf
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryEntry {
    pub original_value: Value,
    pub previous_value: Option<Value>,
    pub current_value: Value,
    pub pristine: bool,
    pub dirty: bool,
}

impl SummaryEntry {
    fn appeared(value: &Value) -> Self {
        Self {
            original_value: value.clone(),
            previous_value: None,
            current_value: value.clone(),
            pristine: true,
            dirty: false,
        }
    }
}

impl Default for SummaryEntry {
    fn default() -> Self {
        Self::appeared(&Value::Null)
    }
}

/// Leaf path → summary entry
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormSummary {
    entries: IndexMap<String, SummaryEntry>,
}

impl FormSummary {
    /// Create an empty summary
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Summary of a document seen for the first time
    #[must_use]
    pub fn seeded(document: &Value) -> Self {
        let mut summary = Self::new();
        summary.transition(None, document);
        summary
    }

    /// Advance from `previous` to `current`
    ///
    /// Leaves are classified as new, deleted or persisted by comparing the
    /// flattened documents, then reconciled with what is already known:
    /// an unknown persisted leaf counts as new, a deleted leaf that is no
    /// longer known is skipped, and a new leaf that is already known counts
    /// as persisted.
    pub fn transition(&mut self, previous: Option<&Value>, current: &Value) {
        let current_flat = flatten(current, None);
        let previous_flat = previous.map(|p| flatten(p, None)).unwrap_or_default();

        for path in previous_flat.keys() {
            if !current_flat.contains_key(path) {
                self.entries.shift_remove(path);
            }
        }

        for (path, value) in &current_flat {
            match self.entries.get_mut(path) {
                None => {
                    self.entries
                        .insert(path.clone(), SummaryEntry::appeared(value));
                }
                Some(entry) => advance(entry, previous_flat.get(path), value),
            }
        }
    }

    /// Entry for a leaf path
    #[inline]
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&SummaryEntry> {
        self.entries.get(path)
    }

    /// Whether any leaf differs from its original value
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.entries.values().any(|e| e.dirty)
    }

    /// Leaf paths that differ from their original value
    #[must_use]
    pub fn dirty_paths(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, e)| e.dirty)
            .map(|(path, _)| path.as_str())
            .collect()
    }

    /// Iterate entries in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SummaryEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of summarized leaves
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no leaf is summarized
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn advance(entry: &mut SummaryEntry, previous: Option<&Value>, current: &Value) {
    if previous != Some(current) {
        entry.previous_value = previous.cloned();
    }
    entry.current_value = current.clone();
    entry.dirty = entry.original_value != *current;
    entry.pristine = !entry.dirty;
}
