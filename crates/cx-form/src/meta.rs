//! Per-leaf meta tracking
//!
//! Records, for each leaf path, the raw value last written (before any
//! repair), when it last changed and whether an input element is bound to
//! it. Entries are keyed and stamped with the leaf path.

use chrono::{DateTime, Utc};
use cx_path::{flatten, reconstruct, resolve, FlatMap};
use cx_schema::FormKey;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Meta state of one leaf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaEntry {
    pub form_key: FormKey,
    pub path: String,
    pub raw_value: Value,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_connected: bool,
}

impl MetaEntry {
    /// Blank entry for a path nothing has touched
    #[must_use]
    pub fn blank(form_key: FormKey, path: impl Into<String>) -> Self {
        Self {
            form_key,
            path: path.into(),
            raw_value: Value::Null,
            updated_at: None,
            is_connected: false,
        }
    }
}

/// One meta update request
#[derive(Debug, Clone)]
pub struct MetaUpdate<'a> {
    raw_value: &'a Value,
    base_path: Option<&'a str>,
    is_connected: Option<bool>,
    update_time: bool,
    now: Option<DateTime<Utc>>,
}

impl<'a> MetaUpdate<'a> {
    /// Update recording `raw_value`, stamping time on change
    #[must_use]
    pub fn new(raw_value: &'a Value) -> Self {
        Self {
            raw_value,
            base_path: None,
            is_connected: None,
            update_time: true,
            now: None,
        }
    }

    /// Prefix flattened paths with `base_path`
    #[inline]
    #[must_use]
    pub fn at(mut self, base_path: Option<&'a str>) -> Self {
        self.base_path = base_path;
        self
    }

    /// Set the connection flag on every touched leaf
    #[inline]
    #[must_use]
    pub fn connected(mut self, is_connected: bool) -> Self {
        self.is_connected = Some(is_connected);
        self
    }

    /// Leave `updated_at` untouched
    #[inline]
    #[must_use]
    pub fn without_time(mut self) -> Self {
        self.update_time = false;
        self
    }

    /// Use a fixed clock reading
    #[inline]
    #[must_use]
    pub fn at_time(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }
}

/// Leaf path → meta entry for one form
#[derive(Debug, Clone, PartialEq)]
pub struct MetaTracker {
    form_key: FormKey,
    entries: IndexMap<String, MetaEntry>,
}

impl MetaTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new(form_key: FormKey) -> Self {
        Self {
            form_key,
            entries: IndexMap::new(),
        }
    }

    /// Apply an update to every leaf of its raw value
    ///
    /// `updated_at` moves only when time updates are on and the leaf's raw
    /// value differs from the recorded one. The connection flag keeps its
    /// prior value (default `false`) unless the update sets it.
    pub fn update(&mut self, update: MetaUpdate<'_>) {
        let now = update.now.unwrap_or_else(Utc::now);
        for (path, leaf) in flatten(update.raw_value, update.base_path) {
            let prior = self.entries.get(&path);
            let changed = prior.map_or(true, |p| p.raw_value != leaf);
            let updated_at = if update.update_time && changed {
                Some(now)
            } else {
                prior.and_then(|p| p.updated_at)
            };
            let is_connected = update
                .is_connected
                .unwrap_or_else(|| prior.is_some_and(|p| p.is_connected));

            let entry = MetaEntry {
                form_key: self.form_key.clone(),
                path: path.clone(),
                raw_value: leaf,
                updated_at,
                is_connected,
            };
            self.entries.insert(path, entry);
        }
    }

    /// Drop entries whose path left the document and that are not connected
    pub fn prune(&mut self, document: &Value) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|path, entry| entry.is_connected || resolve(document, path).is_some());
        before - self.entries.len()
    }

    /// Drop entries at or below `path`
    pub fn forget(&mut self, path: &str) {
        self.entries
            .retain(|entry_path, _| !cx_path::is_within(entry_path, Some(path)));
    }

    /// Entry for a leaf path
    #[inline]
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&MetaEntry> {
        self.entries.get(path)
    }

    /// Entry for a leaf path, or a blank one
    #[must_use]
    pub fn get_or_blank(&self, path: &str) -> MetaEntry {
        self.entries
            .get(path)
            .cloned()
            .unwrap_or_else(|| MetaEntry::blank(self.form_key.clone(), path))
    }

    /// Raw values at or below `path`, rebuilt into a nested value
    ///
    /// `None` when nothing is recorded there.
    #[must_use]
    pub fn raw_value_at(&self, path: &str) -> Option<Value> {
        if let Some(entry) = self.entries.get(path) {
            return Some(entry.raw_value.clone());
        }
        let flat: FlatMap = self
            .entries
            .iter()
            .filter(|(entry_path, _)| cx_path::is_within(entry_path, Some(path)))
            .map(|(entry_path, entry)| (entry_path.clone(), entry.raw_value.clone()))
            .collect();
        if flat.is_empty() {
            return None;
        }
        resolve(&reconstruct(&flat, Some(path)), path).cloned()
    }

    /// Nested view of every entry, shaped like the document
    #[must_use]
    pub fn to_nested(&self) -> Value {
        let flat: FlatMap = self
            .entries
            .iter()
            .filter_map(|(path, entry)| {
                serde_json::to_value(entry)
                    .ok()
                    .map(|value| (path.clone(), value))
            })
            .collect();
        reconstruct(&flat, None)
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of tracked leaves
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tracked
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
