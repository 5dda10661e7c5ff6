//! Flattening documents into leaf-path maps and rebuilding them

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::access::set_at;
use crate::path::{join_path, PATH_SEPARATOR};

/// Key recorded for a bare leaf flattened without a base path
///
/// Never a valid field name in practice; it only appears when a scalar is
/// flattened on its own.
pub const NO_PATH_KEY: &str = "___CX_INTERNAL__NO_PATH_KEY___";

/// Leaf path → leaf value, in document order
pub type FlatMap = IndexMap<String, Value>;

/// Flatten a value into its leaf paths
///
/// Objects and arrays are descended; everything else (including `null`) is
/// a leaf. Child paths are prefixed with `base_path` when given. Empty
/// containers contribute no entries.
///
/// ```
/// use cx_path::flatten;
/// use serde_json::json;
///
/// let flat = flatten(&json!({"a": {"b": 1}, "c": [true]}), None);
/// assert_eq!(flat["a.b"], json!(1));
/// assert_eq!(flat["c.0"], json!(true));
/// ```
#[must_use]
pub fn flatten(value: &Value, base_path: Option<&str>) -> FlatMap {
    let mut recorded = FlatMap::new();
    flatten_into(value, base_path, &mut recorded);
    recorded
}

fn flatten_into(value: &Value, base_path: Option<&str>, recorded: &mut FlatMap) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = join_path(base_path, key);
                flatten_into(child, Some(&path), recorded);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                let path = join_path(base_path, &index.to_string());
                flatten_into(child, Some(&path), recorded);
            }
        }
        leaf => {
            let key = base_path.unwrap_or(NO_PATH_KEY);
            recorded.insert(key.to_owned(), leaf.clone());
        }
    }
}

/// Rebuild a nested value from flat entries
///
/// Only entries at or below `base_path` are used; the result keeps their
/// full paths. A map holding only the [`NO_PATH_KEY`] sentinel rebuilds to
/// that bare leaf. Entries that cannot be placed, such as an index past the
/// end of the array rebuilt so far, are skipped.
#[must_use]
pub fn reconstruct(flat: &FlatMap, base_path: Option<&str>) -> Value {
    if flat.len() == 1 {
        if let Some(leaf) = flat.get(NO_PATH_KEY) {
            return leaf.clone();
        }
    }

    let mut rebuilt = Value::Object(Map::new());
    for (path, leaf) in flat {
        if path == NO_PATH_KEY || !is_within(path, base_path) {
            continue;
        }
        // Keys under arrays and indices past the end are skipped
        let _ = set_at(&mut rebuilt, path, leaf.clone());
    }
    rebuilt
}

/// Whether `path` equals `base` or lies beneath it
#[must_use]
pub fn is_within(path: &str, base: Option<&str>) -> bool {
    match base {
        None => true,
        Some("") => true,
        Some(base) => {
            path == base
                || path
                    .strip_prefix(base)
                    .is_some_and(|rest| rest.starts_with(PATH_SEPARATOR))
        }
    }
}
