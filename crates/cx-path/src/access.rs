//! Reading and writing values at dotted paths

use serde_json::{Map, Value};

use crate::path::{split_path, PathError, PATH_SEPARATOR};

/// Resolve a dotted path against a document
///
/// The empty path resolves to the document itself. Traversal stops with
/// `None` as soon as an intermediate value is absent or not a container.
/// Segments are matched verbatim.
#[must_use]
pub fn resolve<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    split_path(path).try_fold(document, step)
}

/// Check whether a path addresses a present value
#[inline]
#[must_use]
pub fn contains(document: &Value, path: &str) -> bool {
    resolve(document, path).is_some()
}

fn step<'a>(current: &'a Value, segment: &str) -> Option<&'a Value> {
    match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Write `value` at `path`, creating intermediate containers
///
/// Missing or scalar intermediates are replaced by an array when the next
/// segment is numeric and by an object otherwise. An array grows by at most
/// one element: the index equal to its length appends. The empty path
/// replaces the whole document.
///
/// # Errors
/// Returns [`PathError::InvalidIndex`] when a non-numeric segment meets an
/// existing array and [`PathError::IndexOutOfRange`] when an index lies
/// past its end. The document may hold freshly created containers on error.
pub fn set_at(document: &mut Value, path: &str, value: Value) -> Result<(), PathError> {
    if path.is_empty() {
        *document = value;
        return Ok(());
    }

    let segments: Vec<&str> = split_path(path).collect();
    let mut current = document;
    for (position, segment) in segments.iter().enumerate() {
        let next_is_index = segments
            .get(position + 1)
            .is_some_and(|next| next.parse::<usize>().is_ok());
        let is_last = position + 1 == segments.len();

        if let Value::Array(items) = current {
            let index = segment.parse::<usize>().map_err(|_| PathError::InvalidIndex {
                path: path.to_owned(),
                segment: (*segment).to_owned(),
            })?;
            let len = items.len();
            if index == len {
                items.push(Value::Null);
            }
            let Some(slot) = items.get_mut(index) else {
                return Err(PathError::IndexOutOfRange {
                    path: path.to_owned(),
                    index,
                    len,
                });
            };
            current = slot;
        } else {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            let Some(map) = current.as_object_mut() else {
                return Ok(());
            };
            current = map.entry((*segment).to_owned()).or_insert(Value::Null);
        }

        if is_last {
            *current = value;
            return Ok(());
        }
        if !current.is_object() && !current.is_array() {
            // Scalars cannot hold children
            *current = if next_is_index {
                Value::Array(Vec::new())
            } else {
                Value::Object(Map::new())
            };
        }
    }
    Ok(())
}

/// Remove the value at `path`, returning it
///
/// Array elements are replaced by `null` so sibling indices stay stable.
pub fn remove_at(document: &mut Value, path: &str) -> Option<Value> {
    let (parent_path, key) = match path.rsplit_once(PATH_SEPARATOR) {
        Some((parent, key)) => (parent, key),
        None if path.is_empty() => return None,
        None => ("", path),
    };
    let parent = resolve_mut(document, parent_path)?;
    match parent {
        Value::Object(map) => map.shift_remove(key),
        Value::Array(items) => {
            let slot = items.get_mut(key.parse::<usize>().ok()?)?;
            Some(std::mem::replace(slot, Value::Null))
        }
        _ => None,
    }
}

/// Mutable counterpart of [`resolve`]
#[must_use]
pub fn resolve_mut<'a>(document: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    split_path(path).try_fold(document, |current, segment| match current {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
        _ => None,
    })
}
