//! Deep merge of JSON documents

use serde_json::Value;

/// Deep-merge `patch` over `base`, returning the merged value
///
/// Objects merge key-wise and arrays merge index-wise; any other pairing
/// takes the patch value.
///
/// ```
/// use cx_path::deep_merge;
/// use serde_json::json;
///
/// let merged = deep_merge(&json!({"a": [1, 2], "b": {"c": 1}}), &json!({"a": [9], "b": {"d": 2}}));
/// assert_eq!(merged, json!({"a": [9, 2], "b": {"c": 1, "d": 2}}));
/// ```
#[must_use]
pub fn deep_merge(base: &Value, patch: &Value) -> Value {
    let mut merged = base.clone();
    merge_into(&mut merged, patch);
    merged
}

/// In-place form of [`deep_merge`]
pub fn merge_into(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target_map), Value::Object(patch_map)) => {
            for (key, patch_val) in patch_map {
                match target_map.get_mut(key) {
                    Some(existing) => merge_into(existing, patch_val),
                    None => {
                        target_map.insert(key.clone(), patch_val.clone());
                    }
                }
            }
        }
        (Value::Array(target_items), Value::Array(patch_items)) => {
            for (index, patch_val) in patch_items.iter().enumerate() {
                match target_items.get_mut(index) {
                    Some(existing) => merge_into(existing, patch_val),
                    None => target_items.push(patch_val.clone()),
                }
            }
        }
        // For everything else, patch wins
        (target, patch_val) => *target = patch_val.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn merge_objects_recursively() {
        let merged = deep_merge(
            &json!({"a": {"b": 1, "c": 2}, "keep": true}),
            &json!({"a": {"c": 3, "d": 4}}),
        );
        assert_eq!(merged, json!({"a": {"b": 1, "c": 3, "d": 4}, "keep": true}));
    }

    #[test]
    fn merge_arrays_by_index() {
        let merged = deep_merge(
            &json!({"list": [{"x": 1, "y": 1}, {"x": 2}]}),
            &json!({"list": [{"x": 9}, {"x": 8}, {"x": 7}]}),
        );
        assert_eq!(
            merged,
            json!({"list": [{"x": 9, "y": 1}, {"x": 8}, {"x": 7}]})
        );
    }

    #[test]
    fn patch_wins_on_shape_mismatch() {
        assert_eq!(deep_merge(&json!({"a": {"b": 1}}), &json!({"a": 5})), json!({"a": 5}));
        assert_eq!(deep_merge(&json!({"a": 5}), &json!({"a": {"b": 1}})), json!({"a": {"b": 1}}));
        assert_eq!(deep_merge(&json!({"a": 1}), &json!({"a": null})), json!({"a": null}));
    }

    #[test]
    fn merge_with_empty_patch_is_identity() {
        let base = json!({"a": [1, {"b": 2}]});
        assert_eq!(deep_merge(&base, &json!({})), base);
    }
}
