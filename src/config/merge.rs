//! Deep merge of configuration layers
//!
//! Mappings merge recursively; every other pairing (scalars, lists, or a
//! type mismatch) is resolved by the later layer replacing the earlier one.
//! Lists are never concatenated.

use crate::domain::ConfigValue;
use serde_json::Map;

/// Fold `values` left to right into a single value, starting from an empty mapping.
///
/// ```
/// use injinja::merge_values;
/// use serde_json::json;
///
/// let merged = merge_values([json!({"a": 1, "b": 2}), json!({"b": 3, "c": 4})]);
/// assert_eq!(merged, json!({"a": 1, "b": 3, "c": 4}));
/// ```
pub fn merge_values<I>(values: I) -> ConfigValue
where
    I: IntoIterator<Item = ConfigValue>,
{
    values.into_iter().fold(ConfigValue::Object(Map::new()), |mut acc, layer| {
        merge_value(&mut acc, layer);
        acc
    })
}

/// Overlay `layer` onto `target` in place.
///
/// Keys already present in `target` keep their position; new keys are appended.
pub fn merge_value(target: &mut ConfigValue, layer: ConfigValue) {
    match (target, layer) {
        (ConfigValue::Object(target_map), ConfigValue::Object(layer_map)) => {
            for (key, value) in layer_map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target, layer) => *target = layer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_later_sources_win_on_overlapping_keys() {
        let merged = merge_values([
            json!({"a": 1, "b": 2}),
            json!({"b": 3, "c": 4}),
            json!({"c": 5, "d": 6}),
        ]);
        assert_eq!(merged, json!({"a": 1, "b": 3, "c": 5, "d": 6}));
    }

    #[test]
    fn test_empty_input_is_empty_mapping() {
        assert_eq!(merge_values(Vec::<ConfigValue>::new()), json!({}));
    }

    #[test]
    fn test_lists_are_replaced_not_concatenated() {
        let merged = merge_values([json!({"x": [1, 2]}), json!({"x": [3]})]);
        assert_eq!(merged, json!({"x": [3]}));
    }

    #[test]
    fn test_nested_mappings_merge_recursively() {
        let merged = merge_values([
            json!({"db": {"host": "localhost", "port": 5432, "opts": {"ssl": false}}}),
            json!({"db": {"port": 6432, "opts": {"timeout": 5}}}),
        ]);
        assert_eq!(
            merged,
            json!({"db": {"host": "localhost", "port": 6432, "opts": {"ssl": false, "timeout": 5}}})
        );
    }

    #[test]
    fn test_type_mismatch_replaces_wholesale() {
        let merged = merge_values([json!({"a": {"nested": true}}), json!({"a": 42})]);
        assert_eq!(merged, json!({"a": 42}));

        let merged = merge_values([json!({"a": 42}), json!({"a": {"nested": true}})]);
        assert_eq!(merged, json!({"a": {"nested": true}}));
    }

    #[test]
    fn test_deep_override_keeps_untouched_siblings() {
        let merged = merge_values([
            json!({"a": {"b": {"c": 1, "keep": "yes"}}}),
            json!({"a": {"b": {"c": 2}}}),
            json!({"a": {"b": {"c": 3}}}),
        ]);
        assert_eq!(merged, json!({"a": {"b": {"c": 3, "keep": "yes"}}}));
    }

    #[test]
    fn test_key_order_follows_first_insertion() {
        let merged = merge_values([json!({"z": 1, "a": 1}), json!({"m": 2, "z": 2})]);
        let keys: Vec<_> = merged.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["z", "a", "m"]);
        assert_eq!(merged["z"], json!(2));
    }

    #[test]
    fn test_non_mapping_layer_replaces_accumulator() {
        let merged = merge_values([json!({"a": 1}), json!(["x", "y"])]);
        assert_eq!(merged, json!(["x", "y"]));
    }
}
