//! Two-layer merge of settings.
//!
//! Used while resolving references: the settings of the referencing builder (the
//! _downstream_ layer) are merged over those of the referenced builder (the _upstream_ layer).

use indexmap::IndexMap;

use crate::settings::{SettingKey, SettingValue, Settings};

/// Merges `downstream` over `upstream`, returning a new bag. Neither input is modified.
///
/// For every key, the downstream value wins. The one exception is a key that holds a nested
/// mapping on both sides: those two mappings are merged key-wise (again with the downstream
/// entries winning) instead of being replaced wholesale. The merge only descends one level.
///
/// Keys keep the order in which they first appear in `upstream`, followed by keys that only
/// occur in `downstream`.
pub fn two_layer_merge(downstream: &Settings, upstream: &Settings) -> Settings {
    let mut merged: IndexMap<SettingKey, SettingValue> = IndexMap::new();

    for (key, up_value) in upstream {
        let value = match (up_value, downstream.get(key)) {
            (SettingValue::Map(up), Some(SettingValue::Map(down))) => {
                SettingValue::Map(merge_maps(down, up))
            }
            (_, Some(down_value)) => down_value.clone(),
            (_, None) => up_value.clone(),
        };
        merged.insert(key.clone(), value);
    }

    for (key, down_value) in downstream {
        if !merged.contains_key(key) {
            merged.insert(key.clone(), down_value.clone());
        }
    }

    log::debug!(
        "merged {} downstream over {} upstream settings into {}",
        downstream.len(),
        upstream.len(),
        merged.len()
    );
    merged.into_iter().collect()
}

fn merge_maps(
    downstream: &IndexMap<String, SettingValue>,
    upstream: &IndexMap<String, SettingValue>,
) -> IndexMap<String, SettingValue> {
    let mut merged = upstream.clone();
    for (key, value) in downstream {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings<const N: usize>(entries: [(&str, SettingValue); N]) -> Settings {
        entries
            .into_iter()
            .map(|(k, v)| (SettingKey::from(k), v))
            .collect()
    }

    #[test]
    fn test_downstream_leaf_wins() {
        let down = settings([("path", "mine".into()), ("required", true.into())]);
        let up = settings([("path", "theirs".into()), ("data_type", "date".into())]);

        let merged = two_layer_merge(&down, &up);

        assert_eq!(Some(&SettingValue::from("mine")), merged.get(&SettingKey::Path));
        assert_eq!(Some(&SettingValue::Bool(true)), merged.get(&SettingKey::Required));
        assert_eq!(Some(&SettingValue::from("date")), merged.get(&SettingKey::DataType));
    }

    #[test]
    fn test_nested_maps_merge_keywise() {
        let down = settings([(
            "attributes",
            SettingValue::map([("type", "personal"), ("lang", "en")]),
        )]);
        let up = settings([(
            "attributes",
            SettingValue::map([("type", "group"), ("authority", "local")]),
        )]);

        let merged = two_layer_merge(&down, &up);

        assert_eq!(
            Some(&SettingValue::map([
                ("type", "personal"),
                ("authority", "local"),
                ("lang", "en"),
            ])),
            merged.get(&SettingKey::Attributes)
        );
    }

    #[test]
    fn test_map_replaced_by_non_map() {
        let down = settings([("path", "plain".into())]);
        let up = settings([("path", SettingValue::map([("attribute", "lang")]))]);

        let merged = two_layer_merge(&down, &up);
        assert_eq!(Some(&SettingValue::from("plain")), merged.get(&SettingKey::Path));
    }

    #[test]
    fn test_inputs_untouched() {
        let down = settings([("attributes", SettingValue::map([("type", "a")]))]);
        let up = settings([
            ("attributes", SettingValue::map([("lang", "b")])),
            ("index_as", SettingValue::tags(["facetable"])),
        ]);
        let (down_before, up_before) = (down.clone(), up.clone());

        let _ = two_layer_merge(&down, &up);

        assert_eq!(down_before, down);
        assert_eq!(up_before, up);
    }

    #[test]
    fn test_key_order() {
        let down = settings([("b", "1".into()), ("c", "2".into())]);
        let up = settings([("a", "3".into()), ("b", "4".into())]);

        let merged = two_layer_merge(&down, &up);
        let keys: Vec<_> = merged.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(vec!["a", "b", "c"], keys);
    }
}
