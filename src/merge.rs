use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::types::{Source, TrackedValue};

/// Field name to tracked value.
pub type TrackedMap = BTreeMap<String, TrackedValue>;

/// Overlay `layer` on `base`, tagging every value with `source`.
///
/// Every key in `layer` replaces whatever `base` held for it. Callers apply
/// layers lowest rank first, so the last writer is the highest-ranked source.
/// Returns the number of entries written.
pub fn apply_layer(base: &mut TrackedMap, layer: Map<String, Value>, source: Source) -> usize {
    let count = layer.len();
    for (key, value) in layer {
        base.insert(key, TrackedValue::new(value, source));
    }
    count
}

/// Strip the tags, keeping only the values.
pub fn untracked(map: &TrackedMap) -> Map<String, Value> {
    map.iter()
        .map(|(k, tv)| (k.clone(), tv.value.clone()))
        .collect()
}

/// Keep only the tags.
pub fn sources_of(map: &TrackedMap) -> BTreeMap<String, Source> {
    map.iter().map(|(k, tv)| (k.clone(), tv.source)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layer(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("layer must be an object"),
        }
    }

    #[test]
    fn disjoint_keys_merge() {
        let mut base = TrackedMap::new();
        apply_layer(&mut base, layer(json!({"host": "localhost"})), Source::Default);
        apply_layer(&mut base, layer(json!({"port": 3000})), Source::Env);
        assert_eq!(base["host"], TrackedValue::new(json!("localhost"), Source::Default));
        assert_eq!(base["port"], TrackedValue::new(json!(3000), Source::Env));
    }

    #[test]
    fn overlay_replaces_value_and_tag() {
        let mut base = TrackedMap::new();
        apply_layer(&mut base, layer(json!({"port": 8080})), Source::Default);
        apply_layer(&mut base, layer(json!({"port": 9090})), Source::ConfigFile);
        assert_eq!(base["port"], TrackedValue::new(json!(9090), Source::ConfigFile));
    }

    #[test]
    fn equal_value_still_retagged() {
        let mut base = TrackedMap::new();
        apply_layer(&mut base, layer(json!({"port": 8080})), Source::Default);
        apply_layer(&mut base, layer(json!({"port": 8080})), Source::Cli);
        assert_eq!(base["port"].source, Source::Cli);
    }

    #[test]
    fn arrays_replaced_not_merged() {
        let mut base = TrackedMap::new();
        apply_layer(&mut base, layer(json!({"tags": ["a", "b"]})), Source::Default);
        apply_layer(&mut base, layer(json!({"tags": ["c"]})), Source::Env);
        assert_eq!(base["tags"].value, json!(["c"]));
    }

    #[test]
    fn empty_layer_noop() {
        let mut base = TrackedMap::new();
        apply_layer(&mut base, layer(json!({"a": 1})), Source::Default);
        let before = base.clone();
        assert_eq!(apply_layer(&mut base, Map::new(), Source::Cli), 0);
        assert_eq!(base, before);
    }

    #[test]
    fn untracked_and_sources_split() {
        let mut base = TrackedMap::new();
        apply_layer(&mut base, layer(json!({"a": 1, "b": "x"})), Source::Env);
        assert_eq!(Value::Object(untracked(&base)), json!({"a": 1, "b": "x"}));
        let sources = sources_of(&base);
        assert_eq!(sources["a"], Source::Env);
        assert_eq!(sources.len(), 2);
    }
}
