//! Deciding which CLI-parsed values are genuine command-line contributions.
//!
//! The adapter hands over every value it parsed, keyed by field name or alias,
//! plus (when it knows) a [`ParameterSource`] per key. A value counts as CLI
//! input when:
//!
//! - its hint is [`ParameterSource::CommandLine`], or
//! - there is no hint and the value is new or differs from what the lower
//!   layers already hold.
//!
//! Values hinted as framework defaults are dropped so they never shadow a
//! config-file or environment value. Values arrive already decoded (lists,
//! on/off booleans); nothing is re-decoded here.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::WryfigError;
use crate::merge::TrackedMap;
use crate::schema::Schema;
use crate::types::ParameterSource;

/// Raw values from a CLI adapter plus its provenance hints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliInput {
    pub values: Map<String, Value>,
    pub hints: HashMap<String, ParameterSource>,
}

impl CliInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value with no provenance hint.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Record a value together with where the adapter says it came from.
    pub fn insert_with_source(&mut self, key: &str, value: impl Into<Value>, source: ParameterSource) {
        self.insert(key, value);
        self.hints.insert(key.to_string(), source);
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn with_source(mut self, key: &str, value: impl Into<Value>, source: ParameterSource) -> Self {
        self.insert_with_source(key, value, source);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys that name no field or alias of `schema`, sorted.
    pub fn unknown_keys(&self, schema: &Schema) -> Vec<String> {
        let mut keys: Vec<String> = self
            .values
            .keys()
            .filter(|k| !schema.is_known_key(k))
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

/// Pick out the values that count as CLI-sourced, keyed by canonical field
/// name.
///
/// `lower` holds what defaults, environment and config file produced; it is
/// only consulted for values that carry no hint. In strict mode, keys matching
/// no field name or alias are an [`WryfigError::ExtraFields`] error.
pub fn extract_cli_values(
    schema: &Schema,
    input: &CliInput,
    lower: &TrackedMap,
) -> Result<Map<String, Value>, WryfigError> {
    if schema.strict() {
        let extra = input.unknown_keys(schema);
        if !extra.is_empty() {
            return Err(WryfigError::ExtraFields(extra));
        }
    }

    let mut out = Map::new();
    for (field, _) in schema.exposed() {
        let name = field.name();
        let Some(value) = input
            .values
            .get(name)
            .or_else(|| field.alias_name().and_then(|a| input.values.get(a)))
        else {
            continue;
        };

        // The adapter may know the parameter by its alias or by the field name.
        let hint = field
            .alias_name()
            .and_then(|a| input.hints.get(a))
            .or_else(|| input.hints.get(name));

        let counts = match hint {
            Some(source) => source.is_command_line(),
            None => lower.get(name).is_none_or(|known| known.value != *value),
        };
        if counts {
            out.insert(name.to_string(), value.clone());
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::types::{DeclaredType, Source, TrackedValue};
    use serde_json::json;

    fn schema(strict: bool) -> Schema {
        Schema::builder("Cli")
            .strict(strict)
            .field(Field::new("name", DeclaredType::String))
            .field(Field::new("port", DeclaredType::Integer).default_value(8080))
            .field(
                Field::new("db_url", DeclaredType::String)
                    .alias("database_url")
                    .default_value("sqlite://"),
            )
            .build()
            .unwrap()
    }

    fn lower(pairs: &[(&str, Value, Source)]) -> TrackedMap {
        pairs
            .iter()
            .map(|(k, v, s)| (k.to_string(), TrackedValue::new(v.clone(), *s)))
            .collect()
    }

    #[test]
    fn command_line_hint_kept() {
        let input = CliInput::new().with_source("port", 8080, ParameterSource::CommandLine);
        let known = lower(&[("port", json!(8080), Source::Default)]);
        let out = extract_cli_values(&schema(false), &input, &known).unwrap();
        assert_eq!(out["port"], json!(8080));
    }

    #[test]
    fn framework_default_dropped() {
        let input = CliInput::new().with_source("port", 8080, ParameterSource::Default);
        let known = lower(&[("port", json!(9090), Source::ConfigFile)]);
        let out = extract_cli_values(&schema(false), &input, &known).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn framework_env_and_default_map_dropped() {
        let input = CliInput::new()
            .with_source("port", 1, ParameterSource::Environment)
            .with_source("name", "x", ParameterSource::DefaultMap);
        let out = extract_cli_values(&schema(false), &input, &TrackedMap::new()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn unhinted_value_differing_kept() {
        let input = CliInput::new().with("port", 3000);
        let known = lower(&[("port", json!(8080), Source::Default)]);
        let out = extract_cli_values(&schema(false), &input, &known).unwrap();
        assert_eq!(out["port"], json!(3000));
    }

    #[test]
    fn unhinted_value_equal_to_known_dropped() {
        let input = CliInput::new().with("port", 9090);
        let known = lower(&[("port", json!(9090), Source::ConfigFile)]);
        let out = extract_cli_values(&schema(false), &input, &known).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn unhinted_value_with_nothing_known_kept() {
        let input = CliInput::new().with("name", "Alice");
        let out = extract_cli_values(&schema(false), &input, &TrackedMap::new()).unwrap();
        assert_eq!(out["name"], json!("Alice"));
    }

    #[test]
    fn alias_key_mapped_to_field_name() {
        let input =
            CliInput::new().with_source("database_url", "pg://", ParameterSource::CommandLine);
        let out = extract_cli_values(&schema(false), &input, &TrackedMap::new()).unwrap();
        assert_eq!(out["db_url"], json!("pg://"));
        assert!(!out.contains_key("database_url"));
    }

    #[test]
    fn hint_found_under_field_name_for_aliased_field() {
        let input = CliInput::new().with_source("db_url", "pg://", ParameterSource::Default);
        let out = extract_cli_values(&schema(false), &input, &TrackedMap::new()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn unknown_keys_ignored_when_lax() {
        let input = CliInput::new().with("bogus", 1).with("name", "x");
        let out = extract_cli_values(&schema(false), &input, &TrackedMap::new()).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn unknown_keys_rejected_when_strict() {
        let input = CliInput::new().with("zeta", 1).with("bogus", 2).with("name", "x");
        let err = extract_cli_values(&schema(true), &input, &TrackedMap::new()).unwrap_err();
        match err {
            WryfigError::ExtraFields(keys) => assert_eq!(keys, vec!["bogus", "zeta"]),
            other => panic!("expected ExtraFields, got {other:?}"),
        }
    }

    #[test]
    fn strict_accepts_aliases() {
        let input = CliInput::new().with("database_url", "pg://");
        assert!(extract_cli_values(&schema(true), &input, &TrackedMap::new()).is_ok());
    }
}
