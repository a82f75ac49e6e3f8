//! Several schemas bound to one command.
//!
//! The adapter produces one flat value map for the whole command; these
//! helpers hand each schema the keys that belong to it. A key may belong to
//! more than one schema. Keys no schema claims are logged and dropped.

use serde_json::{Map, Value};

use crate::extract::CliInput;
use crate::schema::Schema;

/// Split `values` among `schemas` by field name or alias. Output order
/// matches `schemas`.
pub fn split_values_by_schema(values: &Map<String, Value>, schemas: &[&Schema]) -> Vec<Map<String, Value>> {
    warn_unused(values.keys(), schemas);
    schemas
        .iter()
        .map(|schema| {
            values
                .iter()
                .filter(|(k, _)| schema.is_known_key(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .collect()
}

/// Like [`split_values_by_schema`], carrying provenance hints along.
pub fn split_cli_input(input: &CliInput, schemas: &[&Schema]) -> Vec<CliInput> {
    warn_unused(input.values.keys(), schemas);
    schemas
        .iter()
        .map(|schema| {
            let mut part = CliInput::new();
            for (key, value) in input.values.iter().filter(|(k, _)| schema.is_known_key(k)) {
                match input.hints.get(key) {
                    Some(source) => part.insert_with_source(key, value.clone(), *source),
                    None => part.insert(key, value.clone()),
                }
            }
            part
        })
        .collect()
}

fn warn_unused<'a>(keys: impl Iterator<Item = &'a String>, schemas: &[&Schema]) {
    let unused: Vec<&str> = keys
        .filter(|k| !schemas.iter().any(|s| s.is_known_key(k)))
        .map(String::as_str)
        .collect();
    if !unused.is_empty() {
        tracing::warn!(
            "Unused values that don't belong to any schema: {}",
            unused.join(", ")
        );
    }
}
