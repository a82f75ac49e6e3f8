//! A validated configuration together with where each field came from.
//!
//! The source map travels next to the value, never inside it, so serializing
//! the configuration gives exactly its fields.

use std::collections::BTreeMap;
use std::ops::Deref;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::error::WryfigError;
use crate::persist;
use crate::schema::Schema;
use crate::types::{Source, TrackedValue};

#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    value: T,
    sources: BTreeMap<String, Source>,
}

impl<T> Sourced<T> {
    pub fn new(value: T, sources: BTreeMap<String, Source>) -> Self {
        Self { value, sources }
    }

    /// Source of `field`; fields with no recorded source count as `Default`.
    pub fn source(&self, field: &str) -> Source {
        self.sources.get(field).copied().unwrap_or(Source::Default)
    }

    pub fn sources(&self) -> &BTreeMap<String, Source> {
        &self.sources
    }

    /// Field names grouped by the source that supplied them. Sources that
    /// supplied nothing are left out.
    pub fn sources_summary(&self) -> BTreeMap<Source, Vec<String>> {
        let mut summary: BTreeMap<Source, Vec<String>> = BTreeMap::new();
        for (field, source) in &self.sources {
            summary.entry(*source).or_default().push(field.clone());
        }
        summary
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn into_parts(self) -> (T, BTreeMap<String, Source>) {
        (self.value, self.sources)
    }
}

impl<T> Deref for Sourced<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Serialize> Sourced<T> {
    /// The configuration as a JSON object.
    pub fn to_value(&self) -> Result<Value, WryfigError> {
        serde_json::to_value(&self.value).map_err(WryfigError::Serialize)
    }

    /// One field's value paired with its source.
    pub fn field_with_source(&self, field: &str) -> Result<Option<TrackedValue>, WryfigError> {
        let value = self.to_value()?;
        Ok(value
            .get(field)
            .map(|v| TrackedValue::new(v.clone(), self.source(field))))
    }

    /// `{"values": {...}, "sources": {"field": "cli", ...}}`.
    pub fn dump_with_sources(&self) -> Result<Value, WryfigError> {
        let values = self.to_value()?;
        let sources: Map<String, Value> = self
            .sources
            .iter()
            .map(|(k, s)| (k.clone(), Value::from(s.as_str())))
            .collect();
        Ok(json!({ "values": values, "sources": sources }))
    }

    /// The fields of this configuration that `target` also declares, keyed
    /// by `target`'s field names. Useful for handing a subset to a component
    /// with its own schema.
    pub fn extract_subset(&self, target: &Schema) -> Result<Map<String, Value>, WryfigError> {
        let value = self.to_value()?;
        Ok(target
            .fields()
            .iter()
            .filter_map(|f| value.get(f.name()).map(|v| (f.name().to_string(), v.clone())))
            .collect())
    }

    /// Save the configuration (values only) as a JSON config file.
    pub fn to_json_file(&self, path: &Path) -> Result<(), WryfigError> {
        persist::write_json_file(path, &self.to_value()?)
    }
}
