//! Display operations: the `--show-env-vars` table and the per-field source
//! listing.
//!
//! Both are plain values with a `Display` impl; callers decide where to print.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::WryfigError;
use crate::field::DefaultValue;
use crate::schema::Schema;
use crate::sourced::Sourced;
use crate::types::Source;

const RULE_WIDTH: usize = 70;
const BOOL_WORDS: &str = "bool: true/false, 1/0, yes/no, on/off";

/// One environment variable a schema reads.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvVarEntry {
    pub field: String,
    pub env_name: String,
    pub type_name: String,
    pub is_bool: bool,
    pub required: bool,
    /// Literal defaults only; factory defaults are not shown.
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl fmt::Display for EnvVarEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {}", self.env_name)?;
        if self.is_bool {
            write!(f, " ({BOOL_WORDS})")?;
        } else {
            write!(f, " ({})", self.type_name)?;
        }
        if self.required {
            write!(f, " (required)")?;
        }
        if let Some(default) = &self.default {
            write!(f, " (default={default})")?;
        }
        if let Some(description) = &self.description {
            write!(f, ": {description}")?;
        }
        Ok(())
    }
}

/// The environment variable table for one schema.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvVarListing {
    pub schema: String,
    pub entries: Vec<EnvVarEntry>,
}

impl fmt::Display for EnvVarListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Environment variables for {}:", self.schema)?;
        write!(f, "{}", "=".repeat(RULE_WIDTH))?;
        for entry in &self.entries {
            write!(f, "\n{entry}")?;
        }
        Ok(())
    }
}

/// Build the environment variable table for every exposed field.
pub fn env_var_listing(schema: &Schema) -> EnvVarListing {
    let entries = schema
        .exposed()
        .map(|(field, _)| EnvVarEntry {
            field: field.name().to_string(),
            env_name: schema.env_var_name(field),
            type_name: field.declared_type().type_name(),
            is_bool: field.declared_type().is_bool(),
            required: field.is_required(),
            default: match field.default() {
                DefaultValue::Literal(v) => Some(v.clone()),
                _ => None,
            },
            description: field.help().map(str::to_string),
        })
        .collect();

    EnvVarListing {
        schema: schema.name().to_string(),
        entries,
    }
}

/// Resolved values with their sources, one line per field.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceListing {
    pub entries: Vec<(String, String, Source)>,
}

impl fmt::Display for SourceListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value, source)) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{key} = {value} ({source})")?;
        }
        Ok(())
    }
}

/// List every serialized field of `config` with the source that supplied it.
pub fn source_listing<T: Serialize>(config: &Sourced<T>) -> Result<SourceListing, WryfigError> {
    let value = config.to_value()?;
    let entries = match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(key, v)| {
                let source = config.source(&key);
                (key, format_value(&v), source)
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(SourceListing { entries })
}

/// Format a JSON value for display. Strings are shown unquoted.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "<not set>".to_string(),
        other => other.to_string(),
    }
}
