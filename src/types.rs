//! Small shared types: value sources, tracked values, adapter provenance and
//! declared field types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a field's value came from, in increasing precedence.
///
/// The derived `Ord` is the precedence order: `Default < Env < ConfigFile < Cli`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Default,
    Env,
    ConfigFile,
    Cli,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Default => "default",
            Source::Env => "env",
            Source::ConfigFile => "config_file",
            Source::Cli => "cli",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value paired with the source that supplied it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedValue {
    pub value: Value,
    pub source: Source,
}

impl TrackedValue {
    pub fn new(value: Value, source: Source) -> Self {
        Self { value, source }
    }
}

impl fmt::Display for TrackedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::String(s) => write!(f, "{s} ({})", self.source),
            other => write!(f, "{other} ({})", self.source),
        }
    }
}

/// The CLI framework's own account of where a parsed value came from.
///
/// Only [`CommandLine`](ParameterSource::CommandLine) counts as a genuine CLI
/// contribution; the rest are framework fill-ins and never shadow a
/// config-file or environment value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterSource {
    CommandLine,
    Environment,
    Default,
    DefaultMap,
}

impl ParameterSource {
    pub fn is_command_line(&self) -> bool {
        matches!(self, ParameterSource::CommandLine)
    }
}

/// The declared type of a field.
///
/// Only used for environment coercion, list/boolean encoding decisions and the
/// lax coercion of the default validator. Structural types beyond these are
/// passed through as strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    String,
    Integer,
    Float,
    Boolean,
    List(Box<DeclaredType>),
    Optional(Box<DeclaredType>),
}

impl DeclaredType {
    pub fn list(element: DeclaredType) -> Self {
        DeclaredType::List(Box::new(element))
    }

    pub fn optional(inner: DeclaredType) -> Self {
        DeclaredType::Optional(Box::new(inner))
    }

    /// The type with any `Optional` wrappers removed.
    pub fn base(&self) -> &DeclaredType {
        match self {
            DeclaredType::Optional(inner) => inner.base(),
            other => other,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, DeclaredType::Optional(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.base(), DeclaredType::Boolean)
    }

    pub fn is_list(&self) -> bool {
        matches!(self.base(), DeclaredType::List(_))
    }

    /// Element type of a (possibly optional) list.
    pub fn element(&self) -> Option<&DeclaredType> {
        match self.base() {
            DeclaredType::List(element) => Some(element),
            _ => None,
        }
    }

    /// Short display name, e.g. `int`, `list[str]`, `float | None`.
    pub fn type_name(&self) -> String {
        match self {
            DeclaredType::String => "str".into(),
            DeclaredType::Integer => "int".into(),
            DeclaredType::Float => "float".into(),
            DeclaredType::Boolean => "bool".into(),
            DeclaredType::List(element) => format!("list[{}]", element.type_name()),
            DeclaredType::Optional(inner) => format!("{} | None", inner.type_name()),
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}
