//! Field descriptors: the per-field metadata a [`Schema`](crate::Schema) is
//! built from.
//!
//! A [`Field`] carries everything the binding layers need to know about one
//! field: its canonical name, optional alias, declared type, default, help
//! text, constraints and a [`Marker`] saying how it is exposed on the CLI.
//!
//! ```
//! use serde_json::json;
//! use wryfig::{Constraints, DeclaredType, Field, OptionSpec};
//!
//! let port = Field::new("port", DeclaredType::Integer)
//!     .default_value(json!(8080))
//!     .description("Port to listen on")
//!     .constraints(Constraints::new().ge(1).le(65535));
//!
//! let tags = Field::new("tags", DeclaredType::list(DeclaredType::String))
//!     .default_factory(|| json!([]))
//!     .option(OptionSpec::new().comma_separated());
//! # let _ = (port, tags);
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::WryfigError;
use crate::types::DeclaredType;

/// Default for a field. Exactly one of the three holds per field.
#[derive(Clone)]
pub enum DefaultValue {
    /// No default: the field is required.
    Required,
    Literal(Value),
    /// Invoked fresh on every resolution, so mutable defaults are never shared.
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    /// Produce the default value, invoking the factory if there is one.
    pub fn produce(&self) -> Option<Value> {
        match self {
            DefaultValue::Required => None,
            DefaultValue::Literal(v) => Some(v.clone()),
            DefaultValue::Factory(f) => Some(f()),
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, DefaultValue::Required)
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Required => f.write_str("Required"),
            DefaultValue::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            DefaultValue::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Numeric and length bounds. Shown in help text; enforcement belongs to the
/// validation layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub ge: Option<f64>,
    pub gt: Option<f64>,
    pub le: Option<f64>,
    pub lt: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub multiple_of: Option<f64>,
    pub pattern: Option<String>,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ge(mut self, v: impl Into<f64>) -> Self {
        self.ge = Some(v.into());
        self
    }

    pub fn gt(mut self, v: impl Into<f64>) -> Self {
        self.gt = Some(v.into());
        self
    }

    pub fn le(mut self, v: impl Into<f64>) -> Self {
        self.le = Some(v.into());
        self
    }

    pub fn lt(mut self, v: impl Into<f64>) -> Self {
        self.lt = Some(v.into());
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn multiple_of(mut self, v: impl Into<f64>) -> Self {
        self.multiple_of = Some(v.into());
        self
    }

    pub fn pattern(mut self, p: &str) -> Self {
        self.pattern = Some(p.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Lower bound: `ge` if set, otherwise `gt`.
    pub fn minimum(&self) -> Option<f64> {
        self.ge.or(self.gt)
    }

    /// Upper bound: `le` if set, otherwise `lt`.
    pub fn maximum(&self) -> Option<f64> {
        self.le.or(self.lt)
    }

    pub fn range(&self) -> (Option<f64>, Option<f64>) {
        (self.minimum(), self.maximum())
    }

    /// Human-readable constraint fragments, e.g. `[">= 0", "length 1-5"]`.
    pub fn help_text(&self) -> Vec<String> {
        let mut texts = Vec::new();

        if let Some(v) = self.ge {
            texts.push(format!(">= {v}"));
        }
        if let Some(v) = self.gt {
            texts.push(format!("> {v}"));
        }
        if let Some(v) = self.le {
            texts.push(format!("<= {v}"));
        }
        if let Some(v) = self.lt {
            texts.push(format!("< {v}"));
        }

        match (self.min_length, self.max_length) {
            (Some(min), Some(max)) if min == max => texts.push(format!("length = {min}")),
            (Some(min), Some(max)) => texts.push(format!("length {min}-{max}")),
            (Some(min), None) => texts.push(format!("min length {min}")),
            (None, Some(max)) => texts.push(format!("max length {max}")),
            (None, None) => {}
        }

        if let Some(v) = self.multiple_of {
            texts.push(format!("multiple of {v}"));
        }

        texts
    }
}

/// Per-field options for a field exposed as a CLI option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    /// Require a value from a non-default source even when a default exists.
    pub required: bool,
    /// Boolean fields: `--x/--no-x` pair when true, single `--x` flag when false.
    pub flag_enable_on_off: bool,
    /// Boolean fields: prefix for the off flag (`disable` gives `--disable-x`).
    pub flag_off_prefix: Option<String>,
    /// Boolean fields: full off flag name (`quiet` gives `--verbose/--quiet`).
    pub flag_off_option: Option<String>,
    /// List fields: one comma-separated value instead of repeated flags.
    pub comma_separated: bool,
}

impl Default for OptionSpec {
    fn default() -> Self {
        Self {
            required: false,
            flag_enable_on_off: true,
            flag_off_prefix: None,
            flag_off_option: None,
            comma_separated: false,
        }
    }
}

impl OptionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Boolean fields only get a single `--x` flag.
    pub fn single_flag(mut self) -> Self {
        self.flag_enable_on_off = false;
        self
    }

    pub fn off_prefix(mut self, prefix: &str) -> Self {
        self.flag_off_prefix = Some(prefix.to_string());
        self
    }

    pub fn off_option(mut self, name: &str) -> Self {
        self.flag_off_option = Some(name.to_string());
        self
    }

    pub fn comma_separated(mut self) -> Self {
        self.comma_separated = true;
        self
    }

    pub(crate) fn check(&self, field: &str) -> Result<(), WryfigError> {
        if self.flag_off_prefix.is_some() && self.flag_off_option.is_some() {
            return Err(WryfigError::InvalidFieldOptions {
                field: field.to_string(),
                reason: "provide only one of flag_off_prefix or flag_off_option, not both".into(),
            });
        }
        if !self.flag_enable_on_off
            && (self.flag_off_prefix.is_some() || self.flag_off_option.is_some())
        {
            return Err(WryfigError::InvalidFieldOptions {
                field: field.to_string(),
                reason: "cannot set flag_off_prefix/flag_off_option when on/off flags are disabled"
                    .into(),
            });
        }
        Ok(())
    }
}

/// How a field is exposed on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Option(OptionSpec),
    Argument,
    /// Validation-only field: not bound to CLI, env or config file.
    Exclude,
}

impl Default for Marker {
    fn default() -> Self {
        Marker::Option(OptionSpec::default())
    }
}

/// Declarative description of one schema field.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    alias: Option<String>,
    declared_type: DeclaredType,
    default: DefaultValue,
    description: Option<String>,
    constraints: Constraints,
    marker: Marker,
}

impl Field {
    /// A required option field. Chain setters to adjust.
    pub fn new(name: &str, declared_type: DeclaredType) -> Self {
        Self {
            name: name.to_string(),
            alias: None,
            declared_type,
            default: DefaultValue::Required,
            description: None,
            constraints: Constraints::default(),
            marker: Marker::default(),
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = DefaultValue::Literal(value.into());
        self
    }

    pub fn default_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = DefaultValue::Factory(Arc::new(factory));
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn option(mut self, spec: OptionSpec) -> Self {
        self.marker = Marker::Option(spec);
        self
    }

    pub fn argument(mut self) -> Self {
        self.marker = Marker::Argument;
        self
    }

    pub fn exclude(mut self) -> Self {
        self.marker = Marker::Exclude;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The alias if there is one, otherwise the name. Drives flag, env var and
    /// file key derivation.
    pub fn external_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn declared_type(&self) -> &DeclaredType {
        &self.declared_type
    }

    pub fn default(&self) -> &DefaultValue {
        &self.default
    }

    pub fn help(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn constraint_set(&self) -> &Constraints {
        &self.constraints
    }

    pub fn marker(&self) -> &Marker {
        &self.marker
    }

    pub fn option_spec(&self) -> Option<&OptionSpec> {
        match &self.marker {
            Marker::Option(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_required()
    }

    pub fn is_exposed(&self) -> bool {
        !matches!(self.marker, Marker::Exclude)
    }

    /// True when `key` is this field's name or alias.
    pub fn matches_key(&self, key: &str) -> bool {
        self.name == key || self.alias.as_deref() == Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn new_field_is_required_option() {
        let f = Field::new("name", DeclaredType::String);
        assert!(f.is_required());
        assert!(f.is_exposed());
        assert_eq!(f.marker(), &Marker::Option(OptionSpec::default()));
    }

    #[test]
    fn literal_default_not_required() {
        let f = Field::new("port", DeclaredType::Integer).default_value(8080);
        assert!(!f.is_required());
        assert_eq!(f.default().produce(), Some(json!(8080)));
    }

    #[test]
    fn factory_invoked_on_each_produce() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let f = Field::new("tags", DeclaredType::list(DeclaredType::String)).default_factory(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                json!([])
            },
        );
        assert_eq!(f.default().produce(), Some(json!([])));
        assert_eq!(f.default().produce(), Some(json!([])));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn external_name_prefers_alias() {
        let f = Field::new("db_url", DeclaredType::String).alias("database_url");
        assert_eq!(f.external_name(), "database_url");
        assert!(f.matches_key("db_url"));
        assert!(f.matches_key("database_url"));
        assert!(!f.matches_key("url"));
    }

    #[test]
    fn excluded_field_not_exposed() {
        let f = Field::new("internal", DeclaredType::String).exclude();
        assert!(!f.is_exposed());
        assert!(f.option_spec().is_none());
    }

    #[test]
    fn constraint_text_numeric_bounds() {
        let c = Constraints::new().ge(0).le(120);
        assert_eq!(c.help_text(), vec![">= 0", "<= 120"]);
    }

    #[test]
    fn constraint_text_exclusive_bounds_and_multiple() {
        let c = Constraints::new().gt(0.5).lt(10).multiple_of(5);
        assert_eq!(c.help_text(), vec!["> 0.5", "< 10", "multiple of 5"]);
    }

    #[test]
    fn constraint_text_lengths() {
        assert_eq!(
            Constraints::new().min_length(1).max_length(5).help_text(),
            vec!["length 1-5"]
        );
        assert_eq!(
            Constraints::new().min_length(3).max_length(3).help_text(),
            vec!["length = 3"]
        );
        assert_eq!(Constraints::new().min_length(2).help_text(), vec!["min length 2"]);
        assert_eq!(Constraints::new().max_length(9).help_text(), vec!["max length 9"]);
    }

    #[test]
    fn minimum_prefers_ge_over_gt() {
        let c = Constraints::new().ge(1).gt(0);
        assert_eq!(c.minimum(), Some(1.0));
        let c = Constraints::new().gt(0);
        assert_eq!(c.minimum(), Some(0.0));
        assert_eq!(c.maximum(), None);
    }

    #[test]
    fn range_pairs_bounds() {
        let c = Constraints::new().ge(1).lt(100);
        assert_eq!(c.range(), (Some(1.0), Some(100.0)));
    }

    #[test]
    fn option_spec_rejects_prefix_and_name() {
        let spec = OptionSpec::new().off_prefix("disable").off_option("quiet");
        assert!(matches!(
            spec.check("verbose"),
            Err(WryfigError::InvalidFieldOptions { .. })
        ));
    }

    #[test]
    fn option_spec_rejects_off_name_with_single_flag() {
        let spec = OptionSpec::new().single_flag().off_option("quiet");
        assert!(spec.check("verbose").is_err());
        assert!(OptionSpec::new().single_flag().check("verbose").is_ok());
    }
}
