//! The schema: an immutable, ordered table of [`Field`]s plus schema-wide
//! settings, analysed once at build time.
//!
//! [`SchemaBuilder::build`] is the single static-analysis step. It checks each
//! field's options and works out its CLI [`Binding`]: flag or positional name,
//! boolean on/off shape (including the collision fallback) and list encoding.
//! Nothing downstream re-inspects field types to decide CLI shape.
//!
//! Schemas compose by [`extend`](SchemaBuilder::extend): the parent's fields
//! are copied in order and any field declared again replaces the earlier one
//! in place (last writer wins).

use crate::error::WryfigError;
use crate::field::{Field, Marker};
use crate::flag::{self, BoolFlag};
use crate::list::ListMode;

pub const DEFAULT_BOOLEAN_OFF_PREFIX: &str = "no";

/// How one field is bound to the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Excluded,
    Option {
        /// Long flag name without `--`.
        long: String,
        bool_flag: Option<BoolFlag>,
        list_mode: Option<ListMode>,
        required: bool,
    },
    Argument {
        name: String,
        list: bool,
        required: bool,
    },
}

impl Binding {
    pub fn is_exposed(&self) -> bool {
        !matches!(self, Binding::Excluded)
    }

    pub fn list_mode(&self) -> Option<ListMode> {
        match self {
            Binding::Option { list_mode, .. } => *list_mode,
            Binding::Argument { list: true, .. } => Some(ListMode::Repeated),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    env_prefix: String,
    boolean_off_prefix: String,
    comma_separated_lists: bool,
    populate_by_name: bool,
    strict: bool,
    fields: Vec<Field>,
    bindings: Vec<Binding>,
}

impl Schema {
    pub fn builder(name: &str) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn env_prefix(&self) -> &str {
        &self.env_prefix
    }

    pub fn boolean_off_prefix(&self) -> &str {
        &self.boolean_off_prefix
    }

    pub fn comma_separated_lists(&self) -> bool {
        self.comma_separated_lists
    }

    /// Whether config-file keys may use canonical names for aliased fields.
    pub fn populate_by_name(&self) -> bool {
        self.populate_by_name
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.position(name).map(|i| &self.bindings[i])
    }

    /// Fields paired with their bindings, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Field, &Binding)> {
        self.fields.iter().zip(&self.bindings)
    }

    /// Only the fields that take part in CLI/env/config binding.
    pub fn exposed(&self) -> impl Iterator<Item = (&Field, &Binding)> {
        self.iter().filter(|(f, _)| f.is_exposed())
    }

    /// Find the field a key refers to. Canonical names are checked before
    /// aliases.
    pub fn field_for_key(&self, key: &str) -> Option<&Field> {
        self.field(key)
            .or_else(|| self.fields.iter().find(|f| f.alias_name() == Some(key)))
    }

    pub fn is_known_key(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.matches_key(key))
    }

    /// `{prefix}{UPPER_SNAKE(alias or name)}`.
    pub fn env_var_name(&self, field: &Field) -> String {
        format!(
            "{}{}",
            self.env_prefix,
            field.external_name().to_uppercase().replace('-', "_")
        )
    }

    /// `(field name, env var name)` for every exposed field.
    pub fn env_var_names(&self) -> Vec<(String, String)> {
        self.exposed()
            .map(|(f, _)| (f.name().to_string(), self.env_var_name(f)))
            .collect()
    }

    /// Encoding mode of a list field; `None` for non-list or excluded fields.
    pub fn list_mode(&self, name: &str) -> Option<ListMode> {
        self.binding(name).and_then(Binding::list_mode)
    }

    /// Same schema with a different environment prefix.
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    /// Same schema with strict mode switched.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    env_prefix: Option<String>,
    boolean_off_prefix: Option<String>,
    comma_separated_lists: Option<bool>,
    populate_by_name: Option<bool>,
    strict: Option<bool>,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            env_prefix: None,
            boolean_off_prefix: None,
            comma_separated_lists: None,
            populate_by_name: None,
            strict: None,
            fields: Vec::new(),
        }
    }

    /// Environment variable prefix, e.g. `"APP_"` (default: empty).
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Prefix for boolean off flags (default: `"no"`).
    pub fn boolean_off_prefix(mut self, prefix: &str) -> Self {
        self.boolean_off_prefix = Some(prefix.to_string());
        self
    }

    /// Make every list option comma-separated unless it says otherwise.
    pub fn comma_separated_lists(mut self, enabled: bool) -> Self {
        self.comma_separated_lists = Some(enabled);
        self
    }

    pub fn populate_by_name(mut self, enabled: bool) -> Self {
        self.populate_by_name = Some(enabled);
        self
    }

    /// Reject CLI values and config-file keys that match no field.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    /// Add a field. Re-declaring an existing name replaces it in place.
    pub fn field(mut self, field: Field) -> Self {
        match self.fields.iter().position(|f| f.name() == field.name()) {
            Some(i) => self.fields[i] = field,
            None => self.fields.push(field),
        }
        self
    }

    pub fn fields(self, fields: impl IntoIterator<Item = Field>) -> Self {
        fields.into_iter().fold(self, SchemaBuilder::field)
    }

    /// Inherit from `parent`: its fields first, then anything declared on this
    /// builder overrides them. Settings not set on this builder are taken from
    /// the parent.
    pub fn extend(mut self, parent: &Schema) -> Self {
        let own = std::mem::take(&mut self.fields);
        self.fields = parent.fields.clone();
        self = self.fields(own);

        self.env_prefix.get_or_insert_with(|| parent.env_prefix.clone());
        self.boolean_off_prefix
            .get_or_insert_with(|| parent.boolean_off_prefix.clone());
        self.comma_separated_lists
            .get_or_insert(parent.comma_separated_lists);
        self.populate_by_name.get_or_insert(parent.populate_by_name);
        self.strict.get_or_insert(parent.strict);
        self
    }

    pub fn build(self) -> Result<Schema, WryfigError> {
        let boolean_off_prefix = self
            .boolean_off_prefix
            .unwrap_or_else(|| DEFAULT_BOOLEAN_OFF_PREFIX.to_string());
        let comma_separated_lists = self.comma_separated_lists.unwrap_or(false);

        for field in &self.fields {
            if let Some(pattern) = &field.constraint_set().pattern
                && let Err(e) = regex::Regex::new(pattern)
            {
                return Err(WryfigError::InvalidFieldOptions {
                    field: field.name().to_string(),
                    reason: format!("invalid pattern '{pattern}': {e}"),
                });
            }
        }

        let bindings = self
            .fields
            .iter()
            .map(|field| bind(field, &self.fields, &boolean_off_prefix, comma_separated_lists))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Schema {
            name: self.name,
            env_prefix: self.env_prefix.unwrap_or_default(),
            boolean_off_prefix,
            comma_separated_lists,
            populate_by_name: self.populate_by_name.unwrap_or(true),
            strict: self.strict.unwrap_or(false),
            fields: self.fields,
            bindings,
        })
    }
}

fn bind(
    field: &Field,
    all: &[Field],
    off_prefix: &str,
    comma_separated_lists: bool,
) -> Result<Binding, WryfigError> {
    let ty = field.declared_type();
    match field.marker() {
        Marker::Exclude => Ok(Binding::Excluded),
        Marker::Argument => Ok(Binding::Argument {
            name: field.external_name().to_lowercase(),
            list: ty.is_list(),
            required: field.is_required(),
        }),
        Marker::Option(spec) => {
            spec.check(field.name())?;

            let bool_flag = ty.is_bool().then(|| {
                flag::bool_flag(field.name(), field.external_name(), spec, off_prefix, |key| {
                    all.iter().any(|f| f.matches_key(key))
                })
            });
            let list_mode = ty.is_list().then(|| {
                if spec.comma_separated || comma_separated_lists {
                    ListMode::CommaSeparated
                } else {
                    ListMode::Repeated
                }
            });

            Ok(Binding::Option {
                long: flag::hyphenate(field.external_name()),
                bool_flag,
                list_mode,
                required: field.is_required() || spec.required,
            })
        }
    }
}
