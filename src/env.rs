use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::convert::coerce_scalar;
use crate::list::{self, ListMode};
use crate::schema::Schema;
use crate::types::DeclaredType;

/// Collect environment values for every exposed field of `schema`.
///
/// The variable for a field is `{prefix}{UPPER_SNAKE(alias or name)}`. Unset
/// variables leave the field out of the result. Set values are converted to
/// the field's declared type; a value that does not convert is kept as the
/// raw string for the validation layer to reject.
///
/// Takes an iterator so tests can pass synthetic data instead of `std::env::vars()`.
pub fn resolve_env(
    schema: &Schema,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Map<String, Value> {
    let vars: HashMap<String, String> = vars.into_iter().collect();
    let mut values = Map::new();

    for (field, binding) in schema.exposed() {
        let name = schema.env_var_name(field);
        let Some(raw) = vars.get(&name) else {
            continue;
        };
        let value = convert_env_value(raw, field.declared_type(), binding.list_mode());
        values.insert(field.name().to_string(), value);
    }

    values
}

/// Convert one environment string to `ty`, falling back to the raw string.
///
/// Lists are decoded comma-separated when the field accepts that form and
/// otherwise become a one-element list. An empty string is an empty list.
pub fn convert_env_value(raw: &str, ty: &DeclaredType, mode: Option<ListMode>) -> Value {
    let fallback = || Value::String(raw.to_string());

    if let Some(element) = ty.element() {
        let mode = mode.unwrap_or(ListMode::Repeated);
        return list::decode_list(&fallback(), mode, element).unwrap_or_else(|_| fallback());
    }

    coerce_scalar(raw, ty).unwrap_or_else(|_| fallback())
}
