//! The default validation layer.
//!
//! Turns a resolved `field -> value` map into a typed object. Every field is
//! checked and all problems are reported together, one [`FieldError`] per
//! offending field:
//!
//! 1. missing fields take their default; fields with no default, and
//!    `required` options still at their default, are reported as
//!    `Field required`;
//! 2. values are coerced laxly to the declared type (numeric strings to
//!    numbers, boolean words to `bool`, whole floats to integers);
//! 3. numeric bounds, `multiple_of`, string patterns and length bounds are
//!    enforced;
//! 4. the coerced map is deserialized into the target type with `serde`, and
//!    [`Model::validate`] runs last.
//!
//! Raw environment strings that failed conversion earlier end up here and
//! fail step 2 with a proper message.

use std::fmt;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use crate::convert;
use crate::error::WryfigError;
use crate::field::{Constraints, Field};
use crate::schema::Schema;
use crate::types::{DeclaredType, Source};

/// A configuration type bound to a [`Schema`].
///
/// Field names in the schema are the serde field names of the type.
pub trait Model: DeserializeOwned {
    fn schema() -> Result<Schema, WryfigError>;

    /// Extra checks run after deserialization.
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

/// One problem with one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n  {}", self.field, self.message)
    }
}

/// Every field error found while validating one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    pub schema: String,
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new(schema: &str, errors: Vec<FieldError>) -> Self {
        Self {
            schema: schema.to_string(),
            errors,
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Names of the offending fields, in report order.
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.errors.len();
        let plural = if n == 1 { "" } else { "s" };
        write!(f, "{n} validation error{plural} for {}", self.schema)?;
        for error in &self.errors {
            write!(f, "\n{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

const FIELD_REQUIRED: &str = "Field required";

/// Check and coerce resolved values. `source_of` reports where each present
/// value came from, for `required` options.
pub fn validate_values(
    schema: &Schema,
    values: &Map<String, Value>,
    source_of: impl Fn(&str) -> Option<Source>,
) -> Result<Map<String, Value>, ValidationErrors> {
    let mut out = Map::new();
    let mut errors = Vec::new();

    for field in schema.fields() {
        let name = field.name();
        let Some(value) = values
            .get(name)
            .cloned()
            .or_else(|| field.default().produce())
        else {
            errors.push(FieldError::new(name, FIELD_REQUIRED));
            continue;
        };

        let forced = field.option_spec().is_some_and(|spec| spec.required);
        if forced && source_of(name).is_none_or(|s| s == Source::Default) {
            errors.push(FieldError::new(name, FIELD_REQUIRED));
            continue;
        }

        match check_field(field, &value) {
            Ok(value) => {
                out.insert(name.to_string(), value);
            }
            Err(error) => errors.push(error),
        }
    }

    if errors.is_empty() {
        Ok(out)
    } else {
        Err(ValidationErrors::new(schema.name(), errors))
    }
}

/// Validate and build `T` from resolved values.
pub fn instantiate<T: Model>(
    schema: &Schema,
    values: &Map<String, Value>,
    source_of: impl Fn(&str) -> Option<Source>,
) -> Result<T, WryfigError> {
    let checked = validate_values(schema, values, source_of)?;
    let config: T = serde_json::from_value(Value::Object(checked)).map_err(|e| {
        ValidationErrors::new(schema.name(), vec![FieldError::new(schema.name(), &e.to_string())])
    })?;
    config.validate()?;
    Ok(config)
}

fn check_field(field: &Field, value: &Value) -> Result<Value, FieldError> {
    let coerced = coerce(value, field.declared_type())
        .map_err(|(path, message)| FieldError::new(&join_path(field.name(), &path), &message))?;
    check_constraints(&coerced, field.constraint_set())
        .map_err(|message| FieldError::new(field.name(), &message))?;
    Ok(coerced)
}

fn join_path(name: &str, path: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{name}.{path}")
    }
}

/// Lax coercion to `ty`. Errors carry a path below the field (list index) and
/// a message.
fn coerce(value: &Value, ty: &DeclaredType) -> Result<Value, (String, String)> {
    let fail = |what: &str| Err((String::new(), format!("Input should be a valid {what}")));

    match ty {
        DeclaredType::Optional(_) if value.is_null() => Ok(Value::Null),
        DeclaredType::Optional(inner) => coerce(value, inner),
        DeclaredType::String => match value {
            Value::String(_) => Ok(value.clone()),
            _ => fail("string"),
        },
        DeclaredType::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            Value::Number(n) => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Ok(Value::from(f as i64))
                }
                _ => fail("integer"),
            },
            Value::String(s) => convert::parse_int(s).map_or_else(|| fail("integer"), Ok),
            _ => fail("integer"),
        },
        DeclaredType::Float => match value {
            Value::Number(n) => match n.as_f64().and_then(Number::from_f64) {
                Some(n) => Ok(Value::Number(n)),
                None => fail("number"),
            },
            Value::String(s) => convert::parse_float(s).map_or_else(|| fail("number"), Ok),
            _ => fail("number"),
        },
        DeclaredType::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) => convert::parse_bool_lax(s).map_or_else(|| fail("boolean"), |b| Ok(Value::Bool(b))),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => fail("boolean"),
            },
            _ => fail("boolean"),
        },
        DeclaredType::List(element) => match value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    coerce(item, element).map_err(|(path, msg)| (join_path(&i.to_string(), &path), msg))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            _ => fail("list"),
        },
    }
}

fn check_constraints(value: &Value, c: &Constraints) -> Result<(), String> {
    if let Some(n) = value.as_f64() {
        check_bound(n, c.ge, |n, b| n >= b, "greater than or equal to")?;
        check_bound(n, c.gt, |n, b| n > b, "greater than")?;
        check_bound(n, c.le, |n, b| n <= b, "less than or equal to")?;
        check_bound(n, c.lt, |n, b| n < b, "less than")?;
        if let Some(m) = c.multiple_of
            && !is_multiple_of(n, m)
        {
            return Err(format!("Input should be a multiple of {m}"));
        }
    }

    if let (Value::String(s), Some(pattern)) = (value, &c.pattern) {
        let re = Regex::new(pattern).map_err(|e| format!("Invalid pattern '{pattern}': {e}"))?;
        if !re.is_match(s) {
            return Err(format!("String should match pattern '{pattern}'"));
        }
    }

    let (len, what, unit) = match value {
        Value::String(s) => (s.chars().count(), "String", "characters"),
        Value::Array(items) => (items.len(), "List", "items"),
        _ => return Ok(()),
    };
    if let Some(min) = c.min_length
        && len < min
    {
        return Err(format!("{what} should have at least {min} {unit}"));
    }
    if let Some(max) = c.max_length
        && len > max
    {
        return Err(format!("{what} should have at most {max} {unit}"));
    }
    Ok(())
}

/// `n` is a multiple of `m` within a relative tolerance of `1e-9`.
fn is_multiple_of(n: f64, m: f64) -> bool {
    if m == 0.0 {
        return true;
    }
    let rem = n % m;
    let tolerance = n.abs() / 1e9;
    rem.abs() <= tolerance || (rem - m).abs() <= tolerance || (rem + m).abs() <= tolerance
}

fn check_bound(
    n: f64,
    bound: Option<f64>,
    ok: impl Fn(f64, f64) -> bool,
    relation: &str,
) -> Result<(), String> {
    match bound {
        Some(b) if !ok(n, b) => Err(format!("Input should be {relation} {b}")),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::OptionSpec;
    use crate::fixtures::test::{object, server_schema};
    use serde_json::json;

    fn no_sources(_: &str) -> Option<Source> {
        None
    }

    fn schema() -> Schema {
        Schema::builder("Limits")
            .field(
                Field::new("port", DeclaredType::Integer)
                    .default_value(8080)
                    .constraints(Constraints::new().ge(1).le(65535)),
            )
            .field(
                Field::new("ratio", DeclaredType::Float)
                    .default_value(0.5)
                    .constraints(Constraints::new().gt(0).lt(1)),
            )
            .field(
                Field::new("step", DeclaredType::Integer)
                    .default_value(10)
                    .constraints(Constraints::new().multiple_of(5)),
            )
            .field(
                Field::new("code", DeclaredType::String)
                    .default_value("abc")
                    .constraints(Constraints::new().min_length(2).max_length(4)),
            )
            .field(
                Field::new("hosts", DeclaredType::list(DeclaredType::String))
                    .default_factory(|| json!(["a"]))
                    .constraints(Constraints::new().min_length(1)),
            )
            .build()
            .unwrap()
    }

    fn defaults() -> Map<String, Value> {
        object(json!({"port": 8080, "ratio": 0.5, "step": 10, "code": "abc", "hosts": ["a"]}))
    }

    fn with(key: &str, value: Value) -> Map<String, Value> {
        let mut values = defaults();
        values.insert(key.to_string(), value);
        values
    }

    fn error_for(key: &str, value: Value) -> FieldError {
        let errors = validate_values(&schema(), &with(key, value), no_sources).unwrap_err();
        assert_eq!(errors.len(), 1, "{errors}");
        errors.errors[0].clone()
    }

    #[test]
    fn defaults_pass() {
        let out = validate_values(&schema(), &defaults(), no_sources).unwrap();
        assert_eq!(Value::Object(out), Value::Object(defaults()));
    }

    #[test]
    fn numeric_strings_coerced() {
        let out = validate_values(&schema(), &with("port", json!("9000")), no_sources).unwrap();
        assert_eq!(out["port"], json!(9000));
        let out = validate_values(&schema(), &with("ratio", json!("0.25")), no_sources).unwrap();
        assert_eq!(out["ratio"], json!(0.25));
    }

    #[test]
    fn whole_float_to_integer() {
        let out = validate_values(&schema(), &with("port", json!(9000.0)), no_sources).unwrap();
        assert_eq!(out["port"], json!(9000));
    }

    #[test]
    fn non_numeric_string_rejected() {
        let err = error_for("port", json!("eighty"));
        assert_eq!(err.field, "port");
        assert_eq!(err.message, "Input should be a valid integer");
    }

    #[test]
    fn bounds_enforced() {
        assert_eq!(
            error_for("port", json!(0)).message,
            "Input should be greater than or equal to 1"
        );
        assert_eq!(
            error_for("port", json!(70000)).message,
            "Input should be less than or equal to 65535"
        );
        assert_eq!(error_for("ratio", json!(0)).message, "Input should be greater than 0");
        assert_eq!(error_for("ratio", json!(1.0)).message, "Input should be less than 1");
    }

    #[test]
    fn multiple_of_enforced() {
        assert_eq!(error_for("step", json!(12)).message, "Input should be a multiple of 5");
    }

    #[test]
    fn float_multiple_of_tolerates_rounding() {
        let schema = Schema::builder("F")
            .field(
                Field::new("step", DeclaredType::Float)
                    .constraints(Constraints::new().multiple_of(0.1)),
            )
            .build()
            .unwrap();
        for ok in [0.3, 0.7, 1.1, -0.3, 0.0] {
            assert!(
                validate_values(&schema, &object(json!({"step": ok})), no_sources).is_ok(),
                "{ok} should be a multiple of 0.1"
            );
        }
        let errors =
            validate_values(&schema, &object(json!({"step": 0.35})), no_sources).unwrap_err();
        assert_eq!(errors.errors[0].message, "Input should be a multiple of 0.1");
    }

    #[test]
    fn missing_fields_take_defaults() {
        let values = object(json!({"name": "svc"}));
        let out = validate_values(&server_schema(), &values, no_sources).unwrap();
        assert_eq!(out["port"], json!(8080));
        assert_eq!(out["tags"], json!([]));
        assert_eq!(out["internal"], json!("hidden"));
    }

    #[test]
    fn lengths_enforced() {
        assert_eq!(
            error_for("code", json!("a")).message,
            "String should have at least 2 characters"
        );
        assert_eq!(
            error_for("code", json!("abcde")).message,
            "String should have at most 4 characters"
        );
        assert_eq!(error_for("hosts", json!([])).message, "List should have at least 1 items");
    }

    #[test]
    fn pattern_enforced() {
        let schema = Schema::builder("P")
            .field(
                Field::new("region", DeclaredType::String)
                    .constraints(Constraints::new().pattern("^[a-z]{2}-[a-z]+$")),
            )
            .build()
            .unwrap();
        assert!(validate_values(&schema, &object(json!({"region": "eu-west"})), no_sources).is_ok());
        let errors =
            validate_values(&schema, &object(json!({"region": "EU"})), no_sources).unwrap_err();
        assert_eq!(
            errors.errors[0].message,
            "String should match pattern '^[a-z]{2}-[a-z]+$'"
        );
    }

    #[test]
    fn list_element_path_reported() {
        let schema = Schema::builder("L")
            .field(Field::new("ports", DeclaredType::list(DeclaredType::Integer)))
            .build()
            .unwrap();
        let errors =
            validate_values(&schema, &object(json!({"ports": [1, "x"]})), no_sources).unwrap_err();
        assert_eq!(errors.fields(), vec!["ports.1"]);
    }

    #[test]
    fn bool_words_and_numbers() {
        let schema = Schema::builder("B")
            .field(Field::new("a", DeclaredType::Boolean))
            .field(Field::new("b", DeclaredType::Boolean))
            .build()
            .unwrap();
        let out = validate_values(&schema, &object(json!({"a": "on", "b": 0})), no_sources).unwrap();
        assert_eq!(out["a"], json!(true));
        assert_eq!(out["b"], json!(false));
        let out = validate_values(&schema, &object(json!({"a": "y", "b": "F"})), no_sources).unwrap();
        assert_eq!(out["a"], json!(true));
        assert_eq!(out["b"], json!(false));
    }

    #[test]
    fn optional_accepts_null() {
        let schema = Schema::builder("O")
            .field(Field::new("t", DeclaredType::optional(DeclaredType::Integer)).default_value(Value::Null))
            .build()
            .unwrap();
        let out = validate_values(&schema, &object(json!({"t": null})), no_sources).unwrap();
        assert_eq!(out["t"], Value::Null);
        let out = validate_values(&schema, &object(json!({"t": "5"})), no_sources).unwrap();
        assert_eq!(out["t"], json!(5));
    }

    #[test]
    fn all_errors_reported() {
        let mut values = defaults();
        values.insert("port".into(), json!("x"));
        values.insert("code".into(), json!("toolong"));
        let errors = validate_values(&schema(), &values, no_sources).unwrap_err();
        assert_eq!(errors.fields(), vec!["port", "code"]);
        assert!(errors.to_string().starts_with("2 validation errors for Limits"));
    }

    #[test]
    fn missing_required_field_listed() {
        let errors = validate_values(&server_schema(), &Map::new(), no_sources).unwrap_err();
        assert_eq!(errors.fields(), vec!["name"]);
        assert_eq!(errors.errors[0].message, "Field required");
        assert_eq!(
            errors.to_string(),
            "1 validation error for ServerConfig\nname\n  Field required"
        );
    }

    #[test]
    fn forced_required_option_at_default_fails() {
        let schema = Schema::builder("R")
            .field(
                Field::new("region", DeclaredType::String)
                    .default_value("us")
                    .option(OptionSpec::new().required()),
            )
            .build()
            .unwrap();
        let values = object(json!({"region": "us"}));

        let errors = validate_values(&schema, &values, |_| Some(Source::Default)).unwrap_err();
        assert_eq!(errors.fields(), vec!["region"]);

        assert!(validate_values(&schema, &values, |_| Some(Source::Env)).is_ok());
    }
}
