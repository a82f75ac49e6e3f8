//! String-to-value conversion shared by the environment resolver, list
//! decoding and the clap adapter.

use serde_json::{Number, Value};

use crate::types::DeclaredType;

/// Case-insensitive boolean words: `true/1/yes/on` and `false/0/no/off`.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// The validator's wider word set: [`parse_bool`] plus `t/f` and `y/n`.
pub fn parse_bool_lax(s: &str) -> Option<bool> {
    parse_bool(s).or_else(|| match s.trim().to_ascii_lowercase().as_str() {
        "t" | "y" => Some(true),
        "f" | "n" => Some(false),
        _ => None,
    })
}

pub fn parse_int(s: &str) -> Option<Value> {
    s.trim().parse::<i64>().ok().map(Value::from)
}

/// Parse a float. Non-finite results have no JSON form and count as failures.
pub fn parse_float(s: &str) -> Option<Value> {
    let f = s.trim().parse::<f64>().ok()?;
    Number::from_f64(f).map(Value::Number)
}

/// Convert one raw string to `ty`.
///
/// `Optional` types convert as their inner type. Strings and lists pass the
/// raw text through; list decoding lives in [`crate::list`]. The error is a
/// short reason suitable for an error message.
pub fn coerce_scalar(raw: &str, ty: &DeclaredType) -> Result<Value, String> {
    match ty.base() {
        DeclaredType::Boolean => parse_bool(raw)
            .map(Value::Bool)
            .ok_or_else(|| "expected a boolean (true/false, 1/0, yes/no, on/off)".to_string()),
        DeclaredType::Integer => parse_int(raw).ok_or_else(|| "expected an integer".to_string()),
        DeclaredType::Float => parse_float(raw).ok_or_else(|| "expected a number".to_string()),
        _ => Ok(Value::String(raw.to_string())),
    }
}
