//! List field encodings: repeated single-value flags or one comma-separated
//! value.
//!
//! Comma-separated input is split on `,`, each element trimmed, and empty
//! elements (from `a,,b`, a leading or a trailing comma) dropped. Elements are
//! coerced to the list's element type here because the CLI framework has no
//! per-element type hook for a single string.
//!
//! Decoding is idempotent: a value that is already an array (a list default,
//! or a config-file value) comes back unchanged.

use serde_json::Value;

use crate::convert::coerce_scalar;
use crate::error::WryfigError;
use crate::types::DeclaredType;

/// How a list field accepts its value on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// `--tag a --tag b`: each occurrence appends one element.
    Repeated,
    /// `--tags a,b`: one value split on commas.
    CommaSeparated,
}

/// Split on commas, trimming each element and dropping empty ones.
pub fn split_comma_separated(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

/// Decode a list value.
///
/// - arrays are returned unchanged,
/// - `null` and the empty string decode to `[]`,
/// - strings are split (comma mode) or wrapped (repeated mode) and each element
///   coerced to `element`,
/// - any other scalar is wrapped in a one-element list.
pub fn decode_list(value: &Value, mode: ListMode, element: &DeclaredType) -> Result<Value, WryfigError> {
    match value {
        Value::Array(_) => Ok(value.clone()),
        Value::Null => Ok(Value::Array(Vec::new())),
        Value::String(s) if s.is_empty() => Ok(Value::Array(Vec::new())),
        Value::String(s) => match mode {
            ListMode::CommaSeparated => decode_comma_separated(s, element),
            ListMode::Repeated => decode_repeated([s.as_str()], element),
        },
        other => Ok(Value::Array(vec![other.clone()])),
    }
}

/// Split and coerce one comma-separated string.
pub fn decode_comma_separated(raw: &str, element: &DeclaredType) -> Result<Value, WryfigError> {
    let items = split_comma_separated(raw)
        .into_iter()
        .map(|item| coerce_element(item, raw, element))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Array(items))
}

/// Collect repeated occurrences into a list, in call order.
pub fn decode_repeated<'a>(
    occurrences: impl IntoIterator<Item = &'a str>,
    element: &DeclaredType,
) -> Result<Value, WryfigError> {
    let items = occurrences
        .into_iter()
        .map(|item| coerce_element(item, item, element))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Array(items))
}

fn coerce_element(item: &str, whole: &str, element: &DeclaredType) -> Result<Value, WryfigError> {
    coerce_scalar(item, element).map_err(|reason| WryfigError::InvalidValue {
        param: format!("list[{}]", element.type_name()),
        value: whole.to_string(),
        reason: format!("element '{item}': {reason}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn split_trims_and_drops_empty() {
        assert_eq!(split_comma_separated("a, b ,,c,"), vec!["a", "b", "c"]);
        assert_eq!(split_comma_separated(",,"), Vec::<&str>::new());
    }

    #[test]
    fn comma_mode_strings() {
        let decoded = decode_list(&json!("a, b ,,c,"), ListMode::CommaSeparated, &DeclaredType::String)
            .unwrap();
        assert_eq!(decoded, json!(["a", "b", "c"]));
    }

    #[test]
    fn comma_mode_ints() {
        let decoded =
            decode_list(&json!("80, 443,8080"), ListMode::CommaSeparated, &DeclaredType::Integer)
                .unwrap();
        assert_eq!(decoded, json!([80, 443, 8080]));
    }

    #[test]
    fn comma_mode_floats() {
        let decoded =
            decode_list(&json!("1.5,2.75"), ListMode::CommaSeparated, &DeclaredType::Float).unwrap();
        assert_eq!(decoded, json!([1.5, 2.75]));
    }

    #[test]
    fn comma_mode_bad_int_errors() {
        let result = decode_list(&json!("1,two,3"), ListMode::CommaSeparated, &DeclaredType::Integer);
        match result {
            Err(WryfigError::InvalidValue { value, reason, .. }) => {
                assert_eq!(value, "1,two,3");
                assert!(reason.contains("two"));
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn repeated_mode_keeps_call_order() {
        let decoded = decode_repeated(["x", "y", "z"], &DeclaredType::String).unwrap();
        assert_eq!(decoded, json!(["x", "y", "z"]));
    }

    #[test]
    fn repeated_mode_coerces_elements() {
        let decoded = decode_repeated(["3", "1", "2"], &DeclaredType::Integer).unwrap();
        assert_eq!(decoded, json!([3, 1, 2]));
    }

    #[test]
    fn repeated_mode_single_string_wrapped() {
        let decoded = decode_list(&json!("a,b"), ListMode::Repeated, &DeclaredType::String).unwrap();
        assert_eq!(decoded, json!(["a,b"]));
    }

    #[test]
    fn already_list_unchanged() {
        let default = json!(["keep", " spaces "]);
        for mode in [ListMode::Repeated, ListMode::CommaSeparated] {
            assert_eq!(decode_list(&default, mode, &DeclaredType::String).unwrap(), default);
        }
    }

    #[test]
    fn decode_is_idempotent() {
        let once = decode_list(&json!("a,b"), ListMode::CommaSeparated, &DeclaredType::String).unwrap();
        let twice = decode_list(&once, ListMode::CommaSeparated, &DeclaredType::String).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn null_and_empty_decode_to_empty_list() {
        assert_eq!(
            decode_list(&Value::Null, ListMode::CommaSeparated, &DeclaredType::String).unwrap(),
            json!([])
        );
        assert_eq!(
            decode_list(&json!(""), ListMode::CommaSeparated, &DeclaredType::Integer).unwrap(),
            json!([])
        );
    }
}
