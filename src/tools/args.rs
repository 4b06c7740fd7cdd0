// src/tools/args.rs
//! Argument extraction for tool handlers.
//!
//! Model-generated arguments are loose: ids arrive as strings or numbers, lists as arrays
//! or comma-separated strings. These helpers accept both and reject everything else with
//! a message the caller can act on.

use serde_json::{Map, Value};
use thiserror::Error;

use super::{Arguments, ToolResult};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    #[error("missing required argument '{key}'")]
    Missing { key: String },
    #[error("argument '{key}' must be {expected}")]
    WrongType { key: String, expected: &'static str },
    /// `.` and `..` would be resolved as dot segments and address another resource.
    #[error("argument '{key}' is not a usable identifier: '{value}'")]
    ReservedId { key: String, value: String },
}

impl ArgError {
    fn missing(key: &str) -> Self {
        ArgError::Missing {
            key: key.to_string(),
        }
    }

    fn wrong_type(key: &str, expected: &'static str) -> Self {
        ArgError::WrongType {
            key: key.to_string(),
            expected,
        }
    }
}

impl ToolResult {
    pub fn invalid_arguments(tool: &str, error: &ArgError) -> Self {
        ToolResult::error(format!("Invalid arguments for '{}': {}", tool, error))
    }
}

fn present<'a>(args: &'a Arguments, key: &str) -> Option<&'a Value> {
    args.get(key).filter(|v| !v.is_null())
}

/// Identifier given as a non-empty string or an integer.
pub fn required_id(args: &Arguments, key: &str) -> Result<String, ArgError> {
    match present(args, key) {
        None => Err(ArgError::missing(key)),
        Some(Value::String(s)) if matches!(s.trim(), "." | "..") => Err(ArgError::ReservedId {
            key: key.to_string(),
            value: s.trim().to_string(),
        }),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::Number(n)) if n.is_u64() || n.is_i64() => Ok(n.to_string()),
        Some(Value::String(_)) => Err(ArgError::missing(key)),
        Some(_) => Err(ArgError::wrong_type(key, "a string or integer identifier")),
    }
}

pub fn optional_id(args: &Arguments, key: &str) -> Result<Option<String>, ArgError> {
    match present(args, key) {
        None => Ok(None),
        Some(_) => required_id(args, key).map(Some),
    }
}

pub fn required_str(args: &Arguments, key: &str) -> Result<String, ArgError> {
    match present(args, key) {
        None => Err(ArgError::missing(key)),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(ArgError::missing(key)),
        Some(_) => Err(ArgError::wrong_type(key, "a string")),
    }
}

pub fn optional_str(args: &Arguments, key: &str) -> Result<Option<String>, ArgError> {
    match present(args, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ArgError::wrong_type(key, "a string")),
    }
}

pub fn optional_u64(args: &Arguments, key: &str) -> Result<Option<u64>, ArgError> {
    match present(args, key) {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| ArgError::wrong_type(key, "a non-negative integer")),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ArgError::wrong_type(key, "a non-negative integer")),
        Some(_) => Err(ArgError::wrong_type(key, "a non-negative integer")),
    }
}

pub fn optional_f64(args: &Arguments, key: &str) -> Result<Option<f64>, ArgError> {
    match present(args, key) {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| ArgError::wrong_type(key, "a number")),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ArgError::wrong_type(key, "a number")),
        Some(_) => Err(ArgError::wrong_type(key, "a number")),
    }
}

/// Non-empty list of strings, from an array or a comma-separated string.
pub fn required_str_list(args: &Arguments, key: &str) -> Result<Vec<String>, ArgError> {
    match optional_str_list(args, key)? {
        Some(items) if !items.is_empty() => Ok(items),
        _ => Err(ArgError::missing(key)),
    }
}

pub fn optional_str_list(args: &Arguments, key: &str) -> Result<Option<Vec<String>>, ArgError> {
    const EXPECTED: &str = "a list of strings";
    match present(args, key) {
        None => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|s| s.trim().to_string())
                    .ok_or_else(|| ArgError::wrong_type(key, EXPECTED))
            })
            .filter(|item| !matches!(item, Ok(s) if s.is_empty()))
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(Value::String(s)) => Ok(Some(
            s.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
        )),
        Some(_) => Err(ArgError::wrong_type(key, EXPECTED)),
    }
}

/// Copy the listed keys that are present into a new JSON object.
pub fn pick_fields(args: &Arguments, keys: &[&str]) -> Value {
    let mut picked = Map::new();
    for key in keys {
        if let Some(value) = present(args, key) {
            picked.insert((*key).to_string(), value.clone());
        }
    }
    Value::Object(picked)
}

/// Query pairs for the optional string/integer filters that were supplied.
pub fn query_pairs(
    args: &Arguments,
    keys: &[&'static str],
) -> Result<Vec<(&'static str, String)>, ArgError> {
    let mut pairs = Vec::new();
    for &key in keys {
        match present(args, key) {
            None => {}
            Some(Value::String(s)) if s.trim().is_empty() => {}
            Some(Value::String(s)) => pairs.push((key, s.trim().to_string())),
            Some(Value::Number(n)) => pairs.push((key, n.to_string())),
            Some(Value::Bool(b)) => pairs.push((key, b.to_string())),
            Some(_) => return Err(ArgError::wrong_type(key, "a string or number")),
        }
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_required_id_accepts_string_and_integer() {
        let a = args(json!({"a": "job-1", "b": 42, "c": "  ", "d": 1.5, "e": null}));
        assert_eq!(required_id(&a, "a").unwrap(), "job-1");
        assert_eq!(required_id(&a, "b").unwrap(), "42");
        assert!(required_id(&a, "c").is_err());
        assert!(required_id(&a, "d").is_err());
        assert!(required_id(&a, "e").is_err());
        assert_eq!(
            required_id(&a, "missing").unwrap_err().to_string(),
            "missing required argument 'missing'"
        );
    }

    #[test]
    fn test_dot_segment_ids_rejected() {
        let a = args(json!({"dot": ".", "dots": " .. ", "dotted": "v1.2"}));
        assert!(matches!(
            required_id(&a, "dot"),
            Err(ArgError::ReservedId { ref value, .. }) if value == "."
        ));
        assert!(matches!(required_id(&a, "dots"), Err(ArgError::ReservedId { .. })));
        assert!(optional_id(&a, "dots").is_err());
        assert_eq!(required_id(&a, "dotted").unwrap(), "v1.2");
    }

    #[test]
    fn test_optional_numbers() {
        let a = args(json!({"limit": 5, "text": "7", "bad": "x", "neg": -1, "score": 0.7}));
        assert_eq!(optional_u64(&a, "limit").unwrap(), Some(5));
        assert_eq!(optional_u64(&a, "text").unwrap(), Some(7));
        assert_eq!(optional_u64(&a, "none").unwrap(), None);
        assert!(optional_u64(&a, "bad").is_err());
        assert!(optional_u64(&a, "neg").is_err());
        assert_eq!(optional_f64(&a, "score").unwrap(), Some(0.7));
    }

    #[test]
    fn test_string_lists() {
        let a = args(json!({
            "arr": ["a@x.io", " b@x.io "],
            "csv": "a@x.io, b@x.io,",
            "empty": [],
            "mixed": ["a", 1],
        }));
        assert_eq!(
            required_str_list(&a, "arr").unwrap(),
            vec!["a@x.io", "b@x.io"]
        );
        assert_eq!(
            required_str_list(&a, "csv").unwrap(),
            vec!["a@x.io", "b@x.io"]
        );
        assert!(required_str_list(&a, "empty").is_err());
        assert!(optional_str_list(&a, "mixed").is_err());
    }

    #[test]
    fn test_pick_fields_skips_absent_and_null() {
        let a = args(json!({"title": "Dev", "location": null, "extra": 1}));
        assert_eq!(
            pick_fields(&a, &["title", "location", "department"]),
            json!({"title": "Dev"})
        );
    }

    #[test]
    fn test_query_pairs() {
        let a = args(json!({"status": "open", "limit": 10, "job_id": ""}));
        let pairs = query_pairs(&a, &["status", "limit", "job_id"]).unwrap();
        assert_eq!(
            pairs,
            vec![("status", "open".to_string()), ("limit", "10".to_string())]
        );
        let bad = args(json!({"status": ["x"]}));
        assert!(query_pairs(&bad, &["status"]).is_err());
    }

    #[test]
    fn test_invalid_arguments_result() {
        let result = ToolResult::invalid_arguments("get_job", &ArgError::missing("job_id"));
        assert!(result.is_error);
        assert_eq!(
            result.text_content(),
            "Invalid arguments for 'get_job': missing required argument 'job_id'"
        );
    }
}
