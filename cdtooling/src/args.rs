//! Argument parsing and the exact-key contract for operation inputs.
//!
//! ```rust
//! use cdcommon::Domain;
//! use cdtooling::{Operation, parse_arguments, validate_arguments};
//!
//! let operation = Operation::new("grievance-status", Domain::Grievance, "grievance_id", "");
//! let args = parse_arguments(&serde_json::json!({"grievance_id": "GRV-2024-001"}))
//!     .expect("object should parse");
//! let key = validate_arguments(&operation, &args).expect("exact key");
//! assert_eq!(key, "GRV-2024-001");
//! ```

use std::collections::BTreeMap;

use serde_json::Value;

use crate::{Operation, ToolError};

pub type Arguments = BTreeMap<String, String>;

/// Reads a JSON object whose values are all strings.
pub fn parse_arguments(value: &Value) -> Result<Arguments, ToolError> {
    let object = match value {
        Value::Object(object) => object,
        Value::Null => return Ok(Arguments::new()),
        _ => return Err(ToolError::bad_request("expected JSON object arguments")),
    };

    object
        .iter()
        .map(|(key, value)| match value {
            Value::String(text) => Ok((key.clone(), text.clone())),
            _ => Err(ToolError::bad_request(format!(
                "argument '{key}' must be a string"
            ))),
        })
        .collect()
}

/// Checks that `args` holds exactly the operation's input key with a
/// non-blank value and returns that value trimmed.
pub fn validate_arguments<'a>(
    operation: &Operation,
    args: &'a Arguments,
) -> Result<&'a str, ToolError> {
    let extra: Vec<&str> = args
        .keys()
        .filter(|key| **key != operation.input_key)
        .map(String::as_str)
        .collect();
    if !extra.is_empty() {
        return Err(ToolError::bad_request(format!(
            "unexpected argument(s) {}; '{}' accepts only '{}'",
            extra.join(", "),
            operation.name,
            operation.input_key
        ))
        .with_operation(&operation.name));
    }

    let value = args
        .get(&operation.input_key)
        .map(|value| value.trim())
        .ok_or_else(|| {
            ToolError::bad_request(format!("missing required argument '{}'", operation.input_key))
                .with_operation(&operation.name)
        })?;

    if value.is_empty() {
        return Err(ToolError::bad_request(format!(
            "argument '{}' must not be empty",
            operation.input_key
        ))
        .with_operation(&operation.name));
    }

    Ok(value)
}
