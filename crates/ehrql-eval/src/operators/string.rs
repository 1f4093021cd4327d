//! String operators
//!
//! Implements: StringContains

use ehrql_types::Value;

use crate::error::{EvalError, EvalResult};

/// Substring search; codes are searched by their raw value
pub fn contains(haystack: &Value, needle: &Value) -> EvalResult<Value> {
    let text = match haystack {
        Value::Str(s) => s.as_str(),
        Value::Code(code) => code.to_primitive(),
        other => return Err(EvalError::type_mismatch("str or code", other.type_name())),
    };
    match needle.as_str() {
        Some(needle) => Ok(Value::Bool(text.contains(needle))),
        None => Err(EvalError::type_mismatch("str", needle.type_name())),
    }
}
