// Author: Dustin Pilgrim
// License: MIT

use indexmap::IndexMap;

use crate::error::DecodeError;
use crate::value::Value;

// Field names are filled in by the caller through `DecodeError::for_field`.
fn mismatch(expected: &'static str, value: &Value) -> DecodeError {
    DecodeError::TypeMismatch {
        field: String::new(),
        expected,
        found: value.type_name(),
    }
}

impl TryFrom<Value> for String {
    type Error = DecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(s),
            Value::Number(_) | Value::Bool(_) => value
                .to_template_string()
                .ok_or_else(|| mismatch("string", &value)),
            _ => Err(mismatch("string", &value)),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = DecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Number(n) => Ok(n),
            Value::String(_) => value.to_number().ok_or_else(|| mismatch("number", &value)),
            _ => Err(mismatch("number", &value)),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = DecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let n = f64::try_from(value.clone()).map_err(|_| mismatch("integer", &value))?;
        // i64::MAX as f64 rounds up to 2^63, which is already out of range
        let in_range = n >= i64::MIN as f64 && n < i64::MAX as f64;
        if n.fract() != 0.0 || !n.is_finite() || !in_range {
            return Err(mismatch("integer", &value));
        }
        Ok(n as i64)
    }
}

impl TryFrom<Value> for bool {
    type Error = DecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match &value {
            Value::Bool(b) => Ok(*b),
            Value::String(s) if s == "true" => Ok(true),
            Value::String(s) if s == "false" => Ok(false),
            _ => Err(mismatch("bool", &value)),
        }
    }
}

impl TryFrom<Value> for Vec<String> {
    type Error = DecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::List(items) => items
                .into_iter()
                .map(|item| String::try_from(item).map_err(|_| list_mismatch()))
                .collect(),
            other => Err(mismatch("list of strings", &other)),
        }
    }
}

fn list_mismatch() -> DecodeError {
    DecodeError::TypeMismatch {
        field: String::new(),
        expected: "list of strings",
        found: "list",
    }
}

impl TryFrom<Value> for IndexMap<String, String> {
    type Error = DecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Map(entries) => {
                let mut out = IndexMap::with_capacity(entries.len());
                for (key, item) in entries {
                    let item = String::try_from(item).map_err(|e| e.for_field(&key))?;
                    out.insert(key, item);
                }
                Ok(out)
            }
            other => Err(mismatch("map of strings", &other)),
        }
    }
}
