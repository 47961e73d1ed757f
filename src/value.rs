use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::utils::format_number;

/// A fully evaluated value.
///
/// Lists keep source order and maps keep insertion order; equality is
/// structural.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Value>> {
        if let Value::List(items) = self {
            Some(items)
        } else {
            None
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        if let Value::Map(entries) = self {
            Some(entries)
        } else {
            None
        }
    }

    /// Render a scalar the way it appears inside a string template.
    ///
    /// Collections and null have no string form.
    pub fn to_template_string(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(format_number(*n)),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::List(_) | Value::Map(_) => None,
        }
    }

    /// Numeric view, accepting strings that spell a number.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Key used when this value indexes into a map.
    pub fn to_map_key(&self) -> Option<String> {
        match self {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => self.to_template_string(),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?} = {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_string_formats_integral_numbers_without_fraction() {
        assert_eq!(Value::Number(3.0).to_template_string(), Some("3".into()));
        assert_eq!(Value::Number(2.5).to_template_string(), Some("2.5".into()));
        assert_eq!(Value::Bool(true).to_template_string(), Some("true".into()));
        assert_eq!(Value::List(vec![]).to_template_string(), None);
    }

    #[test]
    fn test_json_roundtrip_keeps_map_order() {
        let json = r#"{"b": 1, "a": [true, null, "x"]}"#;
        let value: Value = serde_json::from_str(json).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(
            map["a"],
            Value::List(vec![Value::Bool(true), Value::Null, Value::from("x")])
        );
    }

    #[test]
    fn test_numeric_strings_convert_to_numbers() {
        assert_eq!(Value::from(" 42 ").to_number(), Some(42.0));
        assert_eq!(Value::from("forty").to_number(), None);
    }
}
