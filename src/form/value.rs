//! Bound field values.

use conform_spec::field::literal_text;
use conform_spec::FieldKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A value held by the form binding for one field.
///
/// `Empty` stands for "no value" (JSON `null`); parse failures land here
/// instead of producing a numeric garbage value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Empty,
    Boolean(bool),
    Integer(i64),
    String(String),
    Array(Vec<String>),
}

impl FieldValue {
    /// Coerce a JSON value into the representation used for `kind`.
    ///
    /// Numeric strings become integers for integer fields, scalar array items
    /// become strings. Anything that does not fit becomes `Empty`.
    pub fn from_json(kind: FieldKind, value: &Value) -> Self {
        match (kind, value) {
            (_, Value::Null) => FieldValue::Empty,
            (FieldKind::Integer, Value::Number(n)) => n.as_i64().map_or(FieldValue::Empty, FieldValue::Integer),
            (FieldKind::Integer, Value::String(s)) => parse_integer(s).unwrap_or(FieldValue::Empty),
            (FieldKind::Boolean, Value::Bool(b)) => FieldValue::Boolean(*b),
            (FieldKind::Array, Value::Array(items)) => FieldValue::Array(
                items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(literal_text)
                    .collect(),
            ),
            (FieldKind::String | FieldKind::Object, Value::String(s)) => FieldValue::String(s.clone()),
            (FieldKind::String | FieldKind::Object, Value::Number(_) | Value::Bool(_)) => {
                FieldValue::String(literal_text(value))
            }
            _ => FieldValue::Empty,
        }
    }

    /// Convert back into JSON for serialization of the finished config.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Empty => Value::Null,
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Array(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }

    /// True for `Empty`, empty strings and empty arrays.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::String(s) => s.is_empty(),
            FieldValue::Array(items) => items.is_empty(),
            FieldValue::Boolean(_) | FieldValue::Integer(_) => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[String]> {
        match self {
            FieldValue::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Array(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

/// Error for integer input that is not a whole number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerParseError {
    /// The text as typed by the user.
    pub input: String,
}

impl fmt::Display for IntegerParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.input.trim().is_empty() {
            return write!(f, "a whole number is required");
        }
        write!(f, "'{}' is not a whole number", self.input)
    }
}

impl std::error::Error for IntegerParseError {}

/// Parse integer field input.
///
/// Anything that is not a whole number, blank text included, is an error
/// carrying the raw text. Surrounding whitespace is ignored.
pub fn parse_integer(text: &str) -> Result<FieldValue, IntegerParseError> {
    text.trim()
        .parse::<i64>()
        .map(FieldValue::Integer)
        .map_err(|_| IntegerParseError {
            input: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_integer_valid() {
        assert_eq!(parse_integer("42"), Ok(FieldValue::Integer(42)));
        assert_eq!(parse_integer(" -7 "), Ok(FieldValue::Integer(-7)));
    }

    #[test]
    fn test_parse_integer_blank_is_an_error() {
        let err = parse_integer("").unwrap_err();
        assert_eq!(err.input, "");
        assert_eq!(err.to_string(), "a whole number is required");
        assert!(parse_integer("   ").is_err());
    }

    #[test]
    fn test_parse_integer_rejects_garbage() {
        let err = parse_integer("abc").unwrap_err();
        assert_eq!(err.input, "abc");
        assert!(err.to_string().contains("not a whole number"));
        assert!(parse_integer("4.2").is_err());
        assert!(parse_integer("99999999999999999999").is_err());
    }

    #[test]
    fn test_from_json_per_kind() {
        assert_eq!(FieldValue::from_json(FieldKind::Integer, &json!(5)), FieldValue::Integer(5));
        assert_eq!(FieldValue::from_json(FieldKind::Integer, &json!("12")), FieldValue::Integer(12));
        assert_eq!(FieldValue::from_json(FieldKind::Integer, &json!("x")), FieldValue::Empty);
        assert_eq!(FieldValue::from_json(FieldKind::Boolean, &json!(true)), FieldValue::Boolean(true));
        assert_eq!(
            FieldValue::from_json(FieldKind::Array, &json!(["a", 1])),
            FieldValue::Array(vec!["a".to_string(), "1".to_string()])
        );
        assert_eq!(
            FieldValue::from_json(FieldKind::Object, &json!("verify-ca")),
            FieldValue::String("verify-ca".to_string())
        );
        assert_eq!(FieldValue::from_json(FieldKind::String, &json!({ "a": 1 })), FieldValue::Empty);
        assert_eq!(FieldValue::from_json(FieldKind::Boolean, &Value::Null), FieldValue::Empty);
    }

    #[test]
    fn test_to_json() {
        assert_eq!(FieldValue::Empty.to_json(), Value::Null);
        assert_eq!(FieldValue::Integer(3).to_json(), json!(3));
        assert_eq!(
            FieldValue::Array(vec!["a".to_string()]).to_json(),
            json!(["a"])
        );
    }

    #[test]
    fn test_is_blank() {
        assert!(FieldValue::Empty.is_blank());
        assert!(FieldValue::String(String::new()).is_blank());
        assert!(FieldValue::Array(Vec::new()).is_blank());
        assert!(!FieldValue::Boolean(false).is_blank());
        assert!(!FieldValue::Integer(0).is_blank());
    }
}
