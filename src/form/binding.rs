//! Form binding capability.
//!
//! The binding owns field values and validation state. The form engine only
//! talks to it through [`FormBinding`], so hosts can plug in their own state
//! store; [`FormState`] is the in-memory implementation used by default.

use conform_spec::{FieldKind, FieldSpec};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use tracing::{trace, warn};

use super::value::FieldValue;

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Required,
    PatternMismatch { pattern: String },
    BelowMinimum { minimum: i64 },
    AboveMaximum { maximum: i64 },
    NotAnOption { value: String },
    InvalidInteger { input: String },
    WrongType { expected: FieldKind },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Required => write!(f, "This field is required"),
            ValidationError::PatternMismatch { pattern } => {
                write!(f, "Value must match pattern {}", pattern)
            }
            ValidationError::BelowMinimum { minimum } => {
                write!(f, "Value must be at least {}", minimum)
            }
            ValidationError::AboveMaximum { maximum } => {
                write!(f, "Value must be at most {}", maximum)
            }
            ValidationError::NotAnOption { value } => {
                write!(f, "'{}' is not one of the allowed options", value)
            }
            ValidationError::InvalidInteger { input } if input.trim().is_empty() => {
                write!(f, "Value must be a whole number")
            }
            ValidationError::InvalidInteger { input } => {
                write!(f, "'{}' is not a whole number", input)
            }
            ValidationError::WrongType { expected } => write!(f, "Expected a {} value", expected),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validation rules registered alongside a field.
#[derive(Debug, Clone)]
pub struct FieldRules {
    pub kind: FieldKind,
    pub required: bool,
    pub pattern: Option<Regex>,
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
    /// Allowed values; empty means unrestricted
    pub options: Vec<String>,
}

impl FieldRules {
    /// Derive rules from a field spec.
    ///
    /// An invalid `pattern` is logged and ignored rather than blocking the form.
    pub fn from_spec(spec: &FieldSpec) -> Self {
        let pattern = spec.pattern.as_deref().and_then(|pattern| match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!("Ignoring invalid pattern for '{}': {}", spec.field, e);
                None
            }
        });
        Self {
            kind: spec.kind,
            required: spec.required,
            pattern,
            minimum: spec.minimum,
            maximum: spec.maximum,
            options: spec.options.clone(),
        }
    }

    /// Check a value against these rules.
    pub fn check(&self, value: &FieldValue) -> Result<(), ValidationError> {
        if value.is_blank() {
            return if self.required {
                Err(ValidationError::Required)
            } else {
                Ok(())
            };
        }

        match (self.kind, value) {
            (FieldKind::String | FieldKind::Object, FieldValue::String(s)) => {
                if !self.options.is_empty() && !self.options.iter().any(|opt| opt == s) {
                    return Err(ValidationError::NotAnOption { value: s.clone() });
                }
                if let Some(pattern) = &self.pattern
                    && !pattern.is_match(s)
                {
                    return Err(ValidationError::PatternMismatch {
                        pattern: pattern.as_str().to_string(),
                    });
                }
                Ok(())
            }
            (FieldKind::Integer, FieldValue::Integer(i)) => {
                if let Some(minimum) = self.minimum
                    && *i < minimum
                {
                    return Err(ValidationError::BelowMinimum { minimum });
                }
                if let Some(maximum) = self.maximum
                    && *i > maximum
                {
                    return Err(ValidationError::AboveMaximum { maximum });
                }
                Ok(())
            }
            (FieldKind::Boolean, FieldValue::Boolean(_)) | (FieldKind::Array, FieldValue::Array(_)) => {
                Ok(())
            }
            (expected, _) => Err(ValidationError::WrongType { expected }),
        }
    }
}

/// Minimal form-state contract the engine renders against.
pub trait FormBinding {
    /// Register a field with its validation rules. Re-registering replaces the rules.
    fn register(&mut self, path: &str, rules: FieldRules);

    /// Detach a field, releasing its value, rules and error.
    fn unregister(&mut self, path: &str);

    fn is_registered(&self, path: &str) -> bool;

    fn value(&self, path: &str) -> Option<&FieldValue>;

    /// Store a value. Clears any error recorded for the field.
    fn set_value(&mut self, path: &str, value: FieldValue);

    fn error(&self, path: &str) -> Option<&ValidationError>;

    fn set_error(&mut self, path: &str, error: Option<ValidationError>);

    /// Run the registered rules for one field, recording the outcome.
    /// Returns true when the field is valid.
    fn validate_field(&mut self, path: &str) -> bool;

    /// Registered field paths in registration order.
    fn registered(&self) -> Vec<String>;
}

/// In-memory [`FormBinding`].
#[derive(Debug, Default)]
pub struct FormState {
    order: Vec<String>,
    rules: HashMap<String, FieldRules>,
    values: HashMap<String, FieldValue>,
    errors: HashMap<String, ValidationError>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FormBinding for FormState {
    fn register(&mut self, path: &str, rules: FieldRules) {
        trace!("register {}", path);
        if self.rules.insert(path.to_string(), rules).is_none() {
            self.order.push(path.to_string());
        }
    }

    fn unregister(&mut self, path: &str) {
        trace!("unregister {}", path);
        self.rules.remove(path);
        self.values.remove(path);
        self.errors.remove(path);
        self.order.retain(|p| p != path);
    }

    fn is_registered(&self, path: &str) -> bool {
        self.rules.contains_key(path)
    }

    fn value(&self, path: &str) -> Option<&FieldValue> {
        self.values.get(path)
    }

    fn set_value(&mut self, path: &str, value: FieldValue) {
        self.errors.remove(path);
        self.values.insert(path.to_string(), value);
    }

    fn error(&self, path: &str) -> Option<&ValidationError> {
        self.errors.get(path)
    }

    fn set_error(&mut self, path: &str, error: Option<ValidationError>) {
        match error {
            Some(error) => {
                self.errors.insert(path.to_string(), error);
            }
            None => {
                self.errors.remove(path);
            }
        }
    }

    fn validate_field(&mut self, path: &str) -> bool {
        let Some(rules) = self.rules.get(path) else {
            return true;
        };
        // A parse error has no value left to re-check, so it stands.
        if matches!(self.errors.get(path), Some(ValidationError::InvalidInteger { .. })) {
            return false;
        }
        let value = self.values.get(path).cloned().unwrap_or_default();
        match rules.check(&value) {
            Ok(()) => {
                self.errors.remove(path);
                true
            }
            Err(error) => {
                self.errors.insert(path.to_string(), error);
                false
            }
        }
    }

    fn registered(&self) -> Vec<String> {
        self.order.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(kind: FieldKind) -> FieldRules {
        FieldRules::from_spec(&FieldSpec::new("f", kind, "F"))
    }

    #[test]
    fn test_required_blank_fails() {
        let mut r = rules(FieldKind::String);
        r.required = true;
        assert_eq!(r.check(&FieldValue::Empty), Err(ValidationError::Required));
        assert_eq!(r.check(&FieldValue::String(String::new())), Err(ValidationError::Required));
        assert!(r.check(&FieldValue::String("x".to_string())).is_ok());
    }

    #[test]
    fn test_optional_blank_passes() {
        assert!(rules(FieldKind::Integer).check(&FieldValue::Empty).is_ok());
    }

    #[test]
    fn test_pattern_is_unanchored_search() {
        let mut spec = FieldSpec::new("f", FieldKind::String, "F");
        spec.pattern = Some("^[a-z]+$".to_string());
        let r = FieldRules::from_spec(&spec);
        assert!(r.check(&FieldValue::String("abc".to_string())).is_ok());
        let err = r.check(&FieldValue::String("ABC".to_string())).unwrap_err();
        assert_eq!(
            err,
            ValidationError::PatternMismatch {
                pattern: "^[a-z]+$".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_pattern_is_ignored() {
        let mut spec = FieldSpec::new("f", FieldKind::String, "F");
        spec.pattern = Some("([".to_string());
        let r = FieldRules::from_spec(&spec);
        assert!(r.pattern.is_none());
        assert!(r.check(&FieldValue::String("anything".to_string())).is_ok());
    }

    #[test]
    fn test_integer_bounds() {
        let mut spec = FieldSpec::new("f", FieldKind::Integer, "F");
        spec.minimum = Some(1);
        spec.maximum = Some(10);
        let r = FieldRules::from_spec(&spec);
        assert_eq!(
            r.check(&FieldValue::Integer(0)),
            Err(ValidationError::BelowMinimum { minimum: 1 })
        );
        assert_eq!(
            r.check(&FieldValue::Integer(11)),
            Err(ValidationError::AboveMaximum { maximum: 10 })
        );
        assert!(r.check(&FieldValue::Integer(5)).is_ok());
    }

    #[test]
    fn test_options_and_wrong_type() {
        let mut spec = FieldSpec::new("f", FieldKind::String, "F");
        spec.options = vec!["a".to_string()];
        let r = FieldRules::from_spec(&spec);
        assert_eq!(
            r.check(&FieldValue::String("b".to_string())),
            Err(ValidationError::NotAnOption {
                value: "b".to_string()
            })
        );
        assert_eq!(
            r.check(&FieldValue::Integer(1)),
            Err(ValidationError::WrongType {
                expected: FieldKind::String
            })
        );
    }

    #[test]
    fn test_unregister_releases_value_and_rules() {
        let mut state = FormState::new();
        let mut r = rules(FieldKind::String);
        r.required = true;
        state.register("a", r);
        state.set_value("a", FieldValue::String("x".to_string()));
        state.unregister("a");

        assert!(!state.is_registered("a"));
        assert!(state.value("a").is_none());
        assert!(state.registered().is_empty());
        assert!(state.validate_field("a"));
    }

    #[test]
    fn test_registration_order_is_kept() {
        let mut state = FormState::new();
        state.register("b", rules(FieldKind::String));
        state.register("a", rules(FieldKind::String));
        state.register("b", rules(FieldKind::Integer));
        assert_eq!(state.registered(), vec!["b".to_string(), "a".to_string()]);
        state.set_value("b", FieldValue::String("x".to_string()));
        assert!(!state.validate_field("b"));
        assert_eq!(
            state.error("b"),
            Some(&ValidationError::WrongType { expected: FieldKind::Integer })
        );
    }

    #[test]
    fn test_set_value_clears_error() {
        let mut state = FormState::new();
        let mut r = rules(FieldKind::String);
        r.required = true;
        state.register("a", r);
        assert!(!state.validate_field("a"));
        assert_eq!(state.error("a"), Some(&ValidationError::Required));

        state.set_value("a", FieldValue::String("x".to_string()));
        assert!(state.error("a").is_none());
        assert!(state.validate_field("a"));
    }

    #[test]
    fn test_integer_parse_error_survives_validation() {
        let mut state = FormState::new();
        state.register("port", rules(FieldKind::Integer));
        state.set_value("port", FieldValue::Empty);
        state.set_error(
            "port",
            Some(ValidationError::InvalidInteger {
                input: "abc".to_string(),
            }),
        );
        assert!(!state.validate_field("port"));
        assert!(state.error("port").is_some());
    }
}
