use serde_json::Value;
use std::collections::BTreeMap;

/// The JSON data model, as seen by the validator.
///
/// Validation never inspects a concrete JSON library's types directly. Any
/// tree that can answer these questions can be validated, which is how both
/// `serde_json::Value` and (with the `yaml` feature) `serde_yaml::Value` are
/// supported.
///
/// Exactly one of the `is_*` predicates holds for any value. Each `as_*`
/// accessor returns `None` unless its matching predicate holds.
pub trait Json {
    fn is_null(&self) -> bool;
    fn is_boolean(&self) -> bool;

    /// Integers, fractions and exponents alike.
    fn is_number(&self) -> bool;

    /// Includes strings that merely look like timestamps, UUIDs, and so on.
    fn is_string(&self) -> bool;

    fn is_array(&self) -> bool;
    fn is_object(&self) -> bool;

    fn as_boolean(&self) -> Option<bool>;
    fn as_number(&self) -> Option<f64>;
    fn as_string(&self) -> Option<&str>;
    fn as_array(&self) -> Option<Vec<&Self>>;

    /// Member order is not meaningful.
    fn as_object(&self) -> Option<BTreeMap<&str, &Self>>;
}

/// Strict adapter: `serde_json` never rewrites string contents.
impl Json for Value {
    fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn is_boolean(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn as_array(&self) -> Option<Vec<&Self>> {
        match self {
            Value::Array(arr) => Some(arr.iter().collect()),
            _ => None,
        }
    }

    fn as_object(&self) -> Option<BTreeMap<&str, &Self>> {
        match self {
            Value::Object(obj) => Some(obj.iter().map(|(k, v)| (k.as_str(), v)).collect()),
            _ => None,
        }
    }
}
