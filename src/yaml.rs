use crate::json::Json;
use serde_yaml::Value;
use std::collections::BTreeMap;

// Tags (`!foo bar`) carry no meaning for validation; look through them.
fn untagged(mut value: &Value) -> &Value {
    while let Value::Tagged(tagged) = value {
        value = &tagged.value;
    }

    value
}

/// Lenient adapter over YAML documents.
///
/// YAML is a superset of the JSON data model, so some of it is invisible to
/// validation: tags are ignored, and mapping entries whose keys are not
/// strings do not appear in [`Json::as_object`]. Values such as `.nan` or
/// `.inf` are numbers, but never integers.
impl Json for Value {
    fn is_null(&self) -> bool {
        matches!(untagged(self), Value::Null)
    }

    fn is_boolean(&self) -> bool {
        matches!(untagged(self), Value::Bool(_))
    }

    fn is_number(&self) -> bool {
        matches!(untagged(self), Value::Number(_))
    }

    fn is_string(&self) -> bool {
        matches!(untagged(self), Value::String(_))
    }

    fn is_array(&self) -> bool {
        matches!(untagged(self), Value::Sequence(_))
    }

    fn is_object(&self) -> bool {
        matches!(untagged(self), Value::Mapping(_))
    }

    fn as_boolean(&self) -> Option<bool> {
        match untagged(self) {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match untagged(self) {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    fn as_string(&self) -> Option<&str> {
        match untagged(self) {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn as_array(&self) -> Option<Vec<&Self>> {
        match untagged(self) {
            Value::Sequence(seq) => Some(seq.iter().collect()),
            _ => None,
        }
    }

    fn as_object(&self) -> Option<BTreeMap<&str, &Self>> {
        match untagged(self) {
            Value::Mapping(mapping) => Some(
                mapping
                    .iter()
                    .filter_map(|(k, v)| match untagged(k) {
                        Value::String(k) => Some((k.as_str(), v)),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        }
    }
}
