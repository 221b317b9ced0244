use crate::{Form, Json, Schema, Type};
use chrono::{DateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, trace};

/// Limits applied during [`validate`]. Zero means unbounded.
///
/// Options can be built in code, or deserialized from a host's configuration:
///
/// ```
/// use jtd_validator::ValidateOptions;
/// use serde_json::json;
///
/// let options: ValidateOptions = serde_json::from_value(json!({ "maxDepth": 32 })).unwrap();
/// assert_eq!(ValidateOptions::new().with_max_depth(32), options);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidateOptions {
    max_depth: usize,
    max_errors: usize,
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many `ref`s may be followed in a row before validation gives up
    /// with [`ValidateError::MaxDepthExceeded`].
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Stop validating once this many errors have been found.
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_errors(&self) -> usize {
        self.max_errors
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidateError {
    /// A chain of `ref`s was followed `max_depth` times. This almost always
    /// means the schema is cyclic.
    #[error("max depth exceeded")]
    MaxDepthExceeded,
}

/// One reason an instance was rejected. This is data, not a Rust error.
///
/// `instance_path` locates the rejected value within the instance.
/// `schema_path` locates the rejecting keyword, relative to the definition
/// most recently entered through a `ref` (or to the root schema if none was).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationErrorIndicator {
    pub instance_path: Vec<String>,
    pub schema_path: Vec<String>,
}

/// Validates `instance` against `schema`.
///
/// `schema` must have passed [`Schema::verify`]; otherwise the result is
/// unspecified. An empty list means the instance is valid. The order of the
/// returned errors is not meaningful.
///
/// With a nonzero [`ValidateOptions::with_max_errors`], validation stops as
/// soon as that many errors are found rather than walking the rest of the
/// instance.
pub fn validate<J: Json>(
    schema: &Schema,
    instance: &J,
    options: ValidateOptions,
) -> Result<Vec<ValidationErrorIndicator>, ValidateError> {
    let mut vm = Vm {
        max_depth: options.max_depth,
        max_errors: options.max_errors,
        instance_tokens: vec![],
        schema_tokens: vec![vec![]],
        errors: vec![],
    };

    match vm.validate(schema, schema, None, instance) {
        Ok(()) => {}
        Err(VmValidateError::MaxErrorsReached) => {
            debug!(max_errors = vm.max_errors, "max errors reached, stopping early");
        }
        Err(VmValidateError::MaxDepthExceeded) => {
            debug!(max_depth = vm.max_depth, "max depth exceeded following refs");
            return Err(ValidateError::MaxDepthExceeded);
        }
    }

    trace!(errors = vm.errors.len(), "validation finished");
    Ok(vm.errors)
}

struct Vm {
    max_depth: usize,
    max_errors: usize,
    instance_tokens: Vec<String>,
    schema_tokens: Vec<Vec<String>>,
    errors: Vec<ValidationErrorIndicator>,
}

enum VmValidateError {
    MaxErrorsReached,
    MaxDepthExceeded,
}

impl Vm {
    fn validate<J: Json>(
        &mut self,
        root: &Schema,
        schema: &Schema,
        parent_tag: Option<&str>,
        instance: &J,
    ) -> Result<(), VmValidateError> {
        if schema.is_nullable() && instance.is_null() {
            return Ok(());
        }

        match schema.form() {
            Form::Empty => {}
            Form::Ref => {
                if let Some(ref_) = &schema.ref_ {
                    self.schema_tokens
                        .push(vec!["definitions".to_owned(), ref_.clone()]);
                    if self.max_depth != 0 && self.schema_tokens.len() >= self.max_depth {
                        return Err(VmValidateError::MaxDepthExceeded);
                    }

                    if let Some(definition) = root
                        .definitions
                        .as_ref()
                        .and_then(|definitions| definitions.get(ref_))
                    {
                        self.validate(root, definition, None, instance)?;
                    }

                    self.schema_tokens.pop();
                }
            }
            Form::Type => {
                if let Some(type_) = schema.type_ {
                    self.push_schema_token("type");
                    self.validate_type(type_, instance)?;
                    self.pop_schema_token();
                }
            }
            Form::Enum => {
                self.push_schema_token("enum");
                let ok = match (instance.as_string(), &schema.enum_) {
                    (Some(s), Some(enum_)) => enum_.contains(s),
                    _ => false,
                };

                if !ok {
                    self.push_error()?;
                }
                self.pop_schema_token();
            }
            Form::Elements => {
                self.push_schema_token("elements");

                match (instance.as_array(), &schema.elements) {
                    (Some(arr), Some(elements)) => {
                        for (i, sub_instance) in arr.into_iter().enumerate() {
                            self.push_instance_token(&i.to_string());
                            self.validate(root, elements, None, sub_instance)?;
                            self.pop_instance_token();
                        }
                    }
                    _ => self.push_error()?,
                }

                self.pop_schema_token();
            }
            Form::Properties => {
                let obj = match instance.as_object() {
                    Some(obj) => obj,
                    None => {
                        self.push_schema_token(if schema.properties.is_some() {
                            "properties"
                        } else {
                            "optionalProperties"
                        });
                        self.push_error()?;
                        self.pop_schema_token();
                        return Ok(());
                    }
                };

                if let Some(properties) = &schema.properties {
                    self.push_schema_token("properties");
                    for (name, sub_schema) in properties {
                        self.push_schema_token(name);
                        if let Some(sub_instance) = obj.get(name.as_str()) {
                            self.push_instance_token(name);
                            self.validate(root, sub_schema, None, *sub_instance)?;
                            self.pop_instance_token();
                        } else {
                            self.push_error()?;
                        }
                        self.pop_schema_token();
                    }
                    self.pop_schema_token();
                }

                if let Some(optional_properties) = &schema.optional_properties {
                    self.push_schema_token("optionalProperties");
                    for (name, sub_schema) in optional_properties {
                        self.push_schema_token(name);
                        if let Some(sub_instance) = obj.get(name.as_str()) {
                            self.push_instance_token(name);
                            self.validate(root, sub_schema, None, *sub_instance)?;
                            self.pop_instance_token();
                        }
                        self.pop_schema_token();
                    }
                    self.pop_schema_token();
                }

                if schema.additional_properties != Some(true) {
                    let declared = |name: &str| {
                        schema
                            .properties
                            .iter()
                            .chain(schema.optional_properties.iter())
                            .any(|properties| properties.contains_key(name))
                    };

                    for &name in obj.keys() {
                        if parent_tag != Some(name) && !declared(name) {
                            self.push_instance_token(name);
                            self.push_error()?;
                            self.pop_instance_token();
                        }
                    }
                }
            }
            Form::Values => {
                self.push_schema_token("values");

                match (instance.as_object(), &schema.values) {
                    (Some(obj), Some(values)) => {
                        for (name, sub_instance) in obj {
                            self.push_instance_token(name);
                            self.validate(root, values, None, sub_instance)?;
                            self.pop_instance_token();
                        }
                    }
                    _ => self.push_error()?,
                }

                self.pop_schema_token();
            }
            Form::Discriminator => {
                if let (Some(discriminator), Some(mapping)) =
                    (&schema.discriminator, &schema.mapping)
                {
                    self.validate_discriminator(root, discriminator, mapping, instance)?;
                }
            }
        };

        Ok(())
    }

    fn validate_type<J: Json>(
        &mut self,
        type_: Type,
        instance: &J,
    ) -> Result<(), VmValidateError> {
        let ok = match type_ {
            Type::Boolean => instance.is_boolean(),
            Type::Float32 | Type::Float64 => instance.is_number(),
            Type::String => instance.is_string(),
            Type::Timestamp => instance.as_string().map_or(false, is_timestamp),
            Type::Int8
            | Type::Uint8
            | Type::Int16
            | Type::Uint16
            | Type::Int32
            | Type::Uint32 => match (instance.as_number(), type_.int_bounds()) {
                (Some(val), Some((min, max))) => val.round() == val && min <= val && val <= max,
                _ => false,
            },
        };

        if ok {
            Ok(())
        } else {
            self.push_error()
        }
    }

    fn validate_discriminator<J: Json>(
        &mut self,
        root: &Schema,
        discriminator: &str,
        mapping: &BTreeMap<String, Schema>,
        instance: &J,
    ) -> Result<(), VmValidateError> {
        let obj = match instance.as_object() {
            Some(obj) => obj,
            None => {
                self.push_schema_token("discriminator");
                self.push_error()?;
                self.pop_schema_token();
                return Ok(());
            }
        };

        let tag = match obj.get(discriminator) {
            Some(tag) => tag,
            None => {
                self.push_schema_token("discriminator");
                self.push_error()?;
                self.pop_schema_token();
                return Ok(());
            }
        };

        let tag = match tag.as_string() {
            Some(tag) => tag,
            None => {
                self.push_schema_token("discriminator");
                self.push_instance_token(discriminator);
                self.push_error()?;
                self.pop_instance_token();
                self.pop_schema_token();
                return Ok(());
            }
        };

        if let Some(schema) = mapping.get(tag) {
            self.push_schema_token("mapping");
            self.push_schema_token(tag);
            self.validate(root, schema, Some(discriminator), instance)?;
            self.pop_schema_token();
            self.pop_schema_token();
        } else {
            self.push_schema_token("mapping");
            self.push_instance_token(discriminator);
            self.push_error()?;
            self.pop_instance_token();
            self.pop_schema_token();
        }

        Ok(())
    }

    fn push_error(&mut self) -> Result<(), VmValidateError> {
        self.errors.push(ValidationErrorIndicator {
            instance_path: self.instance_tokens.clone(),
            schema_path: self.schema_tokens.last().cloned().unwrap_or_default(),
        });

        if self.max_errors == self.errors.len() {
            Err(VmValidateError::MaxErrorsReached)
        } else {
            Ok(())
        }
    }

    fn push_schema_token(&mut self, token: &str) {
        if let Some(tokens) = self.schema_tokens.last_mut() {
            tokens.push(token.to_owned());
        }
    }

    fn pop_schema_token(&mut self) {
        if let Some(tokens) = self.schema_tokens.last_mut() {
            tokens.pop();
        }
    }

    fn push_instance_token(&mut self, token: &str) {
        self.instance_tokens.push(token.to_owned());
    }

    fn pop_instance_token(&mut self) {
        self.instance_tokens.pop();
    }
}

// chrono accepts a space between date and time, and a 60th second represented
// as a nanosecond count past one billion. Both are rejected here.
fn is_timestamp(s: &str) -> bool {
    let separator_ok = s
        .as_bytes()
        .get(10)
        .map_or(false, |b| b.eq_ignore_ascii_case(&b'T'));

    separator_ok
        && DateTime::parse_from_rfc3339(s).map_or(false, |dt| dt.nanosecond() < 1_000_000_000)
}
