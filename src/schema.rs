use crate::form::{Form, Type};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::ptr;
use thiserror::Error;
use tracing::debug;

/// A JSON Type Definition schema.
///
/// Each field corresponds to one JTD keyword. The struct round-trips through
/// `serde_json`, so parsing a schema is just:
///
/// ```
/// use jtd_validator::{Schema, Type};
/// use serde_json::json;
///
/// let schema: Schema = serde_json::from_value(json!({ "type": "uint8" })).unwrap();
/// assert_eq!(Some(Type::Uint8), schema.type_);
/// ```
///
/// Not every `Schema` is a correct JTD schema: which keywords may be combined,
/// and whether each `ref` points at a real definition, cannot be expressed in
/// the type system. Use [`Schema::verify`] before validating against it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct Schema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub definitions: Option<BTreeMap<String, Schema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_: Option<Type>,

    #[serde(default, deserialize_with = "deserialize_enum")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_: Option<BTreeSet<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<Box<Schema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional_properties: Option<BTreeMap<String, Schema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Box<Schema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<BTreeMap<String, Schema>>,
}

/// Reasons a [`Schema`] is not a correct JTD schema.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvalidSchema {
    #[error("invalid combination of keywords")]
    InvalidForm,

    #[error("definitions used on a non-root schema")]
    NonRootDefinitions,

    #[error("ref to non-existent definition: {0}")]
    NoSuchDefinition(String),

    #[error("empty enum")]
    EmptyEnum,

    #[error("properties shares key with optionalProperties: {0}")]
    RepeatedProperty(String),

    #[error("mapping value not of properties form: {0}")]
    NonPropertiesMapping(String),

    #[error("mapping value redefines the discriminator property: {0}")]
    RepeatedTagInProperties(String),

    #[error("mapping value is nullable: {0}")]
    NullableMapping(String),
}

// Valid form "signatures": which of these keywords are present, in order:
//
// ref type enum elements properties optionalProperties additionalProperties
// values discriminator mapping
//
// metadata, nullable and definitions restrict nothing and are left out.
const VALID_FORMS: [[bool; 10]; 13] = [
    // Empty form
    [false, false, false, false, false, false, false, false, false, false],
    // Ref form
    [true, false, false, false, false, false, false, false, false, false],
    // Type form
    [false, true, false, false, false, false, false, false, false, false],
    // Enum form
    [false, false, true, false, false, false, false, false, false, false],
    // Elements form
    [false, false, false, true, false, false, false, false, false, false],
    // Properties form. additionalProperties never appears on its own.
    [false, false, false, false, true, false, false, false, false, false],
    [false, false, false, false, false, true, false, false, false, false],
    [false, false, false, false, true, true, false, false, false, false],
    [false, false, false, false, true, false, true, false, false, false],
    [false, false, false, false, false, true, true, false, false, false],
    [false, false, false, false, true, true, true, false, false, false],
    // Values form
    [false, false, false, false, false, false, false, true, false, false],
    // Discriminator form
    [false, false, false, false, false, false, false, false, true, true],
];

impl Schema {
    /// Checks that the schema, and every schema nested in it, is a correct
    /// JTD schema.
    ///
    /// Verification is pure: calling it again on an unchanged schema gives the
    /// same result.
    pub fn verify(&self) -> Result<(), InvalidSchema> {
        self.verify_against(self).map_err(|err| {
            debug!(error = %err, "schema failed verification");
            err
        })
    }

    /// The form this schema takes on.
    ///
    /// Only meaningful for schemas that are, or are nested within, a schema
    /// that passed [`Schema::verify`].
    pub fn form(&self) -> Form {
        if self.ref_.is_some() {
            Form::Ref
        } else if self.type_.is_some() {
            Form::Type
        } else if self.enum_.is_some() {
            Form::Enum
        } else if self.elements.is_some() {
            Form::Elements
        } else if self.properties.is_some() || self.optional_properties.is_some() {
            Form::Properties
        } else if self.values.is_some() {
            Form::Values
        } else if self.discriminator.is_some() {
            Form::Discriminator
        } else {
            Form::Empty
        }
    }

    /// Whether `nullable` is present and `true`.
    pub fn is_nullable(&self) -> bool {
        self.nullable == Some(true)
    }

    fn signature(&self) -> [bool; 10] {
        [
            self.ref_.is_some(),
            self.type_.is_some(),
            self.enum_.is_some(),
            self.elements.is_some(),
            self.properties.is_some(),
            self.optional_properties.is_some(),
            self.additional_properties.is_some(),
            self.values.is_some(),
            self.discriminator.is_some(),
            self.mapping.is_some(),
        ]
    }

    fn verify_against(&self, root: &Schema) -> Result<(), InvalidSchema> {
        if !VALID_FORMS.contains(&self.signature()) {
            return Err(InvalidSchema::InvalidForm);
        }

        if let Some(definitions) = &self.definitions {
            // Identity, not equality: an equal copy nested elsewhere is still
            // not the root.
            if !ptr::eq(self, root) {
                return Err(InvalidSchema::NonRootDefinitions);
            }

            for schema in definitions.values() {
                schema.verify_against(root)?;
            }
        }

        if let Some(ref_) = &self.ref_ {
            let defined = root
                .definitions
                .as_ref()
                .map_or(false, |definitions| definitions.contains_key(ref_));

            if !defined {
                return Err(InvalidSchema::NoSuchDefinition(ref_.clone()));
            }
        }

        if let Some(enum_) = &self.enum_ {
            if enum_.is_empty() {
                return Err(InvalidSchema::EmptyEnum);
            }
        }

        if let Some(elements) = &self.elements {
            elements.verify_against(root)?;
        }

        if let Some(properties) = &self.properties {
            for schema in properties.values() {
                schema.verify_against(root)?;
            }
        }

        if let Some(optional_properties) = &self.optional_properties {
            for schema in optional_properties.values() {
                schema.verify_against(root)?;
            }
        }

        if let (Some(properties), Some(optional_properties)) =
            (&self.properties, &self.optional_properties)
        {
            if let Some(key) = properties
                .keys()
                .find(|key| optional_properties.contains_key(*key))
            {
                return Err(InvalidSchema::RepeatedProperty(key.clone()));
            }
        }

        if let Some(values) = &self.values {
            values.verify_against(root)?;
        }

        if let (Some(discriminator), Some(mapping)) = (&self.discriminator, &self.mapping) {
            for (tag, schema) in mapping {
                schema.verify_against(root)?;

                if schema.form() != Form::Properties {
                    return Err(InvalidSchema::NonPropertiesMapping(tag.clone()));
                }

                let redefines_tag = schema
                    .properties
                    .iter()
                    .chain(schema.optional_properties.iter())
                    .any(|properties| properties.contains_key(discriminator));

                if redefines_tag {
                    return Err(InvalidSchema::RepeatedTagInProperties(tag.clone()));
                }

                if schema.is_nullable() {
                    return Err(InvalidSchema::NullableMapping(tag.clone()));
                }
            }
        }

        Ok(())
    }
}

fn deserialize_enum<'de, D>(deserializer: D) -> Result<Option<BTreeSet<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut out = BTreeSet::new();
    for value in Vec::<String>::deserialize(deserializer)? {
        if out.contains(&value) {
            return Err(de::Error::custom(format!(
                "enum contains duplicate value: {}",
                value
            )));
        }

        out.insert(value);
    }

    Ok(Some(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(json: Value) -> Schema {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn serialize_partial() {
        // Fields are None by default. These shouldn't be serialized.
        assert_eq!(
            "{\"ref\":\"foo\"}",
            serde_json::to_string(&Schema {
                ref_: Some("foo".to_owned()),
                ..Default::default()
            })
            .unwrap()
        );
    }

    #[test]
    fn parse_empty() {
        assert_eq!(Schema::default(), schema(json!({})));
    }

    #[test]
    fn parse_full() {
        let uint32 = || Schema {
            type_: Some(Type::Uint32),
            ..Default::default()
        };

        let one = |s: Schema| -> BTreeMap<String, Schema> {
            vec![("foo".to_owned(), s)].into_iter().collect()
        };

        assert_eq!(
            Schema {
                metadata: Some(vec![("foo".to_owned(), json!("bar"))].into_iter().collect()),
                nullable: Some(true),
                definitions: Some(one(uint32())),
                ref_: Some("foo".to_owned()),
                type_: Some(Type::Uint32),
                enum_: Some(vec!["foo".to_owned(), "bar".to_owned()].into_iter().collect()),
                elements: Some(Box::new(uint32())),
                properties: Some(one(uint32())),
                optional_properties: Some(one(uint32())),
                additional_properties: Some(true),
                values: Some(Box::new(uint32())),
                discriminator: Some("foo".to_owned()),
                mapping: Some(one(uint32())),
            },
            schema(json!({
                "metadata": { "foo": "bar" },
                "nullable": true,
                "definitions": { "foo": { "type": "uint32" }},
                "ref": "foo",
                "type": "uint32",
                "enum": ["foo", "bar"],
                "elements": { "type": "uint32" },
                "properties": { "foo": { "type": "uint32" }},
                "optionalProperties": { "foo": { "type": "uint32" }},
                "additionalProperties": true,
                "values": { "type": "uint32" },
                "discriminator": "foo",
                "mapping": { "foo": { "type": "uint32" }},
            }))
        );
    }

    #[test]
    fn parse_rejects_bad_keywords() {
        assert!(serde_json::from_value::<Schema>(json!({ "foo": 1 })).is_err());
        assert!(serde_json::from_value::<Schema>(json!({ "type": "uint64" })).is_err());
        assert!(serde_json::from_value::<Schema>(json!({ "enum": ["a", "a"] })).is_err());
        assert!(serde_json::from_value::<Schema>(json!({ "enum": [1] })).is_err());
    }

    #[test]
    fn roundtrip_preserves_presence() {
        let json = json!({
            "properties": { "foo": { "type": "boolean" }},
            "additionalProperties": false,
            "nullable": false,
        });

        assert_eq!(json, serde_json::to_value(schema(json.clone())).unwrap());
    }

    #[test]
    fn verify_every_valid_signature() {
        let props = json!({ "foo": {} });
        let others = json!({ "bar": {} });

        for json in vec![
            json!({}),
            json!({ "definitions": { "a": {} }, "ref": "a" }),
            json!({ "type": "string" }),
            json!({ "enum": ["a"] }),
            json!({ "elements": {} }),
            json!({ "properties": props }),
            json!({ "optionalProperties": props }),
            json!({ "properties": props, "optionalProperties": others }),
            json!({ "properties": props, "additionalProperties": true }),
            json!({ "optionalProperties": props, "additionalProperties": false }),
            json!({ "properties": props, "optionalProperties": others, "additionalProperties": true }),
            json!({ "values": {} }),
            json!({ "discriminator": "tag", "mapping": {} }),
        ] {
            assert_eq!(Ok(()), schema(json.clone()).verify(), "{}", json);
        }
    }

    #[test]
    fn verify_rejects_invalid_forms() {
        for json in vec![
            json!({ "type": "string", "enum": ["a"] }),
            json!({ "definitions": { "a": {} }, "ref": "a", "type": "string" }),
            json!({ "elements": {}, "values": {} }),
            json!({ "additionalProperties": true }),
            json!({ "properties": {}, "values": {} }),
            json!({ "discriminator": "tag" }),
            json!({ "mapping": {} }),
        ] {
            assert_eq!(
                Err(InvalidSchema::InvalidForm),
                schema(json.clone()).verify(),
                "{}",
                json
            );
        }
    }

    #[test]
    fn verify_non_root_definitions() {
        assert_eq!(
            Err(InvalidSchema::NonRootDefinitions),
            schema(json!({ "elements": { "definitions": {} }})).verify()
        );

        assert_eq!(
            Err(InvalidSchema::NonRootDefinitions),
            schema(json!({ "definitions": { "a": { "definitions": {} }}})).verify()
        );
    }

    #[test]
    fn verify_definitions_are_checked() {
        assert_eq!(
            Err(InvalidSchema::EmptyEnum),
            schema(json!({ "definitions": { "a": { "enum": [] }}})).verify()
        );
    }

    #[test]
    fn verify_refs() {
        assert_eq!(
            Err(InvalidSchema::NoSuchDefinition("foo".to_owned())),
            schema(json!({ "ref": "foo" })).verify()
        );

        assert_eq!(
            Err(InvalidSchema::NoSuchDefinition("bar".to_owned())),
            schema(json!({
                "definitions": { "foo": {} },
                "elements": { "ref": "bar" },
            }))
            .verify()
        );

        assert_eq!(
            Ok(()),
            schema(json!({
                "definitions": {
                    "a": { "ref": "b" },
                    "b": { "elements": { "ref": "a" }},
                },
                "ref": "a",
            }))
            .verify()
        );
    }

    #[test]
    fn verify_empty_enum() {
        assert_eq!(
            Err(InvalidSchema::EmptyEnum),
            schema(json!({ "enum": [] })).verify()
        );
    }

    #[test]
    fn verify_nested_schemas() {
        for json in vec![
            json!({ "elements": { "ref": "x" }}),
            json!({ "values": { "ref": "x" }}),
            json!({ "properties": { "a": { "ref": "x" }}}),
            json!({ "optionalProperties": { "a": { "ref": "x" }}}),
        ] {
            assert_eq!(
                Err(InvalidSchema::NoSuchDefinition("x".to_owned())),
                schema(json.clone()).verify(),
                "{}",
                json
            );
        }
    }

    #[test]
    fn verify_repeated_property() {
        assert_eq!(
            Err(InvalidSchema::RepeatedProperty("foo".to_owned())),
            schema(json!({
                "properties": { "foo": {} },
                "optionalProperties": { "foo": {} },
            }))
            .verify()
        );
    }

    #[test]
    fn verify_mapping() {
        assert_eq!(
            Err(InvalidSchema::NonPropertiesMapping("a".to_owned())),
            schema(json!({
                "discriminator": "tag",
                "mapping": { "a": { "type": "string" }},
            }))
            .verify()
        );

        assert_eq!(
            Err(InvalidSchema::NonPropertiesMapping("a".to_owned())),
            schema(json!({
                "discriminator": "tag",
                "mapping": { "a": {} },
            }))
            .verify()
        );

        assert_eq!(
            Err(InvalidSchema::RepeatedTagInProperties("a".to_owned())),
            schema(json!({
                "discriminator": "tag",
                "mapping": { "a": { "properties": { "tag": {} }}},
            }))
            .verify()
        );

        assert_eq!(
            Err(InvalidSchema::RepeatedTagInProperties("a".to_owned())),
            schema(json!({
                "discriminator": "tag",
                "mapping": { "a": { "optionalProperties": { "tag": {} }}},
            }))
            .verify()
        );

        assert_eq!(
            Err(InvalidSchema::NullableMapping("a".to_owned())),
            schema(json!({
                "discriminator": "tag",
                "mapping": { "a": { "properties": {}, "nullable": true }},
            }))
            .verify()
        );

        assert_eq!(
            Ok(()),
            schema(json!({
                "discriminator": "tag",
                "mapping": { "a": { "properties": {}, "nullable": false }},
            }))
            .verify()
        );
    }

    #[test]
    fn verify_is_idempotent() {
        let valid = schema(json!({
            "definitions": { "a": { "type": "string" }},
            "properties": { "b": { "ref": "a" }},
        }));
        let invalid = schema(json!({ "ref": "missing" }));

        assert_eq!(valid.verify(), valid.verify());
        assert_eq!(invalid.verify(), invalid.verify());
    }

    #[test]
    fn form() {
        let cases = vec![
            (json!({}), Form::Empty),
            (json!({ "nullable": true, "metadata": {} }), Form::Empty),
            (json!({ "definitions": { "a": {} }, "ref": "a" }), Form::Ref),
            (json!({ "type": "string" }), Form::Type),
            (json!({ "enum": ["a"] }), Form::Enum),
            (json!({ "elements": {} }), Form::Elements),
            (json!({ "properties": {} }), Form::Properties),
            (json!({ "optionalProperties": {} }), Form::Properties),
            (json!({ "values": {} }), Form::Values),
            (json!({ "discriminator": "a", "mapping": {} }), Form::Discriminator),
        ];

        for (json, form) in cases {
            let schema = schema(json);
            schema.verify().unwrap();
            assert_eq!(form, schema.form());
        }
    }
}
