use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The mutually exclusive "form" a schema takes on.
///
/// Forms are derived from which keywords a schema uses; see
/// [`Schema::form`][`crate::Schema::form`]. The derivation is only meaningful
/// for schemas that passed [`Schema::verify`][`crate::Schema::verify`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Form {
    /// Only `metadata`, `nullable`, or `definitions` are used. Accepts anything.
    Empty,
    Ref,
    Type,
    Enum,
    Elements,
    /// One or both of `properties` and `optionalProperties`, optionally with
    /// `additionalProperties`.
    Properties,
    Values,
    /// `discriminator` together with `mapping`.
    Discriminator,
}

/// The values of the `type` keyword.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Boolean,
    Float32,
    Float64,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    String,
    Timestamp,
}

impl Type {
    pub fn as_str(&self) -> &'static str {
        match self {
            Type::Boolean => "boolean",
            Type::Float32 => "float32",
            Type::Float64 => "float64",
            Type::Int8 => "int8",
            Type::Uint8 => "uint8",
            Type::Int16 => "int16",
            Type::Uint16 => "uint16",
            Type::Int32 => "int32",
            Type::Uint32 => "uint32",
            Type::String => "string",
            Type::Timestamp => "timestamp",
        }
    }

    /// The inclusive range an integer type admits, or `None` for non-integer
    /// types.
    pub fn int_bounds(&self) -> Option<(f64, f64)> {
        match self {
            Type::Int8 => Some((-128.0, 127.0)),
            Type::Uint8 => Some((0.0, 255.0)),
            Type::Int16 => Some((-32768.0, 32767.0)),
            Type::Uint16 => Some((0.0, 65535.0)),
            Type::Int32 => Some((-2147483648.0, 2147483647.0)),
            Type::Uint32 => Some((0.0, 4294967295.0)),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown type: {0}")]
pub struct UnknownType(pub String);

impl FromStr for Type {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boolean" => Ok(Self::Boolean),
            "float32" => Ok(Self::Float32),
            "float64" => Ok(Self::Float64),
            "int8" => Ok(Self::Int8),
            "uint8" => Ok(Self::Uint8),
            "int16" => Ok(Self::Int16),
            "uint16" => Ok(Self::Uint16),
            "int32" => Ok(Self::Int32),
            "uint32" => Ok(Self::Uint32),
            "string" => Ok(Self::String),
            "timestamp" => Ok(Self::Timestamp),
            _ => Err(UnknownType(s.to_owned())),
        }
    }
}
