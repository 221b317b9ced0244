//! Verification of [JSON Type Definition][jtd] schemas, and validation of
//! JSON data against them.
//!
//! ```
//! use jtd_validator::{validate, Schema, ValidateOptions};
//! use serde_json::json;
//!
//! let schema: Schema = serde_json::from_value(json!({
//!     "properties": {
//!         "name": { "type": "string" },
//!         "age": { "type": "uint32" },
//!     },
//! }))
//! .unwrap();
//!
//! schema.verify().unwrap();
//!
//! let errors = validate(
//!     &schema,
//!     &json!({ "name": "John Doe", "age": -1 }),
//!     ValidateOptions::new().with_max_depth(32),
//! )
//! .unwrap();
//!
//! assert_eq!(1, errors.len());
//! assert_eq!(vec!["age"], errors[0].instance_path);
//! assert_eq!(vec!["properties", "age", "type"], errors[0].schema_path);
//! ```
//!
//! Instances can come from any JSON tree implementing [`Json`]. Support for
//! `serde_json::Value` is built in, and `serde_yaml::Value` is supported
//! with the `yaml` feature (on by default).
//!
//! [jtd]: https://jsontypedef.com

mod form;
mod json;
mod schema;
mod validate;

#[cfg(feature = "yaml")]
mod yaml;

pub use form::*;
pub use json::*;
pub use schema::*;
pub use validate::*;
