#![no_main]
use libfuzzer_sys::fuzz_target;

use jtd_validator::{validate, Schema, ValidateOptions};

fuzz_target!(|schema_and_instance: (Vec<u8>, Vec<u8>)| {
    let schema: Schema = match serde_json::from_slice(&schema_and_instance.0) {
        Ok(schema) => schema,
        Err(_) => return,
    };

    // We're only interested in fuzzing against valid schemas.
    if schema.verify().is_err() {
        return;
    }

    if let Ok(instance) = serde_json::from_slice::<serde_json::Value>(&schema_and_instance.1) {
        let options = ValidateOptions::new().with_max_depth(32).with_max_errors(16);
        if let Ok(errors) = validate(&schema, &instance, options) {
            assert!(errors.len() <= 16);
        }
    }
});
