#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(schema) = serde_json::from_slice::<jtd_validator::Schema>(data) {
        let first = schema.verify();
        assert_eq!(first, schema.verify());
    }
});
