//! Safe-object validation.
//!
//! Every structured value that crosses from storage into this process
//! is checked for key names that could trigger prototype-pollution
//! behavior in downstream JavaScript consumers of the same bucket.

use serde_json::Value;

use crate::error::{Result, StoreError};

const UNSAFE_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Reject any object (at any depth) carrying a disallowed key name.
pub fn expect_safe_object(value: &Value) -> Result<()> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if UNSAFE_KEYS.contains(&key.as_str()) {
                    return Err(StoreError::UnsafeObject(key.clone()));
                }
                expect_safe_object(child)?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for item in items {
                expect_safe_object(item)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
