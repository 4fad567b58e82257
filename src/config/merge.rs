//! Layer merge
//!
//! - Tables: merged key by key
//! - Lists: replaced wholesale (a repo's `php_versions` is never appended to the defaults)
//! - Scalars: last layer wins

use serde_json::Value;

/// Merge `overlay` on top of `base`
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let value = match merged.remove(&key) {
                    Some(previous) => deep_merge(previous, value),
                    None => value,
                };
                merged.insert(key, value);
            }
            Value::Object(merged)
        }
        (_, overlay) => overlay,
    }
}

/// Merge layers in precedence order, first is lowest
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}
