//! Deep merge of raw schema documents.
//!
//! Rules:
//! - Objects: recursive merge, key by key
//! - Arrays: concatenated in source order
//! - Scalars and type mismatches: the later document wins

use serde_json::Value;

/// Merge documents in order; later documents take priority on conflicts
pub fn merge_documents(documents: impl IntoIterator<Item = Value>) -> Value {
    let mut result = Value::Object(serde_json::Map::new());
    for document in documents {
        deep_merge(&mut result, document);
    }
    result
}

/// Merge `overlay` into `base`
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key, overlay_value);
                    }
                }
            }
        }
        (Value::Array(base_items), Value::Array(overlay_items)) => {
            base_items.extend(overlay_items);
        }
        (base, overlay) => {
            *base = overlay;
        }
    }
}
