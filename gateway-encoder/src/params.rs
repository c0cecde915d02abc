//! Deterministic flattening of a tool call's JSON parameters into a single
//! canonical string, so two calls with the same parameters in different
//! key order produce the same anchor text (and the same cache key).

use std::collections::BTreeMap;

use serde_json::Value;

pub fn canonicalize_dict(value: &Value) -> String {
    let mut pairs = Vec::new();
    flatten(value, String::new(), &mut pairs);
    pairs.into_iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("; ")
}

fn flatten(value: &Value, prefix: String, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            // BTreeMap sorts keys for us, matching the reference's explicit sort.
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            for (key, val) in sorted {
                if val.is_null() {
                    continue;
                }
                let new_prefix = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
                flatten(val, new_prefix, out);
            }
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                let new_prefix = format!("{prefix}[{idx}]");
                flatten(item, new_prefix, out);
            }
        }
        Value::Null => {}
        leaf => out.push((prefix, leaf_to_string(leaf))),
    }
}

fn leaf_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
