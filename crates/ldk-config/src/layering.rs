//! Layered document merge, canonical hashing and the unused-key report.
//!
//! Documents are merged in order: earlier docs are base, later docs
//! override. Leaves are addressed with JSON pointers.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Every pointer prefix the settings consumer reads. A leaf outside all of
/// these is reported as unused.
pub const CONSUMED_POINTERS: &[&str] = &[
    "/meridian_reminder_enabled",
    "/meridian_days",
    "/meridian_time",
    "/mkl_reminder_enabled",
    "/mkl_staleness_days",
    "/mkl_time",
    "/export_directory",
    "/timezone",
    "/sound",
];

/// Keys written by the first desktop release, and the pointer each one
/// now lives at. A document that sets both keeps the new one.
pub const LEGACY_KEYS: &[(&str, &str)] = &[
    ("notify_enabled", "/meridian_reminder_enabled"),
    ("notify_days", "/meridian_days"),
    ("notify_time", "/meridian_time"),
    ("mkl_notify_enabled", "/mkl_reminder_enabled"),
    ("mkl_notify_after_days", "/mkl_staleness_days"),
    ("mkl_notify_time", "/mkl_time"),
    ("export_path", "/export_directory"),
    ("notify_sound_enabled", "/sound/enabled"),
    ("notify_sound_mode", "/sound/mode"),
    ("notify_sound_alias", "/sound/alias"),
    ("notify_sound_file", "/sound/file"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Minimal set of unused leaf pointers (sorted)
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Parse each YAML doc and deep-merge them over `base`.
pub fn merge_yaml_layers(base: Value, yaml_docs: &[&str]) -> Result<Value> {
    let mut merged = base;
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        // An empty file parses as null; treat it as "no overrides".
        if v_yaml.is_null() {
            continue;
        }
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        if !v_json.is_object() {
            anyhow::bail!("settings document must be a mapping at the top level");
        }
        merged = deep_merge(merged, lift_legacy_keys(v_json));
    }
    Ok(merged)
}

/// Move legacy top-level keys of one document onto their current
/// pointers. Runs per document, before merging, so a current key set in
/// the same document wins over its legacy twin.
pub fn lift_legacy_keys(mut doc: Value) -> Value {
    for (legacy, target) in LEGACY_KEYS {
        let Some(value) = doc.as_object_mut().and_then(|m| m.remove(*legacy)) else {
            continue;
        };
        if doc.pointer(target).is_some() {
            continue;
        }
        let Some((parent, leaf)) = target.rsplit_once('/') else {
            continue;
        };
        // Targets are at most one level deep.
        if !parent.is_empty() && doc.pointer(parent).is_none() {
            if let Some(m) = doc.as_object_mut() {
                m.insert(
                    parent.trim_start_matches('/').to_string(),
                    Value::Object(serde_json::Map::new()),
                );
            }
        }
        if let Some(Value::Object(m)) = doc.pointer_mut(parent) {
            m.insert(leaf.to_string(), value);
        }
    }
    doc
}

pub fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

pub fn report_unused_keys(doc: &Value) -> UnusedKeyReport {
    let consumed: BTreeSet<&str> = CONSUMED_POINTERS.iter().copied().collect();

    let mut leaves: Vec<String> = Vec::new();
    collect_leaf_pointers(doc, "", &mut leaves);

    let mut unused: Vec<String> = leaves
        .into_iter()
        .filter(|lp| !consumed.iter().any(|cp| is_prefix_pointer(cp, lp)))
        .collect();
    unused.sort();
    unused.dedup();

    UnusedKeyReport {
        unused_leaf_pointers: unused,
    }
}

/// Return true if `prefix` is a JSON-pointer prefix of `leaf`.
/// "/a/b" consumes "/a/b/c" but NOT "/a/bc".
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    if prefix == "/" || leaf == prefix {
        return true;
    }
    leaf.starts_with(prefix)
        && leaf
            .get(prefix.len()..prefix.len() + 1)
            .map(|c| c == "/")
            .unwrap_or(false)
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) if !map.is_empty() => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) if !arr.is_empty() => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{}/{}", prefix, i);
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ => {
            let p = if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix.to_string()
            };
            out.push(p);
        }
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

/// Serialize with object keys sorted so that key order in the source file
/// never changes the hash.
pub fn canonicalize_json(v: &Value) -> Result<String> {
    let sorted = sort_keys(v);
    serde_json::to_string(&sorted).context("canonical json serialize failed")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = serde_json::Map::new();
            for k in keys {
                out.insert(k.clone(), sort_keys(&map[k]));
            }
            Value::Object(out)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
