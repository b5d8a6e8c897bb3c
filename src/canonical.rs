//! Backend-agnostic identity keys and the fixed-width ids derived from them.

use crate::store::AttrMap;

/// Canonical key for a node: its identity attributes serialized in sorted key
/// order, `k="v";k2="v2"`. `AttrMap` already iterates sorted, so the same
/// predicate always yields the same key.
pub fn node_key(attrs: &AttrMap) -> String {
    let mut key = String::new();
    for (name, value) in attrs {
        if !key.is_empty() {
            key.push(';');
        }
        key.push_str(name);
        key.push('=');
        key.push_str(&value.to_string());
    }
    key
}

/// Canonical key for a directed edge between two node keys.
pub fn edge_key(source_key: &str, target_key: &str, rel_type: &str) -> String {
    format!("{source_key} -> {target_key} [{rel_type}]")
}

/// Stable 32-bit FNV-1a of a canonical key. Backends that need an externally
/// supplied numeric id use this, so re-sends address the same entity without a
/// lookup round-trip. Not collision-free and not cryptographic.
pub fn stable_id(key: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in key.as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}
