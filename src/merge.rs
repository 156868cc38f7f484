//! Recursive overlay of nested key-value maps.
//!
//! `merge(base, overlay)` walks `overlay` and, for every key, either recurses
//! (when both sides hold a map) or replaces the base value outright. Sequences
//! are replaced wholesale, never merged element by element.
//!
//! The operation is right-biased at every leaf and has `{}` as identity on both
//! sides. It is associative only while no key path changes type across the
//! chained merges; callers combining more than two layers must not rely on it
//! beyond that.

use serde_json::{Map, Value};

pub type ValueMap = Map<String, Value>;

/// Returns a new map with `overlay` applied on top of `base`. Neither input is
/// modified.
pub fn merge(base: &ValueMap, overlay: &ValueMap) -> ValueMap {
    let mut out = base.clone();
    for (key, overlay_value) in overlay {
        let merged = match (out.get(key), overlay_value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                Value::Object(merge(existing, nested))
            }
            _ => overlay_value.clone(),
        };
        out.insert(key.clone(), merged);
    }
    out
}

/// Folds `layers` left to right with [`merge`]; later layers win.
pub fn merge_all<'a>(layers: impl IntoIterator<Item = &'a ValueMap>) -> ValueMap {
    layers
        .into_iter()
        .fold(ValueMap::new(), |acc, layer| merge(&acc, layer))
}
