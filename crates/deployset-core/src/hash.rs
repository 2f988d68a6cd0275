//! Canonical content hashing of sets.

use serde_json::Value;
use sha1::{Digest, Sha1};

use crate::types::{ModuleSpec, Set};

/// The id of the set with zero modules.
///
/// Handlers treat any all-zeros id as this set without a repository
/// lookup; a non-empty set can never collide with it because its id
/// is a hex-encoded digest of non-empty input.
pub const EMPTY_SET_ID: &str = "0000000000000000000000000000000000000000";

/// Computes the canonical content id of a set.
///
/// The set is canonicalized as `["modules", [[name, [[key, value]…]]…]]`
/// with module names and top-level spec keys sorted byte-wise, then
/// serialized compactly and digested with SHA-1 (lowercase hex). Only
/// the modules participate; `version` is not part of the identity.
pub fn hash(set: &Set) -> String {
    if set.modules.is_empty() {
        return EMPTY_SET_ID.to_string();
    }

    let modules = Value::Array(
        set.modules
            .iter()
            .map(|(name, spec)| {
                Value::Array(vec![Value::String(name.clone()), spec_pairs(spec)])
            })
            .collect(),
    );
    let canonical = Value::Array(vec![Value::String("modules".to_string()), modules]);

    hex::encode(Sha1::digest(canonical.to_string().as_bytes()))
}

fn spec_pairs(spec: &ModuleSpec) -> Value {
    let mut pairs: Vec<(&String, &Value)> = spec.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    Value::Array(
        pairs
            .into_iter()
            .map(|(key, value)| Value::Array(vec![Value::String(key.clone()), value.clone()]))
            .collect(),
    )
}
