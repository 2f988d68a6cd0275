//! Derivation of the delta between two sets.

use deployset_json_pointer::escape_segment;
use serde_json::Value;

use crate::types::{Delta, ModuleSpec, Set, UpdateAction};

/// Computes the delta that transforms `right` into `left`.
///
/// Modules only in `right` are marked for removal, modules only in
/// `left` become adds, and modules in both get a sequence of update
/// actions over their top-level keys.
pub fn diff(left: &Set, right: &Set) -> Delta {
    let mut delta = Delta::default();

    for (name, right_spec) in &right.modules {
        match left.modules.get(name) {
            Some(left_spec) => {
                let updates = module_spec_diff(left_spec, right_spec);
                if !updates.is_empty() {
                    delta.modules.update.insert(name.clone(), updates);
                }
            }
            None => delta.modules.remove.push(name.clone()),
        }
    }

    for (name, left_spec) in &left.modules {
        if !right.modules.contains_key(name) {
            delta
                .modules
                .add
                .insert(name.clone(), Some(left_spec.clone()));
        }
    }

    delta
}

/// Computes the update actions that transform `right` into `left`.
///
/// The comparison is shallow over the top-level keys: nested values
/// are compared by deep equality and, when different, replaced
/// wholesale with a single action.
pub fn module_spec_diff(left: &ModuleSpec, right: &ModuleSpec) -> Vec<UpdateAction> {
    let mut updates = Vec::new();

    for (key, right_value) in right {
        match left.get(key) {
            Some(left_value) => {
                if left_value != right_value {
                    updates.push(replace(key, left_value));
                }
            }
            None => updates.push(UpdateAction {
                operation: "remove".to_string(),
                path: key_path(key),
                value: None,
            }),
        }
    }

    for (key, left_value) in left {
        if !right.contains_key(key) {
            updates.push(UpdateAction {
                operation: "add".to_string(),
                path: key_path(key),
                value: Some(left_value.clone()),
            });
        }
    }

    updates
}

fn replace(key: &str, value: &Value) -> UpdateAction {
    UpdateAction {
        operation: "replace".to_string(),
        path: key_path(key),
        value: Some(value.clone()),
    }
}

fn key_path(key: &str) -> String {
    format!("/{}", escape_segment(key))
}
