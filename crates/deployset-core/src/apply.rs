//! Evaluation of a delta against a set.

use serde_json::Value;
use thiserror::Error;

use deployset_json_pointer::{extract_parent, PointerError};

use crate::types::{Delta, Set, UpdateAction};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplyError {
    #[error("module `{0}` not found")]
    ModuleNotFound(String),
    #[error("path `{path}` in module `{module}`: {source}")]
    Pointer {
        module: String,
        path: String,
        #[source]
        source: PointerError,
    },
    #[error("path `{path}` does not exist in module `{module}`")]
    PathNotFound { module: String, path: String },
    #[error("index in path `{path}` is out of range of the array in module `{module}`")]
    IndexOutOfRange { module: String, path: String },
    #[error("path `{path}` refers to an array and does not have a numerical index in module `{module}`")]
    NonNumericIndex { module: String, path: String },
    #[error("operation `{operation}` at path `{path}` in module `{module}` is not supported")]
    NotSupported {
        module: String,
        path: String,
        operation: String,
    },
    #[error("parent of path `{path}` in module `{module}` must be an array or object")]
    TypeMismatch { module: String, path: String },
}

/// Applies a delta to a set, producing the resulting set.
///
/// The input set is never mutated. Operation groups are processed in a
/// fixed order: remove, then add, then update. Removing a module that
/// is not present is a no-op (the desired state is simply "no such
/// module"); an add overwrites any module of the same name; an update
/// naming an absent module fails. The first failing update action
/// aborts the whole evaluation.
pub fn apply(input: &Set, delta: &Delta) -> Result<Set, ApplyError> {
    let mut out = Set {
        modules: Default::default(),
        version: input.version,
    };

    for (name, spec) in &input.modules {
        if !delta.modules.remove.iter().any(|removed| removed == name) {
            out.modules.insert(name.clone(), spec.clone());
        }
    }

    for (name, spec) in &delta.modules.add {
        out.modules
            .insert(name.clone(), spec.clone().unwrap_or_default());
    }

    for (name, actions) in &delta.modules.update {
        let spec = out
            .modules
            .remove(name)
            .ok_or_else(|| ApplyError::ModuleNotFound(name.clone()))?;
        let mut root = Value::Object(spec);
        for action in actions {
            apply_action(&mut root, name, action)?;
        }
        let Value::Object(spec) = root else {
            unreachable!("update actions mutate within the module spec")
        };
        out.modules.insert(name.clone(), spec);
    }

    Ok(out)
}

/// Applies a single update action to a module spec rooted at `root`.
///
/// Also used by the merge to fold update actions into a pending add.
pub(crate) fn apply_action(
    root: &mut Value,
    module: &str,
    action: &UpdateAction,
) -> Result<(), ApplyError> {
    let (parent, key) = extract_parent(root, &action.path).map_err(|source| ApplyError::Pointer {
        module: module.to_string(),
        path: action.path.clone(),
        source,
    })?;
    let value = action.value.clone().unwrap_or(Value::Null);

    match parent {
        Value::Object(map) => match action.operation.as_str() {
            "add" => {
                map.insert(key, value);
                Ok(())
            }
            "remove" => {
                // Unlike RFC 6902, removing an absent key is accepted.
                map.remove(&key);
                Ok(())
            }
            "replace" => {
                if map.contains_key(&key) {
                    map.insert(key, value);
                    Ok(())
                } else {
                    Err(ApplyError::PathNotFound {
                        module: module.to_string(),
                        path: action.path.clone(),
                    })
                }
            }
            _ => Err(not_supported(module, action)),
        },
        Value::Array(arr) => match action.operation.as_str() {
            "add" => {
                if key == "-" {
                    arr.push(value);
                    return Ok(());
                }
                let index = parse_index(&key, module, action)?;
                if index < arr.len() {
                    arr.insert(index, value);
                    Ok(())
                } else {
                    Err(out_of_range(module, action))
                }
            }
            "remove" => {
                let index = parse_index(&key, module, action)?;
                if index < arr.len() {
                    arr.remove(index);
                    Ok(())
                } else {
                    Err(out_of_range(module, action))
                }
            }
            "replace" => {
                let index = parse_index(&key, module, action)?;
                if index < arr.len() {
                    arr[index] = value;
                    Ok(())
                } else {
                    Err(out_of_range(module, action))
                }
            }
            _ => Err(not_supported(module, action)),
        },
        _ => Err(ApplyError::TypeMismatch {
            module: module.to_string(),
            path: action.path.clone(),
        }),
    }
}

fn parse_index(key: &str, module: &str, action: &UpdateAction) -> Result<usize, ApplyError> {
    key.parse().map_err(|_| ApplyError::NonNumericIndex {
        module: module.to_string(),
        path: action.path.clone(),
    })
}

fn out_of_range(module: &str, action: &UpdateAction) -> ApplyError {
    ApplyError::IndexOutOfRange {
        module: module.to_string(),
        path: action.path.clone(),
    }
}

fn not_supported(module: &str, action: &UpdateAction) -> ApplyError {
    ApplyError::NotSupported {
        module: module.to_string(),
        path: action.path.clone(),
        operation: action.operation.clone(),
    }
}
