//! Folding of delta sequences into a single delta.

use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

use crate::apply::{apply_action, ApplyError};
use crate::types::Delta;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("delta {index} cannot be folded into module `{module}`: {source}")]
    Fold {
        index: usize,
        module: String,
        #[source]
        source: ApplyError,
    },
}

/// Folds `rest` into `base` left-to-right, producing one delta whose
/// application is equivalent to applying the sequence in order.
///
/// For each successor delta: removes purge any pending add or update
/// of the same module and are appended (deduplicated, first occurrence
/// wins); an add with a `null` payload is a tombstone cancelling a
/// pending remove, while a real add overwrites any pending add and
/// subsumes pending updates; updates fold directly into a pending add
/// of the same module, otherwise their actions are appended verbatim
/// to the module's update list. A failure while folding into a
/// pending add aborts with the successor's 1-based position and the
/// module name.
pub fn merge_deltas<I>(mut base: Delta, rest: I) -> Result<Delta, MergeError>
where
    I: IntoIterator<Item = Delta>,
{
    for (position, delta) in rest.into_iter().enumerate() {
        let index = position + 1;

        for name in delta.modules.remove {
            base.modules.add.remove(&name);
            base.modules.update.remove(&name);
            base.modules.remove.push(name);
        }
        let mut seen = HashSet::new();
        base.modules.remove.retain(|name| seen.insert(name.clone()));

        for (name, spec) in delta.modules.add {
            match spec {
                // A null payload un-removes the module instead of adding one.
                None => base.modules.remove.retain(|pending| pending != &name),
                Some(spec) => {
                    base.modules.update.remove(&name);
                    base.modules.add.insert(name, Some(spec));
                }
            }
        }

        for (name, actions) in delta.modules.update {
            if let Some(pending) = base.modules.add.get_mut(&name) {
                let mut root = Value::Object(pending.take().unwrap_or_default());
                for action in &actions {
                    apply_action(&mut root, &name, action).map_err(|source| MergeError::Fold {
                        index,
                        module: name.clone(),
                        source,
                    })?;
                }
                let Value::Object(spec) = root else {
                    unreachable!("update actions mutate within the module spec")
                };
                *pending = Some(spec);
            } else {
                base.modules.update.entry(name).or_default().extend(actions);
            }
        }
    }

    Ok(base)
}
