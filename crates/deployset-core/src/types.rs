//! Data model for deployment sets and deltas.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-module configuration: a mapping from key to arbitrary JSON value.
pub type ModuleSpec = serde_json::Map<String, Value>;

/// A deployment set: the module configuration of a deployable
/// application at a point in time.
///
/// Sets are content-addressed and never edited in place; see
/// [`crate::hash`]. The `version` field is informational and carried
/// through [`crate::apply`] unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Set {
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleSpec>,
    #[serde(default)]
    pub version: i64,
}

impl Set {
    /// Returns `true` when the set has no modules.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// An edit intent transforming one set into another.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub modules: ModuleDeltas,
}

impl Delta {
    /// Returns `true` when the delta carries no operations at all.
    pub fn is_empty(&self) -> bool {
        self.modules.add.is_empty()
            && self.modules.remove.is_empty()
            && self.modules.update.is_empty()
    }
}

/// The three operation groups of a delta.
///
/// An `add` entry with a `null` payload is a tombstone: during a merge
/// it cancels a pending remove of the same module (see
/// [`crate::merge_deltas`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleDeltas {
    #[serde(default)]
    pub add: BTreeMap<String, Option<ModuleSpec>>,
    #[serde(default)]
    pub remove: Vec<String>,
    #[serde(default)]
    pub update: BTreeMap<String, Vec<UpdateAction>>,
}

/// One JSON-Patch-style operation targeting a path inside a module
/// spec.
///
/// The operation is kept as a string so that an unknown operation
/// decodes fine and is rejected at apply time, not at the transport
/// boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateAction {
    #[serde(rename = "op")]
    pub operation: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}
