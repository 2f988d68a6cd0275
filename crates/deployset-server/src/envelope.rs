//! Persisted record shapes for sets and deltas.

use chrono::{DateTime, Utc};
use deployset_core::{Delta, Set};
use serde::{Deserialize, Serialize};

/// The over-the-wire and persisted form of a stored set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetEnvelope {
    pub id: String,
    pub metadata: SetMetadata,
    pub content: Set,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetMetadata {
    pub created_at: DateTime<Utc>,
}

/// The over-the-wire and persisted form of a stored delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaEnvelope {
    pub id: String,
    pub metadata: DeltaMetadata,
    pub content: Delta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaMetadata {
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<String>,
}

impl DeltaMetadata {
    pub fn new(user: &str, at: DateTime<Utc>) -> Self {
        Self {
            created_by: user.to_string(),
            created_at: at,
            last_modified_at: at,
            contributors: Vec::new(),
        }
    }

    /// Refreshes the modification time and credits the editor.
    ///
    /// The creator is never listed as a contributor, and contributors
    /// are recorded at most once.
    pub fn record_edit(&mut self, user: &str, at: DateTime<Utc>) {
        self.last_modified_at = at;
        if user != self.created_by && !self.contributors.iter().any(|c| c == user) {
            self.contributors.push(user.to_string());
        }
    }
}
