//! Abstract persistence of sets and deltas.
//!
//! Sets are keyed by their content hash within an organization/app
//! scope; inserting a hash that already exists is reported as
//! `AlreadyExists` and is not a fault. Deltas are keyed by an id the
//! repository assigns on insert.

use async_trait::async_trait;
use deployset_core::{Delta, Set};
use thiserror::Error;

use crate::envelope::{DeltaEnvelope, DeltaMetadata, SetEnvelope};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
}

#[async_trait]
pub trait Repository: Send + Sync {
    /// Stores a set envelope under its content id. Idempotent:
    /// an existing id yields `AlreadyExists`.
    async fn insert_set(
        &self,
        org: &str,
        app: &str,
        envelope: SetEnvelope,
    ) -> Result<(), RepositoryError>;

    async fn select_set(
        &self,
        org: &str,
        app: &str,
        id: &str,
    ) -> Result<SetEnvelope, RepositoryError>;

    async fn select_raw_set(&self, org: &str, app: &str, id: &str)
        -> Result<Set, RepositoryError>;

    /// Looks a set up by content id alone, ignoring scope.
    async fn select_unscoped_set(&self, id: &str) -> Result<Set, RepositoryError>;

    async fn select_all_sets(
        &self,
        org: &str,
        app: &str,
    ) -> Result<Vec<SetEnvelope>, RepositoryError>;

    /// Stores a delta and returns the id assigned to it, unique within
    /// the scope.
    async fn insert_delta(
        &self,
        org: &str,
        app: &str,
        locked: bool,
        metadata: DeltaMetadata,
        content: Delta,
    ) -> Result<String, RepositoryError>;

    async fn update_delta(
        &self,
        org: &str,
        app: &str,
        id: &str,
        locked: bool,
        metadata: DeltaMetadata,
        content: Delta,
    ) -> Result<(), RepositoryError>;

    async fn select_delta(
        &self,
        org: &str,
        app: &str,
        id: &str,
    ) -> Result<DeltaEnvelope, RepositoryError>;

    async fn select_all_deltas(
        &self,
        org: &str,
        app: &str,
    ) -> Result<Vec<DeltaEnvelope>, RepositoryError>;
}
