//! In-memory repository, the default backend.

use std::collections::HashMap;

use async_trait::async_trait;
use deployset_core::{Delta, Set};
use rand::RngCore;
use tokio::sync::RwLock;

use crate::envelope::{DeltaEnvelope, DeltaMetadata, SetEnvelope};
use crate::repository::{Repository, RepositoryError};

type Scope = (String, String);

#[derive(Debug)]
struct DeltaRecord {
    #[allow(dead_code)]
    locked: bool,
    metadata: DeltaMetadata,
    content: Delta,
}

#[derive(Debug, Default)]
struct Store {
    sets: HashMap<Scope, HashMap<String, SetEnvelope>>,
    // Content-addressed index across all scopes.
    set_contents: HashMap<String, Set>,
    deltas: HashMap<Scope, HashMap<String, DeltaRecord>>,
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    store: RwLock<Store>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn scope(org: &str, app: &str) -> Scope {
    (org.to_string(), app.to_string())
}

fn random_delta_id() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn insert_set(
        &self,
        org: &str,
        app: &str,
        envelope: SetEnvelope,
    ) -> Result<(), RepositoryError> {
        let mut store = self.store.write().await;
        store
            .set_contents
            .entry(envelope.id.clone())
            .or_insert_with(|| envelope.content.clone());
        let scoped = store.sets.entry(scope(org, app)).or_default();
        if scoped.contains_key(&envelope.id) {
            return Err(RepositoryError::AlreadyExists);
        }
        scoped.insert(envelope.id.clone(), envelope);
        Ok(())
    }

    async fn select_set(
        &self,
        org: &str,
        app: &str,
        id: &str,
    ) -> Result<SetEnvelope, RepositoryError> {
        let store = self.store.read().await;
        store
            .sets
            .get(&scope(org, app))
            .and_then(|scoped| scoped.get(id))
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn select_raw_set(
        &self,
        org: &str,
        app: &str,
        id: &str,
    ) -> Result<Set, RepositoryError> {
        self.select_set(org, app, id)
            .await
            .map(|envelope| envelope.content)
    }

    async fn select_unscoped_set(&self, id: &str) -> Result<Set, RepositoryError> {
        let store = self.store.read().await;
        store
            .set_contents
            .get(id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn select_all_sets(
        &self,
        org: &str,
        app: &str,
    ) -> Result<Vec<SetEnvelope>, RepositoryError> {
        let store = self.store.read().await;
        let mut sets: Vec<SetEnvelope> = store
            .sets
            .get(&scope(org, app))
            .map(|scoped| scoped.values().cloned().collect())
            .unwrap_or_default();
        sets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(sets)
    }

    async fn insert_delta(
        &self,
        org: &str,
        app: &str,
        locked: bool,
        metadata: DeltaMetadata,
        content: Delta,
    ) -> Result<String, RepositoryError> {
        let mut store = self.store.write().await;
        let scoped = store.deltas.entry(scope(org, app)).or_default();
        let mut id = random_delta_id();
        while scoped.contains_key(&id) {
            id = random_delta_id();
        }
        scoped.insert(
            id.clone(),
            DeltaRecord {
                locked,
                metadata,
                content,
            },
        );
        Ok(id)
    }

    async fn update_delta(
        &self,
        org: &str,
        app: &str,
        id: &str,
        locked: bool,
        metadata: DeltaMetadata,
        content: Delta,
    ) -> Result<(), RepositoryError> {
        let mut store = self.store.write().await;
        let record = store
            .deltas
            .get_mut(&scope(org, app))
            .and_then(|scoped| scoped.get_mut(id))
            .ok_or(RepositoryError::NotFound)?;
        *record = DeltaRecord {
            locked,
            metadata,
            content,
        };
        Ok(())
    }

    async fn select_delta(
        &self,
        org: &str,
        app: &str,
        id: &str,
    ) -> Result<DeltaEnvelope, RepositoryError> {
        let store = self.store.read().await;
        store
            .deltas
            .get(&scope(org, app))
            .and_then(|scoped| scoped.get(id))
            .map(|record| DeltaEnvelope {
                id: id.to_string(),
                metadata: record.metadata.clone(),
                content: record.content.clone(),
            })
            .ok_or(RepositoryError::NotFound)
    }

    async fn select_all_deltas(
        &self,
        org: &str,
        app: &str,
    ) -> Result<Vec<DeltaEnvelope>, RepositoryError> {
        let store = self.store.read().await;
        let mut deltas: Vec<DeltaEnvelope> = store
            .deltas
            .get(&scope(org, app))
            .map(|scoped| {
                scoped
                    .iter()
                    .map(|(id, record)| DeltaEnvelope {
                        id: id.clone(),
                        metadata: record.metadata.clone(),
                        content: record.content.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        deltas.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(deltas)
    }
}
