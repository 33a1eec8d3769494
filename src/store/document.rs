//! C5: document store adapter — the metadata map keyed by entity id
//! (§4.5). Like the graph adapter, the concrete engine is out of scope;
//! this is the trait boundary plus an in-process reference
//! implementation mirroring `entity-gateway`'s `IndexRegistry`
//! (`RwLock<HashMap<...>>` behind `Arc`).

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Result;

pub type MetadataMap = HashMap<String, serde_json::Value>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Replaces the document wholesale for `entity_id`. Callers wanting
    /// merge semantics merge first, then upsert (§4.5).
    async fn upsert(&self, entity_id: &str, metadata: MetadataMap) -> Result<()>;

    /// Absence of a document for an existing entity is not an error —
    /// returns an empty map.
    async fn fetch(&self, entity_id: &str) -> Result<MetadataMap>;

    /// A no-op if no document exists for `entity_id`.
    async fn delete(&self, entity_id: &str) -> Result<()>;
}

#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<String, MetadataMap>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn upsert(&self, entity_id: &str, metadata: MetadataMap) -> Result<()> {
        self.documents
            .write()
            .await
            .insert(entity_id.to_string(), metadata);
        Ok(())
    }

    async fn fetch(&self, entity_id: &str) -> Result<MetadataMap> {
        Ok(self
            .documents
            .read()
            .await
            .get(entity_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete(&self, entity_id: &str) -> Result<()> {
        self.documents.write().await.remove(entity_id);
        Ok(())
    }
}
