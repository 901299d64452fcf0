//! Memory store collaborator.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum MemoryStoreError {
    #[error("Memory not found: {0}")]
    NotFound(String),
    #[error("Memory store error: {0}")]
    StoreError(String),
}

/// A single stored memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub value: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The memory subsystem's operation surface, as consumed by memory steps.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn search(&self, query: &str, limit: usize)
        -> Result<Vec<MemoryRecord>, MemoryStoreError>;
    async fn add(&self, value: Value) -> Result<MemoryRecord, MemoryStoreError>;
    async fn update(&self, id: &str, value: Value) -> Result<MemoryRecord, MemoryStoreError>;
    async fn delete(&self, id: &str) -> Result<(), MemoryStoreError>;
    async fn get(&self, id: &str) -> Result<Option<MemoryRecord>, MemoryStoreError>;
    async fn get_all(&self) -> Result<Vec<MemoryRecord>, MemoryStoreError>;
    async fn delete_all(&self) -> Result<(), MemoryStoreError>;
}

/// In-memory store. Search matches the query case-insensitively against the
/// serialized value.
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<String, MemoryRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryStoreError> {
        let needle = query.to_lowercase();
        let guard = self.records.read();
        let mut hits: Vec<MemoryRecord> = guard
            .values()
            .filter(|r| needle.is_empty() || r.value.to_string().to_lowercase().contains(&needle))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn add(&self, value: Value) -> Result<MemoryRecord, MemoryStoreError> {
        let now = Utc::now();
        let record = MemoryRecord {
            id: Uuid::new_v4().to_string(),
            value,
            created_at: now,
            updated_at: now,
        };
        self.records
            .write()
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, value: Value) -> Result<MemoryRecord, MemoryStoreError> {
        let mut guard = self.records.write();
        let record = guard
            .get_mut(id)
            .ok_or_else(|| MemoryStoreError::NotFound(id.to_string()))?;
        record.value = value;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), MemoryStoreError> {
        if self.records.write().remove(id).is_none() {
            return Err(MemoryStoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<MemoryRecord>, MemoryStoreError> {
        Ok(self.records.read().get(id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<MemoryRecord>, MemoryStoreError> {
        let guard = self.records.read();
        let mut all: Vec<MemoryRecord> = guard.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }

    async fn delete_all(&self) -> Result<(), MemoryStoreError> {
        self.records.write().clear();
        Ok(())
    }
}
