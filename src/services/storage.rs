// Copyright 2025 Cowboy AI, LLC.

//! Object storage for QR payloads and fingerprint probes
//!
//! Documents only ever hold the opaque reference string returned by
//! [`ObjectStorage::put`].

use crate::errors::{DomainError, DomainResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Content-addressed-by-reference blob store
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store bytes and return their reference
    async fn put(&self, content_type: &str, data: Bytes) -> DomainResult<String>;

    /// Fetch stored bytes
    async fn get(&self, reference: &str) -> DomainResult<Bytes>;

    /// Remove stored bytes; unknown references are not an error
    async fn delete(&self, reference: &str) -> DomainResult<()>;
}

#[derive(Debug, Clone)]
struct StoredObject {
    content_type: String,
    data: Bytes,
}

/// In-memory object storage
#[derive(Debug, Default)]
pub struct InMemoryObjectStorage {
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl InMemoryObjectStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Content type of a stored object
    pub async fn content_type(&self, reference: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(reference)
            .map(|o| o.content_type.clone())
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn put(&self, content_type: &str, data: Bytes) -> DomainResult<String> {
        let reference = format!("mem://objects/{}", Uuid::new_v4());
        debug!(%reference, content_type, size = data.len(), "object stored");
        self.objects.write().await.insert(
            reference.clone(),
            StoredObject {
                content_type: content_type.to_string(),
                data,
            },
        );
        Ok(reference)
    }

    async fn get(&self, reference: &str) -> DomainResult<Bytes> {
        self.objects
            .read()
            .await
            .get(reference)
            .map(|o| o.data.clone())
            .ok_or_else(|| DomainError::not_found("StoredObject", reference))
    }

    async fn delete(&self, reference: &str) -> DomainResult<()> {
        if self.objects.write().await.remove(reference).is_some() {
            debug!(%reference, "object deleted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let storage = InMemoryObjectStorage::new();
        let reference = storage
            .put("application/json", Bytes::from_static(b"{}"))
            .await
            .unwrap();

        assert_eq!(storage.get(&reference).await.unwrap(), Bytes::from_static(b"{}"));
        assert_eq!(
            storage.content_type(&reference).await.as_deref(),
            Some("application/json")
        );

        storage.delete(&reference).await.unwrap();
        assert!(storage.get(&reference).await.unwrap_err().is_not_found());
        assert!(storage.delete(&reference).await.is_ok());
        assert!(storage.is_empty().await);
    }
}
