// Copyright 2025 Cowboy AI, LLC.

//! Per-scope counters backing document numbers

use crate::errors::DomainResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Atomic fetch-and-increment counters keyed by scope
///
/// Values handed out are never reused, even when the document they were
/// allocated for is later rejected or cancelled.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Allocate the next value for `scope`. The first value is 1.
    async fn next_value(&self, scope: &str) -> DomainResult<u64>;

    /// Last value handed out for `scope` (0 if none)
    async fn current_value(&self, scope: &str) -> DomainResult<u64>;
}

/// In-memory sequence store
#[derive(Debug, Default)]
pub struct InMemorySequenceStore {
    counters: RwLock<HashMap<String, Arc<AtomicU64>>>,
}

impl InMemorySequenceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    async fn counter(&self, scope: &str) -> Arc<AtomicU64> {
        if let Some(counter) = self.counters.read().await.get(scope) {
            return counter.clone();
        }
        self.counters
            .write()
            .await
            .entry(scope.to_string())
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .clone()
    }
}

#[async_trait]
impl SequenceStore for InMemorySequenceStore {
    async fn next_value(&self, scope: &str) -> DomainResult<u64> {
        let value = self.counter(scope).await.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(scope, value, "allocated sequence value");
        Ok(value)
    }

    async fn current_value(&self, scope: &str) -> DomainResult<u64> {
        Ok(self
            .counters
            .read()
            .await
            .get(scope)
            .map(|counter| counter.load(Ordering::SeqCst))
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_scopes_are_independent() {
        let store = InMemorySequenceStore::new();

        assert_eq!(store.next_value("PC-KW").await.unwrap(), 1);
        assert_eq!(store.next_value("PC-KW").await.unwrap(), 2);
        assert_eq!(store.next_value("DG-2026").await.unwrap(), 1);
        assert_eq!(store.current_value("PC-KW").await.unwrap(), 2);
        assert_eq!(store.current_value("PC-HH").await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_allocation_is_unique() {
        let store = Arc::new(InMemorySequenceStore::new());
        let handles: Vec<_> = (0..200)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.next_value("DG-2026").await.unwrap() })
            })
            .collect();

        let values: HashSet<u64> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(values.len(), 200);
        assert_eq!(store.current_value("DG-2026").await.unwrap(), 200);
    }
}
