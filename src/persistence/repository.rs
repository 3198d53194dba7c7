// Copyright 2025 Cowboy AI, LLC.

//! Aggregate repositories with optimistic concurrency
//!
//! A write is accepted only when the caller still holds the latest version of
//! the aggregate (compare-and-swap on `version`). Two callers racing on the
//! same aggregate therefore get exactly one success; the loser receives
//! [`DomainError::ConcurrencyConflict`].

use crate::entity::{AggregateRoot, EntityId};
use crate::errors::{DomainError, DomainResult};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Predicate over stored aggregates
pub type Filter<'a, A> = &'a (dyn Fn(&A) -> bool + Send + Sync);

/// Repository trait for loading and saving aggregates
///
/// There is intentionally no delete: documents are retained for audit.
#[async_trait]
pub trait Repository<A: AggregateRoot>: Send + Sync {
    /// Store a new aggregate at version 1 and return the stored copy
    async fn insert(&self, aggregate: &A) -> DomainResult<A>;

    /// Store a new aggregate unless an existing one matches `conflict`.
    ///
    /// The check and the insert happen atomically.
    async fn insert_unless(&self, aggregate: &A, conflict: Filter<'_, A>) -> DomainResult<A>;

    /// Load aggregate by ID
    async fn load(&self, id: &EntityId<A::Marker>) -> DomainResult<Option<A>>;

    /// Save a modified aggregate.
    ///
    /// `aggregate.version()` must equal the stored version; the stored copy
    /// is returned with its version incremented.
    async fn save(&self, aggregate: &A) -> DomainResult<A>;

    /// Look up by the aggregate's natural key
    async fn find_by_natural_key(&self, key: &str) -> DomainResult<Option<A>>;

    /// All aggregates matching the predicate, in insertion order
    async fn find(&self, predicate: Filter<'_, A>) -> DomainResult<Vec<A>>;

    /// Load aggregate by ID, failing when absent
    async fn get(&self, id: &EntityId<A::Marker>) -> DomainResult<A> {
        self.load(id)
            .await?
            .ok_or_else(|| DomainError::not_found(A::TYPE_NAME, id))
    }
}

struct Table<A: AggregateRoot> {
    rows: IndexMap<EntityId<A::Marker>, A>,
    natural_keys: HashMap<String, EntityId<A::Marker>>,
}

/// In-memory repository
pub struct InMemoryRepository<A: AggregateRoot> {
    table: RwLock<Table<A>>,
}

impl<A: AggregateRoot> Default for InMemoryRepository<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: AggregateRoot> InMemoryRepository<A> {
    /// Create an empty repository
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table {
                rows: IndexMap::new(),
                natural_keys: HashMap::new(),
            }),
        }
    }

    /// Number of stored aggregates
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    /// Whether nothing has been stored yet
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn insert_locked(table: &mut Table<A>, aggregate: &A) -> DomainResult<A> {
        let id = aggregate.id();
        if table.rows.contains_key(&id) {
            return Err(DomainError::AlreadyExists(format!("{} {id}", A::TYPE_NAME)));
        }
        let key = aggregate.natural_key();
        if let Some(key) = &key {
            if table.natural_keys.contains_key(key) {
                return Err(DomainError::AlreadyExists(format!("{} {key}", A::TYPE_NAME)));
            }
        }

        let mut stored = aggregate.clone();
        stored.set_version(1);
        if let Some(key) = key {
            table.natural_keys.insert(key, id);
        }
        table.rows.insert(id, stored.clone());
        debug!(aggregate = A::TYPE_NAME, %id, "inserted");
        Ok(stored)
    }
}

#[async_trait]
impl<A: AggregateRoot> Repository<A> for InMemoryRepository<A> {
    async fn insert(&self, aggregate: &A) -> DomainResult<A> {
        let mut table = self.table.write().await;
        Self::insert_locked(&mut table, aggregate)
    }

    async fn insert_unless(&self, aggregate: &A, conflict: Filter<'_, A>) -> DomainResult<A> {
        let mut table = self.table.write().await;
        if let Some(existing) = table.rows.values().find(|row| conflict(row)) {
            return Err(DomainError::AlreadyExists(format!(
                "{} {} conflicts with the new record",
                A::TYPE_NAME,
                existing.id()
            )));
        }
        Self::insert_locked(&mut table, aggregate)
    }

    async fn load(&self, id: &EntityId<A::Marker>) -> DomainResult<Option<A>> {
        Ok(self.table.read().await.rows.get(id).cloned())
    }

    async fn save(&self, aggregate: &A) -> DomainResult<A> {
        let id = aggregate.id();
        let mut table = self.table.write().await;
        let current = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(A::TYPE_NAME, id))?;

        if current.version() != aggregate.version() {
            return Err(DomainError::ConcurrencyConflict {
                entity_type: A::TYPE_NAME.to_string(),
                id: id.to_string(),
                expected: aggregate.version(),
                actual: current.version(),
            });
        }

        let mut stored = aggregate.clone();
        stored.increment_version();
        *current = stored.clone();
        debug!(aggregate = A::TYPE_NAME, %id, version = stored.version(), "saved");
        Ok(stored)
    }

    async fn find_by_natural_key(&self, key: &str) -> DomainResult<Option<A>> {
        let table = self.table.read().await;
        Ok(table
            .natural_keys
            .get(key)
            .and_then(|id| table.rows.get(id))
            .cloned())
    }

    async fn find(&self, predicate: Filter<'_, A>) -> DomainResult<Vec<A>> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .filter(|row| predicate(row))
            .cloned()
            .collect())
    }
}
