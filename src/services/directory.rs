// Copyright 2025 Cowboy AI, LLC.

//! Officer and owner lookup

use crate::domain::{Officer, Owner};
use crate::entity::{OfficerId, OwnerId};
use crate::errors::{DomainError, DomainResult};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Identity directory resolving officers and owners by ID
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Look up an officer
    async fn officer(&self, id: &OfficerId) -> DomainResult<Option<Officer>>;

    /// Look up an owner
    async fn owner(&self, id: &OwnerId) -> DomainResult<Option<Owner>>;

    /// Look up an officer, failing when unknown
    async fn get_officer(&self, id: &OfficerId) -> DomainResult<Officer> {
        self.officer(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Officer", id))
    }

    /// Look up an owner, failing when unknown
    async fn get_owner(&self, id: &OwnerId) -> DomainResult<Owner> {
        self.owner(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Owner", id))
    }
}

#[derive(Default)]
struct Entries {
    officers: HashMap<OfficerId, Officer>,
    owners: HashMap<OwnerId, Owner>,
}

/// In-memory directory
#[derive(Default)]
pub struct InMemoryDirectory {
    entries: RwLock<Entries>,
}

impl InMemoryDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an officer
    pub async fn add_officer(&self, officer: Officer) -> Officer {
        debug!(officer_id = %officer.id, badge = %officer.badge_number, "officer added");
        self.entries
            .write()
            .await
            .officers
            .insert(officer.id, officer.clone());
        officer
    }

    /// Add an owner; national IDs are unique
    pub async fn add_owner(&self, owner: Owner) -> DomainResult<Owner> {
        let mut entries = self.entries.write().await;
        if entries
            .owners
            .values()
            .any(|o| o.id != owner.id && o.national_id == owner.national_id)
        {
            return Err(DomainError::AlreadyExists(format!(
                "Owner with national id {}",
                owner.national_id
            )));
        }
        debug!(owner_id = %owner.id, "owner added");
        entries.owners.insert(owner.id, owner.clone());
        Ok(owner)
    }

    /// Mark an officer inactive
    pub async fn deactivate_officer(&self, id: &OfficerId) -> DomainResult<()> {
        let mut entries = self.entries.write().await;
        let officer = entries
            .officers
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("Officer", id))?;
        officer.active = false;
        Ok(())
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryDirectory {
    async fn officer(&self, id: &OfficerId) -> DomainResult<Option<Officer>> {
        Ok(self.entries.read().await.officers.get(id).cloned())
    }

    async fn owner(&self, id: &OwnerId) -> DomainResult<Option<Owner>> {
        Ok(self.entries.read().await.owners.get(id).cloned())
    }
}
