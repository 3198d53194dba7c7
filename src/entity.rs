// Copyright 2025 Cowboy AI, LLC.

//! Typed identities and the aggregate root contract

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;

/// A typed entity ID using phantom types for type safety
///
/// The phantom parameter keeps a `EntityId<PermitMarker>` from being passed
/// where a `EntityId<ClearanceMarker>` is expected.
///
/// ```rust
/// use livestock_movement::{EntityId, markers::{LivestockMarker, OwnerMarker}};
///
/// let livestock = EntityId::<LivestockMarker>::new();
/// let owner = EntityId::<OwnerMarker>::new();
/// assert_ne!(livestock.as_uuid(), owner.as_uuid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId<T> {
    id: Uuid,
    #[serde(skip)]
    _phantom: PhantomData<T>,
}

impl<T> EntityId<T> {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            _phantom: PhantomData,
        }
    }

    /// Create an entity ID from a UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.id
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> Default for EntityId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromStr for EntityId<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self::from_uuid)
    }
}

impl<T> From<EntityId<T>> for Uuid {
    fn from(id: EntityId<T>) -> Self {
        id.id
    }
}

/// Aggregate roots are the only entry points for mutating persisted state.
///
/// `version` backs optimistic concurrency: a repository accepts a write only
/// when the caller's expected version still matches the stored one.
pub trait AggregateRoot: Clone + Send + Sync + 'static {
    /// The marker type for this aggregate's ID
    type Marker: fmt::Debug
        + Clone
        + Copy
        + PartialEq
        + Eq
        + std::hash::Hash
        + Send
        + Sync
        + 'static;

    /// Human-readable type name used in errors and logs
    const TYPE_NAME: &'static str;

    /// Get the aggregate's ID
    fn id(&self) -> EntityId<Self::Marker>;

    /// Get the aggregate's version for optimistic concurrency
    fn version(&self) -> u64;

    /// Overwrite the version (repositories only)
    fn set_version(&mut self, version: u64);

    /// Increment the version
    fn increment_version(&mut self) {
        let next = self.version() + 1;
        self.set_version(next);
    }

    /// Globally unique business key, if the aggregate has one
    fn natural_key(&self) -> Option<String> {
        None
    }
}

/// Marker for livestock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LivestockMarker;

/// Marker for owners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerMarker;

/// Marker for officers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OfficerMarker;

/// Marker for police clearances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClearanceMarker;

/// Marker for movement permits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermitMarker;

/// Marker for checkpoint verifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VerificationMarker;

/// Marker for ownership transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransferMarker;

/// Livestock ID
pub type LivestockId = EntityId<LivestockMarker>;
/// Owner ID
pub type OwnerId = EntityId<OwnerMarker>;
/// Officer ID
pub type OfficerId = EntityId<OfficerMarker>;
/// Police clearance ID
pub type ClearanceId = EntityId<ClearanceMarker>;
/// Movement permit ID
pub type PermitId = EntityId<PermitMarker>;
/// Permit verification ID
pub type VerificationId = EntityId<VerificationMarker>;
/// Ownership transfer ID
pub type TransferId = EntityId<TransferMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_new_is_unique() {
        let id1 = LivestockId::new();
        let id2 = LivestockId::new();

        assert_ne!(id1, id2);
        assert!(!id1.as_uuid().is_nil());
    }

    #[test]
    fn test_entity_id_display_and_parse() {
        let uuid = Uuid::new_v4();
        let id = PermitId::from_uuid(uuid);

        assert_eq!(format!("{id}"), format!("{uuid}"));
        let parsed: PermitId = uuid.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<PermitId>().is_err());
    }

    #[test]
    fn test_entity_id_serializes_as_plain_uuid() {
        let uuid = Uuid::new_v4();
        let id = OwnerId::from_uuid(uuid);

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
        let back: OwnerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
