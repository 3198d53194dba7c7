// Copyright 2025 Cowboy AI, LLC.

//! Domain model: livestock, parties and the movement documents
//!
//! Documents are mutated only through the workflows in
//! [`crate::workflows`]; the methods here apply a single, already-authorized
//! transition to an in-memory copy.

mod clearance;
mod livestock;
mod party;
mod permit;
mod transfer;
mod verification;

pub use clearance::{ClearanceInput, ClearanceStatus, PoliceClearance};
pub use livestock::{Livestock, Sex};
pub use party::{Officer, OfficerRole, Owner};
pub use permit::{MovementPermit, PermitInput, PermitStatus, TransportMode};
pub use transfer::{ConfirmingParty, OwnershipTransfer, TransferInput, TransferStatus};
pub use verification::{CheckOutcome, PermitVerification};

use crate::errors::{DomainError, DomainResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// WGS84 position where something happened
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Coordinates {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl Coordinates {
    /// Validated constructor
    pub fn new(latitude: f64, longitude: f64) -> DomainResult<Self> {
        let coordinates = Self {
            latitude,
            longitude,
        };
        coordinates.validate()?;
        Ok(coordinates)
    }

    /// Reject positions outside the valid degree ranges
    pub fn validate(&self) -> DomainResult<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(DomainError::validation(
                "latitude",
                "must be between -90 and 90",
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(DomainError::validation(
                "longitude",
                "must be between -180 and 180",
            ));
        }
        Ok(())
    }
}

/// A named place livestock moves from or to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Location {
    /// Farm, market or village name
    pub name: String,
    /// Administrative district
    pub district: Option<String>,
    /// Position, when known
    pub coordinates: Option<Coordinates>,
}

impl Location {
    /// Location known only by name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            district: None,
            coordinates: None,
        }
    }

    pub(crate) fn validate(&self, field: &str) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation(
                format!("{field}.name"),
                "must not be empty",
            ));
        }
        if let Some(coordinates) = &self.coordinates {
            coordinates.validate()?;
        }
        Ok(())
    }
}
