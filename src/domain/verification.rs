// Copyright 2025 Cowboy AI, LLC.

use super::Coordinates;
use crate::entity::{OfficerId, PermitId, VerificationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of checking a permit at a checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Whether the scan passed every check
    pub valid: bool,
    /// First failed check, if any
    pub flag_reason: Option<String>,
}

impl CheckOutcome {
    /// Passing outcome
    pub fn passed() -> Self {
        Self {
            valid: true,
            flag_reason: None,
        }
    }

    /// Failing outcome with the reason
    pub fn flagged(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            flag_reason: Some(reason.into()),
        }
    }
}

/// Append-only record of one checkpoint scan
///
/// Rows are never updated or deleted after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermitVerification {
    /// Verification ID
    pub id: VerificationId,
    /// Permit that was scanned
    pub permit_id: PermitId,
    /// Officer who scanned it
    pub verified_by: OfficerId,
    /// When the scan happened
    pub verified_at: DateTime<Utc>,
    /// Where the scan happened
    pub coordinates: Option<Coordinates>,
    /// Officer remarks
    pub notes: Option<String>,
    /// Whether the permit passed
    pub valid: bool,
    /// Why it did not
    pub flag_reason: Option<String>,
}
