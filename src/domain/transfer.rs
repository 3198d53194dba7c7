// Copyright 2025 Cowboy AI, LLC.

//! Ownership transfer lifecycle
//!
//! Either party may confirm first. Each confirmation sets its own flag; the
//! transfer becomes `CONFIRMED` as soon as both flags are set, whichever call
//! completes the pair.
//!
//! ```text
//! PENDING ──both confirmed──▶ CONFIRMED ──complete──▶ COMPLETED
//!    └──────cancel──────▶ CANCELLED ◀──────cancel──────┘
//! ```

use crate::entity::{AggregateRoot, LivestockId, OfficerId, OwnerId, TransferId, TransferMarker};
use crate::errors::DomainResult;
use crate::state_machine::{MealyStateTransitions, State, TransitionInput};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Transfer status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    /// Waiting for one or both confirmations
    Pending,
    /// Both parties confirmed; awaiting an officer to complete
    Confirmed,
    /// Ownership changed (terminal)
    Completed,
    /// Abandoned (terminal)
    Cancelled,
}

/// Which side of the transfer is confirming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmingParty {
    /// The owner giving up the animal
    CurrentOwner,
    /// The owner receiving the animal
    NewOwner,
}

impl ConfirmingParty {
    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            ConfirmingParty::CurrentOwner => "current owner",
            ConfirmingParty::NewOwner => "new owner",
        }
    }
}

/// Inputs accepted by the transfer state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferInput {
    /// One party confirms
    Confirm(ConfirmingParty),
    /// The second flag was set
    BothConfirmed,
    /// Officer completes the handover
    Complete,
    /// Officer abandons the transfer
    Cancel,
}

impl TransitionInput for TransferInput {
    fn description(&self) -> &'static str {
        match self {
            TransferInput::Confirm(ConfirmingParty::CurrentOwner) => "confirm (current owner)",
            TransferInput::Confirm(ConfirmingParty::NewOwner) => "confirm (new owner)",
            TransferInput::BothConfirmed => "mark as confirmed",
            TransferInput::Complete => "complete",
            TransferInput::Cancel => "cancel",
        }
    }
}

impl State for TransferStatus {
    fn name(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "PENDING",
            TransferStatus::Confirmed => "CONFIRMED",
            TransferStatus::Completed => "COMPLETED",
            TransferStatus::Cancelled => "CANCELLED",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Cancelled)
    }
}

impl MealyStateTransitions for TransferStatus {
    type Input = TransferInput;
    const ENTITY_TYPE: &'static str = "OwnershipTransfer";

    fn next_state(&self, input: &TransferInput) -> Option<Self> {
        use TransferInput as I;
        use TransferStatus as S;
        match (self, input) {
            (S::Pending, I::Confirm(_)) => Some(S::Pending),
            (S::Pending, I::BothConfirmed) => Some(S::Confirmed),
            (S::Confirmed, I::Complete) => Some(S::Completed),
            (S::Pending | S::Confirmed, I::Cancel) => Some(S::Cancelled),
            _ => None,
        }
    }
}

/// Two-party confirmed handover of an animal's owner of record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipTransfer {
    /// Transfer ID
    pub id: TransferId,
    /// Animal changing hands
    pub livestock_id: LivestockId,
    /// Owner at initiation
    pub from_owner_id: OwnerId,
    /// Receiving owner
    pub to_owner_id: OwnerId,
    /// Officer who opened the transfer
    pub initiated_by: OfficerId,
    /// When it was opened
    pub initiated_at: DateTime<Utc>,
    /// Sale, inheritance, gift, ...
    pub reason: Option<String>,
    /// Agreed handover date
    pub transfer_date: NaiveDate,
    /// Status
    pub status: TransferStatus,
    /// Current owner has confirmed
    pub from_owner_confirmed: bool,
    /// When the current owner confirmed
    pub from_owner_confirmed_at: Option<DateTime<Utc>>,
    /// Stored fingerprint probe of the current owner
    pub from_owner_fingerprint_ref: Option<String>,
    /// New owner has confirmed
    pub to_owner_confirmed: bool,
    /// When the new owner confirmed
    pub to_owner_confirmed_at: Option<DateTime<Utc>>,
    /// Stored fingerprint probe of the new owner
    pub to_owner_fingerprint_ref: Option<String>,
    /// Officer who completed it
    pub completed_by: Option<OfficerId>,
    /// When it was completed
    pub completed_at: Option<DateTime<Utc>>,
    /// Officer who cancelled it
    pub cancelled_by: Option<OfficerId>,
    /// When it was cancelled
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Why it was cancelled
    pub cancellation_reason: Option<String>,
    version: u64,
}

impl OwnershipTransfer {
    /// New pending transfer
    pub fn pending(
        livestock_id: LivestockId,
        from_owner_id: OwnerId,
        to_owner_id: OwnerId,
        initiated_by: OfficerId,
        transfer_date: NaiveDate,
        initiated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransferId::new(),
            livestock_id,
            from_owner_id,
            to_owner_id,
            initiated_by,
            initiated_at,
            reason: None,
            transfer_date,
            status: TransferStatus::Pending,
            from_owner_confirmed: false,
            from_owner_confirmed_at: None,
            from_owner_fingerprint_ref: None,
            to_owner_confirmed: false,
            to_owner_confirmed_at: None,
            to_owner_fingerprint_ref: None,
            completed_by: None,
            completed_at: None,
            cancelled_by: None,
            cancelled_at: None,
            cancellation_reason: None,
            version: 0,
        }
    }

    /// Owner expected to confirm for `party`
    pub fn party_owner(&self, party: ConfirmingParty) -> OwnerId {
        match party {
            ConfirmingParty::CurrentOwner => self.from_owner_id,
            ConfirmingParty::NewOwner => self.to_owner_id,
        }
    }

    /// Whether `party` has already confirmed
    pub fn has_confirmed(&self, party: ConfirmingParty) -> bool {
        match party {
            ConfirmingParty::CurrentOwner => self.from_owner_confirmed,
            ConfirmingParty::NewOwner => self.to_owner_confirmed,
        }
    }

    /// Both flags set
    pub fn both_confirmed(&self) -> bool {
        self.from_owner_confirmed && self.to_owner_confirmed
    }

    /// Set the party's flag; advance to `CONFIRMED` once both are set.
    ///
    /// Re-confirming an already confirmed side changes nothing. Returns
    /// whether this call completed the pair.
    pub(crate) fn confirm(
        &mut self,
        party: ConfirmingParty,
        fingerprint_ref: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        self.status.apply(&TransferInput::Confirm(party))?;
        if self.has_confirmed(party) {
            return Ok(false);
        }

        match party {
            ConfirmingParty::CurrentOwner => {
                self.from_owner_confirmed = true;
                self.from_owner_confirmed_at = Some(now);
                self.from_owner_fingerprint_ref = fingerprint_ref;
            }
            ConfirmingParty::NewOwner => {
                self.to_owner_confirmed = true;
                self.to_owner_confirmed_at = Some(now);
                self.to_owner_fingerprint_ref = fingerprint_ref;
            }
        }

        if self.both_confirmed() {
            self.status = self.status.apply(&TransferInput::BothConfirmed)?;
            return Ok(true);
        }
        Ok(false)
    }

    pub(crate) fn complete(&mut self, completed_by: OfficerId, now: DateTime<Utc>) -> DomainResult<()> {
        self.status = self.status.apply(&TransferInput::Complete)?;
        self.completed_by = Some(completed_by);
        self.completed_at = Some(now);
        Ok(())
    }

    pub(crate) fn cancel(
        &mut self,
        cancelled_by: OfficerId,
        reason: String,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.status = self.status.apply(&TransferInput::Cancel)?;
        self.cancelled_by = Some(cancelled_by);
        self.cancelled_at = Some(now);
        self.cancellation_reason = Some(reason);
        Ok(())
    }
}

impl AggregateRoot for OwnershipTransfer {
    type Marker = TransferMarker;
    const TYPE_NAME: &'static str = "OwnershipTransfer";

    fn id(&self) -> TransferId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}
