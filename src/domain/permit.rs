// Copyright 2025 Cowboy AI, LLC.

//! Movement permit lifecycle
//!
//! ```text
//! APPROVED ──first checkpoint scan──▶ IN_TRANSIT ──complete──▶ COMPLETED
//!    │  └───────────────complete──────────────────────────────────▲
//!    └──cancel──▶ CANCELLED ◀──cancel── IN_TRANSIT
//! ```
//!
//! Permits are issued directly as `APPROVED`. `EXPIRED` is observed from the
//! validity window, never stored.

use super::{Coordinates, Location};
use crate::entity::{AggregateRoot, ClearanceId, LivestockId, OfficerId, OwnerId, PermitId, PermitMarker};
use crate::errors::DomainResult;
use crate::state_machine::{MealyStateTransitions, State, TransitionInput};
use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Permit status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermitStatus {
    /// Awaiting issue (not produced by the issuing workflow)
    Pending,
    /// Issued; movement not yet seen at a checkpoint
    Approved,
    /// Scanned at least once; animal is moving
    InTransit,
    /// Arrived (terminal)
    Completed,
    /// Withdrawn (terminal)
    Cancelled,
    /// Refused (terminal)
    Rejected,
    /// Past its validity window (terminal, derived)
    Expired,
}

/// Inputs accepted by the permit state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermitInput {
    /// First checkpoint scan
    StartTransit,
    /// Arrival recorded
    Complete,
    /// Withdrawn by an officer
    Cancel,
}

impl TransitionInput for PermitInput {
    fn description(&self) -> &'static str {
        match self {
            PermitInput::StartTransit => "start transit on",
            PermitInput::Complete => "complete",
            PermitInput::Cancel => "cancel",
        }
    }
}

impl State for PermitStatus {
    fn name(&self) -> &'static str {
        match self {
            PermitStatus::Pending => "PENDING",
            PermitStatus::Approved => "APPROVED",
            PermitStatus::InTransit => "IN_TRANSIT",
            PermitStatus::Completed => "COMPLETED",
            PermitStatus::Cancelled => "CANCELLED",
            PermitStatus::Rejected => "REJECTED",
            PermitStatus::Expired => "EXPIRED",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(
            self,
            PermitStatus::Completed
                | PermitStatus::Cancelled
                | PermitStatus::Rejected
                | PermitStatus::Expired
        )
    }
}

impl MealyStateTransitions for PermitStatus {
    type Input = PermitInput;
    const ENTITY_TYPE: &'static str = "MovementPermit";

    fn next_state(&self, input: &PermitInput) -> Option<Self> {
        use PermitInput as I;
        use PermitStatus as S;
        match (self, input) {
            (S::Pending | S::Approved, I::StartTransit) => Some(S::InTransit),
            (S::Approved | S::InTransit, I::Complete) => Some(S::Completed),
            (S::Completed | S::Cancelled, I::Cancel) => None,
            (_, I::Cancel) => Some(S::Cancelled),
            _ => None,
        }
    }
}

/// How the animal travels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportMode {
    /// Driven on foot
    OnFoot,
    /// Road vehicle
    Truck,
    /// Rail
    Rail,
    /// Anything else
    Other,
}

/// Authorization to move one animal between two locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementPermit {
    /// Permit ID
    pub id: PermitId,
    /// `DG-{year}-{sequence}`
    pub permit_number: String,
    /// Clearance the permit was issued against
    pub clearance_id: ClearanceId,
    /// Animal being moved (same as the clearance's)
    pub livestock_id: LivestockId,
    /// Owner of record at issue
    pub owner_id: OwnerId,
    /// Origin
    pub from_location: Location,
    /// Destination
    pub to_location: Location,
    /// Why the animal is moving (sale, grazing, slaughter, ...)
    pub purpose: String,
    /// How the animal travels
    pub transport_mode: TransportMode,
    /// Vehicle plate, for road transport
    pub vehicle_registration: Option<String>,
    /// First valid day
    pub valid_from: NaiveDate,
    /// Last valid day
    pub valid_until: NaiveDate,
    /// Issuing extension officer
    pub issued_by: OfficerId,
    /// When it was issued
    pub issued_at: DateTime<Utc>,
    /// Stored status (never `Expired`)
    pub status: PermitStatus,
    /// Storage reference of the QR payload
    pub qr_code_ref: Option<String>,
    /// First checkpoint scan
    pub movement_started_at: Option<DateTime<Utc>>,
    /// Arrival time
    pub completed_at: Option<DateTime<Utc>>,
    /// Where arrival was recorded
    pub completion_coordinates: Option<Coordinates>,
    /// When it was cancelled
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Why it was cancelled
    pub cancellation_reason: Option<String>,
    version: u64,
}

impl MovementPermit {
    /// New permit, issued directly as `APPROVED`
    #[allow(clippy::too_many_arguments)]
    pub fn issued(
        permit_number: String,
        clearance_id: ClearanceId,
        livestock_id: LivestockId,
        owner_id: OwnerId,
        from_location: Location,
        to_location: Location,
        valid_from: NaiveDate,
        valid_until: NaiveDate,
        issued_by: OfficerId,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PermitId::new(),
            permit_number,
            clearance_id,
            livestock_id,
            owner_id,
            from_location,
            to_location,
            purpose: String::new(),
            transport_mode: TransportMode::Truck,
            vehicle_registration: None,
            valid_from,
            valid_until,
            issued_by,
            issued_at,
            status: PermitStatus::Approved,
            qr_code_ref: None,
            movement_started_at: None,
            completed_at: None,
            completion_coordinates: None,
            cancelled_at: None,
            cancellation_reason: None,
            version: 0,
        }
    }

    pub(crate) fn start_transit(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.status = self.status.apply(&PermitInput::StartTransit)?;
        self.movement_started_at = Some(now);
        Ok(())
    }

    pub(crate) fn complete(
        &mut self,
        now: DateTime<Utc>,
        coordinates: Option<Coordinates>,
    ) -> DomainResult<()> {
        self.status = self.status.apply(&PermitInput::Complete)?;
        self.completed_at = Some(now);
        self.completion_coordinates = coordinates;
        Ok(())
    }

    pub(crate) fn cancel(&mut self, reason: String, now: DateTime<Utc>) -> DomainResult<()> {
        self.status = self.status.apply(&PermitInput::Cancel)?;
        self.cancelled_at = Some(now);
        self.cancellation_reason = Some(reason);
        Ok(())
    }

    /// `APPROVED` and `valid_from <= today <= valid_until`
    pub fn is_valid(&self, today: NaiveDate) -> bool {
        self.status == PermitStatus::Approved && self.within_window(today)
    }

    /// Whether `today` falls inside the validity window, regardless of status
    pub fn within_window(&self, today: NaiveDate) -> bool {
        self.valid_from <= today && today <= self.valid_until
    }

    /// Status as observed on `today`, with expiry applied to live permits
    pub fn effective_status(&self, today: NaiveDate) -> PermitStatus {
        match self.status {
            PermitStatus::Approved | PermitStatus::InTransit if today > self.valid_until => {
                PermitStatus::Expired
            }
            status => status,
        }
    }
}

impl AggregateRoot for MovementPermit {
    type Marker = PermitMarker;
    const TYPE_NAME: &'static str = "MovementPermit";

    fn id(&self) -> PermitId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn natural_key(&self) -> Option<String> {
        Some(self.permit_number.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn permit(valid_from: NaiveDate, valid_until: NaiveDate) -> MovementPermit {
        MovementPermit::issued(
            "DG-2026-000001".into(),
            ClearanceId::new(),
            LivestockId::new(),
            OwnerId::new(),
            Location::named("Farm Okatjeru"),
            Location::named("Windhoek auction"),
            valid_from,
            valid_until,
            OfficerId::new(),
            Utc::now(),
        )
    }

    #[test_case(PermitStatus::Approved, PermitInput::StartTransit, Some(PermitStatus::InTransit))]
    #[test_case(PermitStatus::InTransit, PermitInput::StartTransit, None)]
    #[test_case(PermitStatus::Approved, PermitInput::Complete, Some(PermitStatus::Completed))]
    #[test_case(PermitStatus::InTransit, PermitInput::Complete, Some(PermitStatus::Completed))]
    #[test_case(PermitStatus::Pending, PermitInput::Complete, None)]
    #[test_case(PermitStatus::Cancelled, PermitInput::Complete, None)]
    #[test_case(PermitStatus::Pending, PermitInput::Cancel, Some(PermitStatus::Cancelled))]
    #[test_case(PermitStatus::Approved, PermitInput::Cancel, Some(PermitStatus::Cancelled))]
    #[test_case(PermitStatus::InTransit, PermitInput::Cancel, Some(PermitStatus::Cancelled))]
    #[test_case(PermitStatus::Completed, PermitInput::Cancel, None)]
    #[test_case(PermitStatus::Cancelled, PermitInput::Cancel, None)]
    fn test_transition_table(from: PermitStatus, input: PermitInput, expected: Option<PermitStatus>) {
        assert_eq!(from.next_state(&input), expected);
    }

    #[test]
    fn test_validity_window_is_inclusive() {
        let p = permit(date(2026, 5, 1), date(2026, 5, 3));

        assert!(!p.is_valid(date(2026, 4, 30)));
        assert!(p.is_valid(date(2026, 5, 1)));
        assert!(p.is_valid(date(2026, 5, 3)));
        assert!(!p.is_valid(date(2026, 5, 4)));
    }

    #[test]
    fn test_in_transit_is_not_valid_but_reads_expired_after_window() {
        let mut p = permit(date(2026, 5, 1), date(2026, 5, 3));
        p.start_transit(Utc::now()).unwrap();

        assert!(!p.is_valid(date(2026, 5, 2)));
        assert_eq!(p.effective_status(date(2026, 5, 2)), PermitStatus::InTransit);
        assert_eq!(p.effective_status(date(2026, 5, 4)), PermitStatus::Expired);
    }

    #[test]
    fn test_completed_permit_cannot_be_cancelled() {
        let mut p = permit(date(2026, 5, 1), date(2026, 5, 3));
        p.complete(Utc::now(), None).unwrap();

        let err = p.cancel("changed plans".into(), Utc::now()).unwrap_err();
        assert!(err.is_invalid_transition());
        assert!(err.to_string().contains("COMPLETED"));
        assert_eq!(p.status, PermitStatus::Completed);
    }
}
