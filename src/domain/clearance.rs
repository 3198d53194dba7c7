// Copyright 2025 Cowboy AI, LLC.

//! Police clearance lifecycle
//!
//! ```text
//! PENDING ──approve──▶ APPROVED ··(expiry date passes)··▶ EXPIRED
//!    └─────reject────▶ REJECTED
//! ```
//!
//! `EXPIRED` is observed, never stored: an approved clearance past its expiry
//! date simply reads as expired.

use super::Coordinates;
use crate::entity::{AggregateRoot, ClearanceId, ClearanceMarker, LivestockId, OfficerId, OwnerId};
use crate::errors::{DomainError, DomainResult};
use crate::state_machine::{MealyStateTransitions, State, TransitionInput};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Clearance status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClearanceStatus {
    /// Awaiting a police decision
    Pending,
    /// Approved; valid until the expiry date
    Approved,
    /// Refused (terminal)
    Rejected,
    /// Approved but past its expiry date (terminal, derived)
    Expired,
}

/// Inputs accepted by the clearance state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearanceInput {
    /// Police approve the request
    Approve,
    /// Police refuse the request
    Reject,
}

impl TransitionInput for ClearanceInput {
    fn description(&self) -> &'static str {
        match self {
            ClearanceInput::Approve => "approve",
            ClearanceInput::Reject => "reject",
        }
    }
}

impl State for ClearanceStatus {
    fn name(&self) -> &'static str {
        match self {
            ClearanceStatus::Pending => "PENDING",
            ClearanceStatus::Approved => "APPROVED",
            ClearanceStatus::Rejected => "REJECTED",
            ClearanceStatus::Expired => "EXPIRED",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, ClearanceStatus::Rejected | ClearanceStatus::Expired)
    }
}

impl MealyStateTransitions for ClearanceStatus {
    type Input = ClearanceInput;
    const ENTITY_TYPE: &'static str = "PoliceClearance";

    fn next_state(&self, input: &ClearanceInput) -> Option<Self> {
        use ClearanceInput as I;
        use ClearanceStatus as S;
        match (self, input) {
            (S::Pending, I::Approve) => Some(S::Approved),
            (S::Pending, I::Reject) => Some(S::Rejected),
            _ => None,
        }
    }
}

/// Police attestation that an animal/owner pair is not linked to theft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoliceClearance {
    /// Clearance ID
    pub id: ClearanceId,
    /// `PC-{province}-{sequence}`
    pub clearance_number: String,
    /// Animal the clearance covers
    pub livestock_id: LivestockId,
    /// Owner at the time of the request
    pub owner_id: OwnerId,
    /// Officer who took the request
    pub issued_by: OfficerId,
    /// Province whose sequence numbered this clearance
    pub province_code: String,
    /// Where the request was taken
    pub issued_at: Option<Coordinates>,
    /// Free-form remarks
    pub notes: Option<String>,
    /// Stored status (never `Expired`)
    pub status: ClearanceStatus,
    /// When the request was recorded
    pub requested_at: DateTime<Utc>,
    /// Officer who approved
    pub approved_by: Option<OfficerId>,
    /// When it was approved
    pub approved_at: Option<DateTime<Utc>>,
    /// First day of validity (approval date)
    pub clearance_date: Option<NaiveDate>,
    /// Last day of validity
    pub expiry_date: Option<NaiveDate>,
    /// Why it was refused; present iff rejected
    pub rejection_reason: Option<String>,
    /// When it was refused
    pub rejected_at: Option<DateTime<Utc>>,
    /// Storage reference of the QR payload
    pub qr_code_ref: Option<String>,
    version: u64,
}

impl PoliceClearance {
    /// New pending clearance
    pub fn pending(
        clearance_number: String,
        livestock_id: LivestockId,
        owner_id: OwnerId,
        issued_by: OfficerId,
        province_code: String,
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ClearanceId::new(),
            clearance_number,
            livestock_id,
            owner_id,
            issued_by,
            province_code,
            issued_at: None,
            notes: None,
            status: ClearanceStatus::Pending,
            requested_at,
            approved_by: None,
            approved_at: None,
            clearance_date: None,
            expiry_date: None,
            rejection_reason: None,
            rejected_at: None,
            qr_code_ref: None,
            version: 0,
        }
    }

    /// Approve; the validity window starts on the approval date.
    pub(crate) fn approve(
        &mut self,
        approved_by: OfficerId,
        now: DateTime<Utc>,
        validity_days: i64,
        qr_code_ref: Option<String>,
    ) -> DomainResult<()> {
        let today = now.date_naive();
        let expiry_date = Duration::try_days(validity_days)
            .and_then(|window| today.checked_add_signed(window))
            .ok_or_else(|| {
                DomainError::validation("clearance_validity_days", "window runs past the calendar")
            })?;
        self.status = self.status.apply(&ClearanceInput::Approve)?;
        self.approved_by = Some(approved_by);
        self.approved_at = Some(now);
        self.clearance_date = Some(today);
        self.expiry_date = Some(expiry_date);
        self.qr_code_ref = qr_code_ref;
        Ok(())
    }

    pub(crate) fn reject(&mut self, reason: String, now: DateTime<Utc>) -> DomainResult<()> {
        self.status = self.status.apply(&ClearanceInput::Reject)?;
        self.rejection_reason = Some(reason);
        self.rejected_at = Some(now);
        Ok(())
    }

    /// `APPROVED` and not past the expiry date
    pub fn is_valid(&self, today: NaiveDate) -> bool {
        self.status == ClearanceStatus::Approved
            && self.expiry_date.is_some_and(|expiry| expiry >= today)
    }

    /// Status as observed on `today`, with expiry applied
    pub fn effective_status(&self, today: NaiveDate) -> ClearanceStatus {
        match self.status {
            ClearanceStatus::Approved if !self.is_valid(today) => ClearanceStatus::Expired,
            status => status,
        }
    }
}

impl AggregateRoot for PoliceClearance {
    type Marker = ClearanceMarker;
    const TYPE_NAME: &'static str = "PoliceClearance";

    fn id(&self) -> ClearanceId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn natural_key(&self) -> Option<String> {
        Some(self.clearance_number.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    fn clearance() -> PoliceClearance {
        PoliceClearance::pending(
            "PC-KW-000001".into(),
            LivestockId::new(),
            OwnerId::new(),
            OfficerId::new(),
            "KW".into(),
            Utc::now(),
        )
    }

    #[test_case(ClearanceStatus::Pending, ClearanceInput::Approve, Some(ClearanceStatus::Approved))]
    #[test_case(ClearanceStatus::Pending, ClearanceInput::Reject, Some(ClearanceStatus::Rejected))]
    #[test_case(ClearanceStatus::Approved, ClearanceInput::Approve, None)]
    #[test_case(ClearanceStatus::Approved, ClearanceInput::Reject, None)]
    #[test_case(ClearanceStatus::Rejected, ClearanceInput::Approve, None)]
    #[test_case(ClearanceStatus::Rejected, ClearanceInput::Reject, None)]
    #[test_case(ClearanceStatus::Expired, ClearanceInput::Approve, None)]
    fn test_transition_table(
        from: ClearanceStatus,
        input: ClearanceInput,
        expected: Option<ClearanceStatus>,
    ) {
        assert_eq!(from.next_state(&input), expected);
    }

    #[test]
    fn test_approval_sets_window_from_approval_date() {
        let mut c = clearance();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        c.approve(OfficerId::new(), now, 14, Some("qr/1".into()))
            .unwrap();

        assert_eq!(c.clearance_date, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(c.expiry_date, NaiveDate::from_ymd_opt(2026, 3, 15));
        assert_eq!(c.qr_code_ref.as_deref(), Some("qr/1"));
    }

    #[test]
    fn test_validity_is_derived_from_expiry() {
        let mut c = clearance();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        c.approve(OfficerId::new(), now, 14, None).unwrap();

        let last_day = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert!(c.is_valid(last_day));
        assert_eq!(c.effective_status(last_day), ClearanceStatus::Approved);

        let day_after = NaiveDate::from_ymd_opt(2026, 3, 16).unwrap();
        assert!(!c.is_valid(day_after));
        assert_eq!(c.effective_status(day_after), ClearanceStatus::Expired);
        assert_eq!(c.status, ClearanceStatus::Approved);
    }

    #[test]
    fn test_pending_is_never_valid() {
        let c = clearance();
        assert!(!c.is_valid(Utc::now().date_naive()));
    }

    #[test]
    fn test_second_decision_is_rejected() {
        let mut c = clearance();
        c.reject("owner could not be verified".into(), Utc::now())
            .unwrap();

        let err = c
            .approve(OfficerId::new(), Utc::now(), 14, None)
            .unwrap_err();
        assert!(err.is_invalid_transition());
        assert!(err.to_string().contains("REJECTED"));
    }

    #[test]
    fn test_window_past_the_calendar_is_refused() {
        let mut c = clearance();
        let err = c
            .approve(OfficerId::new(), Utc::now(), 1_000_000_000_000, None)
            .unwrap_err();

        assert_eq!(err.field(), Some("clearance_validity_days"));
        assert_eq!(c.status, ClearanceStatus::Pending);
        assert!(c.expiry_date.is_none());
    }
}
