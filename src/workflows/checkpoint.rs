// Copyright 2025 Cowboy AI, LLC.

//! Checkpoint verification
//!
//! A failed check is recorded as data (`valid = false` plus a reason), never
//! returned as an error. Scans do not change permit state; the first-scan
//! transition to `IN_TRANSIT` is the permit workflow's business.

use crate::domain::{CheckOutcome, Coordinates, Livestock, MovementPermit, PermitStatus, PermitVerification};
use crate::entity::{OfficerId, PermitId, VerificationId};
use crate::errors::DomainResult;
use crate::persistence::VerificationLog;
use crate::state_machine::State;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Flag reason for a scan of stolen livestock
pub const STOLEN_LIVESTOCK_ALERT: &str = "stolen livestock alert";

/// Evaluates and records checkpoint scans
#[derive(Clone)]
pub struct CheckpointVerifier {
    log: Arc<dyn VerificationLog>,
}

impl CheckpointVerifier {
    /// Verifier appending to `log`
    pub fn new(log: Arc<dyn VerificationLog>) -> Self {
        Self { log }
    }

    /// Judge a permit as it stands on `today`.
    ///
    /// Checks run in priority order and the first failure wins: stolen
    /// livestock, permit status, not yet valid, expired.
    pub fn evaluate(permit: &MovementPermit, livestock: &Livestock, today: NaiveDate) -> CheckOutcome {
        if livestock.stolen {
            return CheckOutcome::flagged(STOLEN_LIVESTOCK_ALERT);
        }
        if !matches!(permit.status, PermitStatus::Approved | PermitStatus::InTransit) {
            return CheckOutcome::flagged(format!("permit is {}", permit.status.name()));
        }
        if today < permit.valid_from {
            return CheckOutcome::flagged("not yet valid");
        }
        if today > permit.valid_until {
            return CheckOutcome::flagged("expired");
        }
        CheckOutcome::passed()
    }

    /// Evaluate a scan and append it to the audit trail
    pub async fn record(
        &self,
        permit: &MovementPermit,
        livestock: &Livestock,
        verified_by: OfficerId,
        verified_at: DateTime<Utc>,
        coordinates: Option<Coordinates>,
        notes: Option<String>,
    ) -> DomainResult<PermitVerification> {
        let outcome = Self::evaluate(permit, livestock, verified_at.date_naive());
        let verification = PermitVerification {
            id: VerificationId::new(),
            permit_id: permit.id,
            verified_by,
            verified_at,
            coordinates,
            notes,
            valid: outcome.valid,
            flag_reason: outcome.flag_reason,
        };
        self.log.append(verification.clone()).await?;

        match &verification.flag_reason {
            Some(reason) => warn!(
                permit_number = %permit.permit_number,
                tag_code = %livestock.tag_code,
                %reason,
                "checkpoint scan flagged"
            ),
            None => debug!(permit_number = %permit.permit_number, "checkpoint scan passed"),
        }
        Ok(verification)
    }

    /// Every scan of a permit, oldest first
    pub async fn history(&self, permit_id: &PermitId) -> DomainResult<Vec<PermitVerification>> {
        self.log.for_permit(permit_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Location;
    use crate::entity::{ClearanceId, LivestockId, OwnerId};
    use crate::persistence::InMemoryVerificationLog;
    use test_case::test_case;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, d).unwrap()
    }

    fn permit(status: PermitStatus) -> MovementPermit {
        let mut permit = MovementPermit::issued(
            "DG-2026-000007".into(),
            ClearanceId::new(),
            LivestockId::new(),
            OwnerId::new(),
            Location::named("Otjiwarongo"),
            Location::named("Outjo"),
            date(10),
            date(12),
            OfficerId::new(),
            Utc::now(),
        );
        permit.status = status;
        permit
    }

    fn animal(stolen: bool) -> Livestock {
        let mut animal = Livestock::new("NA-OT-0009", OwnerId::new(), "goat");
        animal.stolen = stolen;
        animal
    }

    #[test_case(PermitStatus::Approved, false, date(11), None ; "approved inside window")]
    #[test_case(PermitStatus::InTransit, false, date(12), None ; "in transit on last day")]
    #[test_case(PermitStatus::Approved, true, date(11), Some("stolen livestock alert") ; "stolen")]
    #[test_case(PermitStatus::Cancelled, true, date(11), Some("stolen livestock alert") ; "stolen wins over status")]
    #[test_case(PermitStatus::Completed, false, date(11), Some("permit is COMPLETED") ; "completed")]
    #[test_case(PermitStatus::Cancelled, false, date(20), Some("permit is CANCELLED") ; "status wins over window")]
    #[test_case(PermitStatus::Approved, false, date(9), Some("not yet valid") ; "before window")]
    #[test_case(PermitStatus::InTransit, false, date(13), Some("expired") ; "after window")]
    fn test_priority_order(status: PermitStatus, stolen: bool, today: NaiveDate, reason: Option<&str>) {
        let outcome = CheckpointVerifier::evaluate(&permit(status), &animal(stolen), today);
        assert_eq!(outcome.valid, reason.is_none());
        assert_eq!(outcome.flag_reason.as_deref(), reason);
    }

    #[tokio::test]
    async fn test_flagged_scan_is_still_recorded() {
        let verifier = CheckpointVerifier::new(Arc::new(InMemoryVerificationLog::new()));
        let p = permit(PermitStatus::Approved);
        let at = date(11).and_hms_opt(9, 0, 0).unwrap().and_utc();

        let row = verifier
            .record(&p, &animal(true), OfficerId::new(), at, None, Some("roadblock B1".into()))
            .await
            .unwrap();

        assert!(!row.valid);
        assert_eq!(row.flag_reason.as_deref(), Some(STOLEN_LIVESTOCK_ALERT));
        assert_eq!(verifier.history(&p.id).await.unwrap(), vec![row]);
    }
}
