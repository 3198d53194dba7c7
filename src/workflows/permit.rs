// Copyright 2025 Cowboy AI, LLC.

//! Movement permit workflow

use super::{checkpoint::STOLEN_LIVESTOCK_ALERT, required_text, CheckpointVerifier, Services};
use crate::domain::{
    ClearanceStatus, Coordinates, Location, MovementPermit, OfficerRole, PermitStatus,
    PermitVerification, TransportMode,
};
use crate::entity::{ClearanceId, LivestockId, OfficerId, PermitId};
use crate::errors::{DomainError, DomainResult};
use crate::events::LivestockEvent;
use crate::services::QrPayload;
use crate::state_machine::State;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

/// Permit request
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePermit {
    /// Approved clearance the permit rests on
    pub clearance_id: ClearanceId,
    /// Animal to move; must be the clearance's
    pub livestock_id: LivestockId,
    /// Origin
    pub from_location: Location,
    /// Destination
    pub to_location: Location,
    /// First valid day
    pub valid_from: NaiveDate,
    /// Last valid day
    pub valid_until: NaiveDate,
    /// Issuing extension officer
    pub issued_by: OfficerId,
    /// Why the animal is moving
    pub purpose: Option<String>,
    /// How it travels
    pub transport_mode: Option<TransportMode>,
    /// Vehicle plate
    pub vehicle_registration: Option<String>,
}

impl CreatePermit {
    /// Request with only the required fields
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clearance_id: ClearanceId,
        livestock_id: LivestockId,
        from_location: Location,
        to_location: Location,
        valid_from: NaiveDate,
        valid_until: NaiveDate,
        issued_by: OfficerId,
    ) -> Self {
        Self {
            clearance_id,
            livestock_id,
            from_location,
            to_location,
            valid_from,
            valid_until,
            issued_by,
            purpose: None,
            transport_mode: None,
            vehicle_registration: None,
        }
    }
}

/// Permit as read by callers, with validity applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermitView {
    /// Stored permit
    #[serde(flatten)]
    pub permit: MovementPermit,
    /// Status with expiry applied
    pub effective_status: PermitStatus,
    /// `APPROVED` and today inside the validity window
    pub valid: bool,
}

/// Outcome of a checkpoint scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// The recorded scan
    pub verification: PermitVerification,
    /// Permit after the scan
    pub permit: PermitView,
}

/// Owns the lifecycle of movement permits
#[derive(Clone)]
pub struct PermitWorkflow {
    services: Services,
    checkpoint: CheckpointVerifier,
}

impl PermitWorkflow {
    /// Workflow over `services`
    pub fn new(services: Services) -> Self {
        let checkpoint = CheckpointVerifier::new(services.verifications.clone());
        Self {
            services,
            checkpoint,
        }
    }

    /// Issue a permit against an approved, unexpired clearance
    #[instrument(skip_all, fields(clearance_id = %request.clearance_id, officer_id = %request.issued_by))]
    pub async fn create(&self, request: CreatePermit) -> DomainResult<PermitView> {
        let officer = self
            .services
            .acting_officer(
                &request.issued_by,
                "issue movement permits",
                &[OfficerRole::ExtensionOfficer],
            )
            .await?;
        request.from_location.validate("from_location")?;
        request.to_location.validate("to_location")?;
        if request.valid_until < request.valid_from {
            return Err(DomainError::rule(format!(
                "valid_until {} is before valid_from {}",
                request.valid_until, request.valid_from
            )));
        }

        let today = self.services.clock.today();
        let clearance = self.services.clearances.get(&request.clearance_id).await?;
        if clearance.status != ClearanceStatus::Approved {
            return Err(DomainError::rule(format!(
                "clearance {} must be APPROVED, but is {}",
                clearance.clearance_number,
                clearance.status.name()
            )));
        }
        if !clearance.is_valid(today) {
            return Err(DomainError::rule(format!(
                "clearance {} expired on {}",
                clearance.clearance_number,
                clearance
                    .expiry_date
                    .map(|d| d.to_string())
                    .unwrap_or_default()
            )));
        }
        if clearance.livestock_id != request.livestock_id {
            return Err(DomainError::rule(format!(
                "clearance {} does not cover the requested livestock",
                clearance.clearance_number
            )));
        }

        let livestock = self.services.livestock.get(&request.livestock_id).await?;
        if livestock.stolen {
            warn!(tag_code = %livestock.tag_code, "permit requested for stolen livestock");
            return Err(DomainError::rule(format!(
                "livestock {} is reported stolen",
                livestock.tag_code
            )));
        }
        if !livestock.is_owned_by(&clearance.owner_id) {
            return Err(DomainError::rule(format!(
                "clearance {} was issued to a previous owner of livestock {}",
                clearance.clearance_number, livestock.tag_code
            )));
        }

        let number = self
            .services
            .numbers
            .next_permit_number(today.year())
            .await?;
        let mut permit = MovementPermit::issued(
            number,
            clearance.id,
            livestock.id,
            livestock.owner_id,
            request.from_location,
            request.to_location,
            request.valid_from,
            request.valid_until,
            officer.id,
            self.services.clock.now(),
        );
        if let Some(purpose) = request.purpose {
            permit.purpose = purpose.trim().to_string();
        }
        if let Some(mode) = request.transport_mode {
            permit.transport_mode = mode;
        }
        permit.vehicle_registration = request.vehicle_registration;

        let qr_ref = QrPayload::for_permit(&permit, &livestock.tag_code)
            .store(self.services.storage.as_ref())
            .await?;
        permit.qr_code_ref = Some(qr_ref.clone());

        let stored = match self.services.permits.insert(&permit).await {
            Ok(stored) => stored,
            Err(err) => {
                self.services.discard_object(&qr_ref).await;
                return Err(err);
            }
        };
        info!(
            permit_id = %stored.id,
            permit_number = %stored.permit_number,
            to = stored.status.name(),
            "permit issued"
        );

        self.services
            .publish(vec![LivestockEvent::PermitIssued {
                permit_id: stored.id,
                permit_number: stored.permit_number.clone(),
                clearance_id: stored.clearance_id,
                livestock_id: stored.livestock_id,
            }])
            .await;
        Ok(self.view(stored))
    }

    /// Record a checkpoint scan.
    ///
    /// The first scan of an `APPROVED` permit moves it to `IN_TRANSIT`.
    /// The outcome is judged on the permit as it stood before the scan.
    #[instrument(skip_all, fields(permit_id = %permit_id, officer_id = %officer_id))]
    pub async fn verify(
        &self,
        permit_id: PermitId,
        officer_id: OfficerId,
        coordinates: Option<Coordinates>,
        notes: Option<String>,
    ) -> DomainResult<VerificationReport> {
        let officer = self
            .services
            .acting_officer(&officer_id, "verify movement permits", &[])
            .await?;
        if let Some(coordinates) = &coordinates {
            coordinates.validate()?;
        }

        let scanned = self.services.permits.get(&permit_id).await?;
        let livestock = self.services.livestock.get(&scanned.livestock_id).await?;
        let now = self.services.clock.now();

        let (permit, movement_started) = self.start_transit_on_first_scan(scanned.clone(), now).await?;

        let verification = match self
            .checkpoint
            .record(
                &scanned,
                &livestock,
                officer.id,
                now,
                coordinates,
                notes.filter(|n| !n.trim().is_empty()),
            )
            .await
        {
            Ok(verification) => verification,
            Err(err) => {
                if movement_started {
                    self.undo_transit(&permit).await;
                }
                return Err(err);
            }
        };

        let mut events = Vec::new();
        if movement_started {
            info!(
                permit_number = %permit.permit_number,
                from = PermitStatus::Approved.name(),
                to = permit.status.name(),
                "movement started"
            );
            events.push(LivestockEvent::PermitMovementStarted { permit_id });
        }
        if verification.flag_reason.as_deref() == Some(STOLEN_LIVESTOCK_ALERT) {
            warn!(
                permit_number = %permit.permit_number,
                tag_code = %livestock.tag_code,
                "stolen livestock presented at checkpoint"
            );
            events.push(LivestockEvent::StolenLivestockAlert {
                permit_id,
                livestock_id: livestock.id,
                verified_by: officer.id,
            });
        }
        events.push(LivestockEvent::PermitVerified {
            permit_id,
            verification_id: verification.id,
            valid: verification.valid,
            flag_reason: verification.flag_reason.clone(),
        });
        self.services.publish(events).await;

        Ok(VerificationReport {
            verification,
            permit: self.view(permit),
        })
    }

    /// Advance `APPROVED -> IN_TRANSIT`, tolerating a concurrent first scan
    async fn start_transit_on_first_scan(
        &self,
        mut permit: MovementPermit,
        now: chrono::DateTime<chrono::Utc>,
    ) -> DomainResult<(MovementPermit, bool)> {
        let mut attempts = 0;
        while permit.status == PermitStatus::Approved {
            let mut moving = permit.clone();
            moving.start_transit(now)?;
            match self.services.permits.save(&moving).await {
                Ok(saved) => return Ok((saved, true)),
                Err(err) if err.is_concurrency_error() && attempts < self.services.config.max_write_retries => {
                    attempts += 1;
                    permit = self.services.permits.get(&permit.id).await?;
                }
                Err(err) => return Err(err),
            }
        }
        Ok((permit, false))
    }

    /// Put a permit whose scan could not be recorded back to `APPROVED`
    async fn undo_transit(&self, moving: &MovementPermit) {
        let mut approved = moving.clone();
        approved.status = PermitStatus::Approved;
        approved.movement_started_at = None;
        if let Err(err) = self.services.permits.save(&approved).await {
            error!(
                %err,
                permit_id = %moving.id,
                "failed to restore permit after checkpoint scan was lost"
            );
        }
    }

    /// Record arrival
    #[instrument(skip_all, fields(permit_id = %permit_id))]
    pub async fn complete(
        &self,
        permit_id: PermitId,
        coordinates: Option<Coordinates>,
    ) -> DomainResult<PermitView> {
        if let Some(coordinates) = &coordinates {
            coordinates.validate()?;
        }
        let mut permit = self.services.permits.get(&permit_id).await?;
        let from = permit.status;
        permit.complete(self.services.clock.now(), coordinates)?;

        let saved = self.services.permits.save(&permit).await?;
        info!(
            permit_number = %saved.permit_number,
            from = from.name(),
            to = saved.status.name(),
            "permit completed"
        );

        self.services
            .publish(vec![LivestockEvent::PermitCompleted { permit_id }])
            .await;
        Ok(self.view(saved))
    }

    /// Withdraw a permit
    #[instrument(skip_all, fields(permit_id = %permit_id))]
    pub async fn cancel(&self, permit_id: PermitId, reason: &str) -> DomainResult<PermitView> {
        let reason = required_text("reason", reason)?;
        let mut permit = self.services.permits.get(&permit_id).await?;
        let from = permit.status;
        permit.cancel(reason.clone(), self.services.clock.now())?;

        let saved = self.services.permits.save(&permit).await?;
        info!(
            permit_number = %saved.permit_number,
            from = from.name(),
            to = saved.status.name(),
            "permit cancelled"
        );

        self.services
            .publish(vec![LivestockEvent::PermitCancelled {
                permit_id,
                previous_status: from,
                reason,
            }])
            .await;
        Ok(self.view(saved))
    }

    /// Load by ID
    pub async fn get(&self, permit_id: &PermitId) -> DomainResult<PermitView> {
        Ok(self.view(self.services.permits.get(permit_id).await?))
    }

    /// Load by permit number
    pub async fn find_by_number(&self, number: &str) -> DomainResult<Option<PermitView>> {
        Ok(self
            .services
            .permits
            .find_by_natural_key(number.trim())
            .await?
            .map(|p| self.view(p)))
    }

    /// Every permit issued for an animal, oldest first
    pub async fn list_for_livestock(&self, livestock_id: &LivestockId) -> DomainResult<Vec<PermitView>> {
        let livestock_id = *livestock_id;
        Ok(self
            .services
            .permits
            .find(&move |p: &MovementPermit| p.livestock_id == livestock_id)
            .await?
            .into_iter()
            .map(|p| self.view(p))
            .collect())
    }

    /// Checkpoint scans of a permit, oldest first
    pub async fn verifications(&self, permit_id: &PermitId) -> DomainResult<Vec<PermitVerification>> {
        self.services.permits.get(permit_id).await?;
        self.checkpoint.history(permit_id).await
    }

    fn view(&self, permit: MovementPermit) -> PermitView {
        let today = self.services.clock.today();
        PermitView {
            effective_status: permit.effective_status(today),
            valid: permit.is_valid(today),
            permit,
        }
    }
}
