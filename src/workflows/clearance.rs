// Copyright 2025 Cowboy AI, LLC.

//! Police clearance workflow

use super::{required_text, Services};
use crate::domain::{ClearanceStatus, Coordinates, OfficerRole, PoliceClearance};
use crate::entity::{ClearanceId, LivestockId, OfficerId, OwnerId};
use crate::errors::{DomainError, DomainResult};
use crate::events::LivestockEvent;
use crate::numbering::validate_province_code;
use crate::services::QrPayload;
use crate::state_machine::State;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Clearance request
#[derive(Debug, Clone, PartialEq)]
pub struct CreateClearance {
    /// Animal to clear
    pub livestock_id: LivestockId,
    /// Claimed owner; must be the owner of record
    pub owner_id: OwnerId,
    /// Officer taking the request
    pub issued_by: OfficerId,
    /// Where the request was taken
    pub coordinates: Option<Coordinates>,
    /// Province whose sequence numbers the clearance
    pub province_code: Option<String>,
    /// Free-form remarks
    pub notes: Option<String>,
}

impl CreateClearance {
    /// Request without location, province or notes
    pub fn new(livestock_id: LivestockId, owner_id: OwnerId, issued_by: OfficerId) -> Self {
        Self {
            livestock_id,
            owner_id,
            issued_by,
            coordinates: None,
            province_code: None,
            notes: None,
        }
    }
}

/// Clearance as read by callers, with validity applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearanceView {
    /// Stored clearance
    #[serde(flatten)]
    pub clearance: PoliceClearance,
    /// Status with expiry applied
    pub effective_status: ClearanceStatus,
    /// `APPROVED` and not past the expiry date
    pub valid: bool,
}

/// Owns the lifecycle of police clearances
#[derive(Clone)]
pub struct ClearanceWorkflow {
    services: Services,
}

impl ClearanceWorkflow {
    /// Workflow over `services`
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// Record a clearance request in `PENDING`
    #[instrument(skip_all, fields(livestock_id = %request.livestock_id, officer_id = %request.issued_by))]
    pub async fn create(&self, request: CreateClearance) -> DomainResult<PoliceClearance> {
        let officer = self
            .services
            .acting_officer(&request.issued_by, "issue police clearances", &[OfficerRole::Police])
            .await?;
        if let Some(coordinates) = &request.coordinates {
            coordinates.validate()?;
        }

        let livestock = self.services.livestock.get(&request.livestock_id).await?;
        if livestock.stolen {
            warn!(tag_code = %livestock.tag_code, "clearance requested for stolen livestock");
            return Err(DomainError::rule(format!(
                "livestock {} is reported stolen",
                livestock.tag_code
            )));
        }
        let owner = self.services.directory.get_owner(&request.owner_id).await?;
        if !livestock.is_owned_by(&owner.id) {
            return Err(DomainError::rule(format!(
                "{} is not the current owner of livestock {}",
                owner.full_name, livestock.tag_code
            )));
        }

        let province_code = validate_province_code(
            request
                .province_code
                .as_deref()
                .or(officer.province_code.as_deref())
                .unwrap_or(&self.services.config.default_province_code),
        )?;
        let number = self
            .services
            .numbers
            .next_clearance_number(&province_code)
            .await?;

        let mut clearance = PoliceClearance::pending(
            number,
            livestock.id,
            owner.id,
            officer.id,
            province_code,
            self.services.clock.now(),
        );
        clearance.issued_at = request.coordinates;
        clearance.notes = request.notes.filter(|n| !n.trim().is_empty());

        let stored = self.services.clearances.insert(&clearance).await?;
        info!(
            clearance_id = %stored.id,
            clearance_number = %stored.clearance_number,
            "clearance requested"
        );

        self.services
            .publish(vec![LivestockEvent::ClearanceRequested {
                clearance_id: stored.id,
                clearance_number: stored.clearance_number.clone(),
                livestock_id: stored.livestock_id,
                issued_by: stored.issued_by,
            }])
            .await;
        Ok(stored)
    }

    /// Approve a pending clearance and attach its QR payload
    #[instrument(skip_all, fields(clearance_id = %clearance_id, officer_id = %officer_id))]
    pub async fn approve(
        &self,
        clearance_id: ClearanceId,
        officer_id: OfficerId,
    ) -> DomainResult<ClearanceView> {
        let officer = self
            .services
            .acting_officer(&officer_id, "approve police clearances", &[OfficerRole::Police])
            .await?;
        let mut clearance = self.services.clearances.get(&clearance_id).await?;
        let from = clearance.status;
        let livestock = self.services.livestock.get(&clearance.livestock_id).await?;
        let now = self.services.clock.now();
        clearance.approve(
            officer.id,
            now,
            self.services.config.clearance_validity_days,
            None,
        )?;

        let qr_ref = QrPayload::for_clearance(&clearance, &livestock.tag_code)?
            .store(self.services.storage.as_ref())
            .await?;
        clearance.qr_code_ref = Some(qr_ref.clone());

        let saved = match self.services.clearances.save(&clearance).await {
            Ok(saved) => saved,
            Err(err) => {
                self.services.discard_object(&qr_ref).await;
                return Err(err);
            }
        };
        info!(
            clearance_number = %saved.clearance_number,
            from = from.name(),
            to = saved.status.name(),
            expiry_date = ?saved.expiry_date,
            "clearance approved"
        );

        if let Some(expiry_date) = saved.expiry_date {
            self.services
                .publish(vec![LivestockEvent::ClearanceApproved {
                    clearance_id,
                    approved_by: officer.id,
                    expiry_date,
                }])
                .await;
        }
        Ok(self.view(saved))
    }

    /// Refuse a pending clearance
    #[instrument(skip_all, fields(clearance_id = %clearance_id, officer_id = %officer_id))]
    pub async fn reject(
        &self,
        clearance_id: ClearanceId,
        officer_id: OfficerId,
        reason: &str,
    ) -> DomainResult<ClearanceView> {
        let reason = required_text("reason", reason)?;
        self.services
            .acting_officer(&officer_id, "reject police clearances", &[OfficerRole::Police])
            .await?;
        let mut clearance = self.services.clearances.get(&clearance_id).await?;
        let from = clearance.status;
        clearance.reject(reason.clone(), self.services.clock.now())?;

        let saved = self.services.clearances.save(&clearance).await?;
        info!(
            clearance_number = %saved.clearance_number,
            from = from.name(),
            to = saved.status.name(),
            "clearance rejected"
        );

        self.services
            .publish(vec![LivestockEvent::ClearanceRejected {
                clearance_id,
                reason,
            }])
            .await;
        Ok(self.view(saved))
    }

    /// Load by ID
    pub async fn get(&self, clearance_id: &ClearanceId) -> DomainResult<ClearanceView> {
        Ok(self.view(self.services.clearances.get(clearance_id).await?))
    }

    /// Load by clearance number
    pub async fn find_by_number(&self, number: &str) -> DomainResult<Option<ClearanceView>> {
        Ok(self
            .services
            .clearances
            .find_by_natural_key(number.trim())
            .await?
            .map(|c| self.view(c)))
    }

    /// Every clearance ever requested for an animal, oldest first
    pub async fn list_for_livestock(
        &self,
        livestock_id: &LivestockId,
    ) -> DomainResult<Vec<ClearanceView>> {
        let livestock_id = *livestock_id;
        Ok(self
            .services
            .clearances
            .find(&move |c: &PoliceClearance| c.livestock_id == livestock_id)
            .await?
            .into_iter()
            .map(|c| self.view(c))
            .collect())
    }

    fn view(&self, clearance: PoliceClearance) -> ClearanceView {
        let today = self.services.clock.today();
        ClearanceView {
            effective_status: clearance.effective_status(today),
            valid: clearance.is_valid(today),
            clearance,
        }
    }
}
