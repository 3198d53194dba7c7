// Copyright 2025 Cowboy AI, LLC.

//! Ownership transfer workflow
//!
//! Completion is the only path that changes a livestock's owner of record.
//! It claims the transfer first, then moves the owner; if the livestock write
//! cannot be made the claim is released again.

use super::{required_text, Services};
use crate::domain::{ConfirmingParty, Livestock, OwnershipTransfer, TransferInput, TransferStatus};
use crate::entity::{AggregateRoot, LivestockId, OfficerId, OwnerId, TransferId};
use crate::errors::{DomainError, DomainResult};
use crate::events::LivestockEvent;
use crate::services::BiometricCandidate;
use crate::state_machine::{MealyStateTransitions, State};
use bytes::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{error, info, instrument, warn};

const FINGERPRINT_CONTENT_TYPE: &str = "application/octet-stream";

/// Transfer request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiateTransfer {
    /// Animal changing hands
    pub livestock_id: LivestockId,
    /// Receiving owner
    pub to_owner_id: OwnerId,
    /// Officer opening the transfer
    pub initiated_by: OfficerId,
    /// Sale, inheritance, gift, ...
    pub reason: Option<String>,
    /// Agreed handover date; today when absent
    pub transfer_date: Option<NaiveDate>,
}

impl InitiateTransfer {
    /// Request without reason or date
    pub fn new(livestock_id: LivestockId, to_owner_id: OwnerId, initiated_by: OfficerId) -> Self {
        Self {
            livestock_id,
            to_owner_id,
            initiated_by,
            reason: None,
            transfer_date: None,
        }
    }
}

/// Owner identified from a fingerprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerMatch {
    /// Matching owner
    pub owner_id: OwnerId,
    /// Matcher score
    pub score: f64,
}

/// Owns the two-party ownership transfer protocol
#[derive(Clone)]
pub struct OwnershipTransferWorkflow {
    services: Services,
}

impl OwnershipTransferWorkflow {
    /// Workflow over `services`
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// Open a transfer from the current owner of record to `to_owner_id`
    #[instrument(skip_all, fields(livestock_id = %request.livestock_id, officer_id = %request.initiated_by))]
    pub async fn initiate(&self, request: InitiateTransfer) -> DomainResult<OwnershipTransfer> {
        let officer = self
            .services
            .acting_officer(&request.initiated_by, "initiate ownership transfers", &[])
            .await?;
        let livestock = self.services.livestock.get(&request.livestock_id).await?;
        let to_owner = self.services.directory.get_owner(&request.to_owner_id).await?;
        if livestock.is_owned_by(&to_owner.id) {
            return Err(DomainError::rule(format!(
                "{} already owns livestock {}",
                to_owner.full_name, livestock.tag_code
            )));
        }
        if livestock.stolen {
            warn!(tag_code = %livestock.tag_code, "transfer requested for stolen livestock");
            return Err(DomainError::rule(format!(
                "livestock {} is reported stolen",
                livestock.tag_code
            )));
        }

        let now = self.services.clock.now();
        let mut transfer = OwnershipTransfer::pending(
            livestock.id,
            livestock.owner_id,
            to_owner.id,
            officer.id,
            request.transfer_date.unwrap_or_else(|| now.date_naive()),
            now,
        );
        transfer.reason = request.reason.filter(|r| !r.trim().is_empty());

        let livestock_id = livestock.id;
        let stored = self
            .services
            .transfers
            .insert_unless(&transfer, &move |t: &OwnershipTransfer| {
                t.livestock_id == livestock_id && t.status == TransferStatus::Pending
            })
            .await
            .map_err(|err| match err {
                DomainError::AlreadyExists(_) => DomainError::rule(format!(
                    "livestock {} already has a pending transfer",
                    livestock.tag_code
                )),
                other => other,
            })?;
        info!(
            transfer_id = %stored.id,
            from_owner_id = %stored.from_owner_id,
            to_owner_id = %stored.to_owner_id,
            "transfer initiated"
        );

        self.services
            .publish(vec![LivestockEvent::TransferInitiated {
                transfer_id: stored.id,
                livestock_id: stored.livestock_id,
                from_owner_id: stored.from_owner_id,
                to_owner_id: stored.to_owner_id,
            }])
            .await;
        Ok(stored)
    }

    /// Confirmation by the owner giving up the animal
    pub async fn confirm_by_current_owner(
        &self,
        transfer_id: TransferId,
        fingerprint: Option<Bytes>,
    ) -> DomainResult<OwnershipTransfer> {
        self.confirm(transfer_id, ConfirmingParty::CurrentOwner, fingerprint)
            .await
    }

    /// Confirmation by the owner receiving the animal
    pub async fn confirm_by_new_owner(
        &self,
        transfer_id: TransferId,
        fingerprint: Option<Bytes>,
    ) -> DomainResult<OwnershipTransfer> {
        self.confirm(transfer_id, ConfirmingParty::NewOwner, fingerprint)
            .await
    }

    /// Set one party's confirmation flag.
    ///
    /// Confirming an already confirmed side returns the transfer unchanged.
    /// Confirmations of the two sides commute, so a version conflict caused
    /// by the other side is retried on the reloaded transfer.
    #[instrument(skip_all, fields(transfer_id = %transfer_id, side = party.name()))]
    pub async fn confirm(
        &self,
        transfer_id: TransferId,
        party: ConfirmingParty,
        fingerprint: Option<Bytes>,
    ) -> DomainResult<OwnershipTransfer> {
        let mut transfer = self.services.transfers.get(&transfer_id).await?;
        if transfer.status == TransferStatus::Pending && transfer.has_confirmed(party) {
            return Ok(transfer);
        }
        transfer.status.apply(&TransferInput::Confirm(party))?;

        let fingerprint_ref = match fingerprint {
            Some(probe) => Some(self.store_verified_probe(&transfer, party, probe).await?),
            None => None,
        };

        let mut attempts = 0;
        let (saved, completed_pair) = loop {
            let mut next = transfer.clone();
            let now = self.services.clock.now();
            let completed_pair = match next.confirm(party, fingerprint_ref.clone(), now) {
                Ok(completed) => completed,
                Err(err) => {
                    self.discard_probe(fingerprint_ref.as_deref()).await;
                    return Err(err);
                }
            };
            match self.services.transfers.save(&next).await {
                Ok(saved) => break (saved, completed_pair),
                Err(err)
                    if err.is_concurrency_error()
                        && attempts < self.services.config.max_write_retries =>
                {
                    attempts += 1;
                    transfer = self.services.transfers.get(&transfer_id).await?;
                    if transfer.has_confirmed(party) {
                        self.discard_probe(fingerprint_ref.as_deref()).await;
                        return Ok(transfer);
                    }
                }
                Err(err) => {
                    self.discard_probe(fingerprint_ref.as_deref()).await;
                    return Err(err);
                }
            }
        };

        info!(
            side = party.name(),
            status = saved.status.name(),
            with_fingerprint = fingerprint_ref.is_some(),
            "transfer confirmed"
        );
        let mut events = vec![LivestockEvent::TransferConfirmed {
            transfer_id,
            side: party,
            with_fingerprint: fingerprint_ref.is_some(),
        }];
        if completed_pair {
            info!(
                from = TransferStatus::Pending.name(),
                to = saved.status.name(),
                "both parties confirmed"
            );
            events.push(LivestockEvent::TransferFullyConfirmed { transfer_id });
        }
        self.services.publish(events).await;
        Ok(saved)
    }

    /// Store a fingerprint probe, checking it against the enrolled template
    async fn store_verified_probe(
        &self,
        transfer: &OwnershipTransfer,
        party: ConfirmingParty,
        probe: Bytes,
    ) -> DomainResult<String> {
        if probe.is_empty() {
            return Err(DomainError::validation("fingerprint", "must not be empty"));
        }
        let owner = self
            .services
            .directory
            .get_owner(&transfer.party_owner(party))
            .await?;
        let reference = self
            .services
            .storage
            .put(FINGERPRINT_CONTENT_TYPE, probe.clone())
            .await?;

        let Some(template_ref) = owner.fingerprint_template_ref.as_deref() else {
            return Ok(reference);
        };
        let verdict = match self.services.storage.get(template_ref).await {
            Ok(template) => self.services.biometrics.score(&probe, &template),
            Err(err) => Err(err),
        };
        match verdict {
            Ok(score) if score >= self.services.biometrics.match_threshold() => Ok(reference),
            Ok(score) => {
                warn!(side = party.name(), score, "fingerprint does not match enrolled template");
                self.services.discard_object(&reference).await;
                Err(DomainError::rule(format!(
                    "fingerprint does not match the enrolled template of the {}",
                    party.name()
                )))
            }
            Err(err) => {
                self.services.discard_object(&reference).await;
                Err(err)
            }
        }
    }

    async fn discard_probe(&self, reference: Option<&str>) {
        if let Some(reference) = reference {
            self.services.discard_object(reference).await;
        }
    }

    /// Hand the animal over to the new owner
    #[instrument(skip_all, fields(transfer_id = %transfer_id, officer_id = %officer_id))]
    pub async fn complete(
        &self,
        transfer_id: TransferId,
        officer_id: OfficerId,
    ) -> DomainResult<OwnershipTransfer> {
        let officer = self
            .services
            .acting_officer(&officer_id, "complete ownership transfers", &[])
            .await?;
        let confirmed = self.services.transfers.get(&transfer_id).await?;
        let mut transfer = confirmed.clone();
        transfer.complete(officer.id, self.services.clock.now())?;

        let livestock = self.services.livestock.get(&transfer.livestock_id).await?;
        if !livestock.is_owned_by(&transfer.from_owner_id) {
            return Err(DomainError::rule(format!(
                "owner of record of livestock {} changed since the transfer was initiated",
                livestock.tag_code
            )));
        }

        let claimed = self.services.transfers.save(&transfer).await?;
        if let Err(err) = self.move_owner(livestock, &claimed).await {
            self.release_claim(confirmed, &claimed).await;
            return Err(err);
        }
        info!(
            livestock_id = %claimed.livestock_id,
            new_owner_id = %claimed.to_owner_id,
            from = TransferStatus::Confirmed.name(),
            to = claimed.status.name(),
            "transfer completed"
        );

        self.services
            .publish(vec![LivestockEvent::TransferCompleted {
                transfer_id,
                livestock_id: claimed.livestock_id,
                new_owner_id: claimed.to_owner_id,
            }])
            .await;
        Ok(claimed)
    }

    async fn move_owner(&self, mut livestock: Livestock, transfer: &OwnershipTransfer) -> DomainResult<Livestock> {
        let mut attempts = 0;
        loop {
            if !livestock.is_owned_by(&transfer.from_owner_id) {
                return Err(DomainError::rule(format!(
                    "owner of record of livestock {} changed during the transfer",
                    livestock.tag_code
                )));
            }
            livestock.change_owner(transfer.to_owner_id);
            match self.services.livestock.save(&livestock).await {
                Ok(saved) => return Ok(saved),
                Err(err)
                    if err.is_concurrency_error()
                        && attempts < self.services.config.max_write_retries =>
                {
                    attempts += 1;
                    livestock = self.services.livestock.get(&transfer.livestock_id).await?;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Put a claimed transfer back to `CONFIRMED`
    async fn release_claim(&self, mut confirmed: OwnershipTransfer, claimed: &OwnershipTransfer) {
        confirmed.set_version(claimed.version());
        if let Err(err) = self.services.transfers.save(&confirmed).await {
            error!(
                %err,
                transfer_id = %claimed.id,
                "failed to release transfer claim after livestock update failed"
            );
        }
    }

    /// Abandon a transfer
    #[instrument(skip_all, fields(transfer_id = %transfer_id, officer_id = %officer_id))]
    pub async fn cancel(
        &self,
        transfer_id: TransferId,
        officer_id: OfficerId,
        reason: &str,
    ) -> DomainResult<OwnershipTransfer> {
        let reason = required_text("reason", reason)?;
        let officer = self
            .services
            .acting_officer(&officer_id, "cancel ownership transfers", &[])
            .await?;
        let mut transfer = self.services.transfers.get(&transfer_id).await?;
        let from = transfer.status;
        transfer.cancel(officer.id, reason.clone(), self.services.clock.now())?;

        let saved = self.services.transfers.save(&transfer).await?;
        info!(from = from.name(), to = saved.status.name(), "transfer cancelled");

        self.services
            .publish(vec![LivestockEvent::TransferCancelled {
                transfer_id,
                reason,
            }])
            .await;
        Ok(saved)
    }

    /// Best fingerprint match among candidate owners with enrolled templates
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub async fn identify_owner(
        &self,
        probe: &[u8],
        candidates: &[OwnerId],
    ) -> DomainResult<Option<OwnerMatch>> {
        let mut owners_by_template = HashMap::new();
        let mut enrolled = Vec::new();
        for owner_id in candidates {
            let owner = self.services.directory.get_owner(owner_id).await?;
            if let Some(template_ref) = owner.fingerprint_template_ref {
                let template = self.services.storage.get(&template_ref).await?;
                owners_by_template.insert(template_ref.clone(), owner.id);
                enrolled.push(BiometricCandidate {
                    reference: template_ref,
                    template,
                });
            }
        }

        Ok(self
            .services
            .biometrics
            .identify_best(probe, &enrolled)?
            .and_then(|best| {
                owners_by_template
                    .get(&best.reference)
                    .map(|owner_id| OwnerMatch {
                        owner_id: *owner_id,
                        score: best.score,
                    })
            }))
    }

    /// Load by ID
    pub async fn get(&self, transfer_id: &TransferId) -> DomainResult<OwnershipTransfer> {
        self.services.transfers.get(transfer_id).await
    }

    /// Every transfer of an animal, oldest first
    pub async fn list_for_livestock(
        &self,
        livestock_id: &LivestockId,
    ) -> DomainResult<Vec<OwnershipTransfer>> {
        let livestock_id = *livestock_id;
        self.services
            .transfers
            .find(&move |t: &OwnershipTransfer| t.livestock_id == livestock_id)
            .await
    }

    /// The open transfer of an animal, if any
    pub async fn pending_for_livestock(
        &self,
        livestock_id: &LivestockId,
    ) -> DomainResult<Option<OwnershipTransfer>> {
        let livestock_id = *livestock_id;
        Ok(self
            .services
            .transfers
            .find(&move |t: &OwnershipTransfer| {
                t.livestock_id == livestock_id && t.status == TransferStatus::Pending
            })
            .await?
            .into_iter()
            .next())
    }
}
