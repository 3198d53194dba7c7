// Copyright 2025 Cowboy AI, LLC.

//! Workflows owning the document lifecycles
//!
//! Every operation runs as one unit of work: load, check the transition
//! against the status table, perform external side effects, then save with a
//! version check. Side effects created for a call that fails to save are
//! removed again. Events are published only after the save succeeded.

mod checkpoint;
mod clearance;
mod livestock;
mod permit;
mod transfer;

pub use checkpoint::CheckpointVerifier;
pub use clearance::{ClearanceView, ClearanceWorkflow, CreateClearance};
pub use livestock::{LivestockRegistry, RegisterLivestock};
pub use permit::{CreatePermit, PermitView, PermitWorkflow, VerificationReport};
pub use transfer::{InitiateTransfer, OwnerMatch, OwnershipTransferWorkflow};

use crate::clock::{Clock, SystemClock};
use crate::config::WorkflowConfig;
use crate::domain::{Livestock, MovementPermit, Officer, OfficerRole, OwnershipTransfer, PoliceClearance};
use crate::entity::OfficerId;
use crate::errors::DomainResult;
use crate::events::{EventPublisher, InMemoryEventPublisher, LivestockEvent};
use crate::numbering::DocumentNumberGenerator;
use crate::persistence::{
    InMemoryRepository, InMemorySequenceStore, InMemoryVerificationLog, Repository, VerificationLog,
};
use crate::services::{
    BiometricMatcher, ExactTemplateMatcher, IdentityDirectory, InMemoryDirectory,
    InMemoryObjectStorage, ObjectStorage,
};
use std::sync::Arc;
use tracing::error;

/// Handles every workflow needs
#[derive(Clone)]
pub struct Services {
    /// Livestock registry storage
    pub livestock: Arc<dyn Repository<Livestock>>,
    /// Clearance storage
    pub clearances: Arc<dyn Repository<PoliceClearance>>,
    /// Permit storage
    pub permits: Arc<dyn Repository<MovementPermit>>,
    /// Transfer storage
    pub transfers: Arc<dyn Repository<OwnershipTransfer>>,
    /// Checkpoint scan audit trail
    pub verifications: Arc<dyn VerificationLog>,
    /// Document numbers
    pub numbers: DocumentNumberGenerator,
    /// Officers and owners
    pub directory: Arc<dyn IdentityDirectory>,
    /// QR payloads and fingerprint probes
    pub storage: Arc<dyn ObjectStorage>,
    /// Fingerprint matching
    pub biometrics: Arc<dyn BiometricMatcher>,
    /// Event sink
    pub events: Arc<dyn EventPublisher>,
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Tunables
    pub config: WorkflowConfig,
}

impl Services {
    /// Resolve an officer and check they may perform `action`
    pub(crate) async fn acting_officer(
        &self,
        officer_id: &OfficerId,
        action: &str,
        roles: &[OfficerRole],
    ) -> DomainResult<Officer> {
        let officer = self.directory.get_officer(officer_id).await?;
        officer.ensure_may(action, roles)?;
        Ok(officer)
    }

    /// Publish after commit; failures are logged, never returned
    pub(crate) async fn publish(&self, events: Vec<LivestockEvent>) {
        if events.is_empty() {
            return;
        }
        let count = events.len();
        if let Err(err) = self.events.publish(events).await {
            error!(%err, count, "failed to publish events for a committed transition");
        }
    }

    /// Remove an object stored for a unit of work that did not commit
    pub(crate) async fn discard_object(&self, reference: &str) {
        if let Err(err) = self.storage.delete(reference).await {
            error!(%err, reference, "compensating delete failed; object is orphaned");
        }
    }
}

/// Fully in-memory wiring with typed handles for inspection
pub struct InMemoryBackend {
    /// Identity directory
    pub directory: Arc<InMemoryDirectory>,
    /// Object storage
    pub storage: Arc<InMemoryObjectStorage>,
    /// Event publisher
    pub events: Arc<InMemoryEventPublisher>,
    /// Verification log
    pub verifications: Arc<InMemoryVerificationLog>,
    /// Services wired to the handles above
    pub services: Services,
}

impl InMemoryBackend {
    /// In-memory backend on the wall clock
    pub fn new(config: WorkflowConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// In-memory backend on a supplied clock
    pub fn with_clock(config: WorkflowConfig, clock: Arc<dyn Clock>) -> Self {
        let directory = Arc::new(InMemoryDirectory::new());
        let storage = Arc::new(InMemoryObjectStorage::new());
        let events = Arc::new(InMemoryEventPublisher::new());
        let verifications = Arc::new(InMemoryVerificationLog::new());

        let services = Services {
            livestock: Arc::new(InMemoryRepository::<Livestock>::new()),
            clearances: Arc::new(InMemoryRepository::<PoliceClearance>::new()),
            permits: Arc::new(InMemoryRepository::<MovementPermit>::new()),
            transfers: Arc::new(InMemoryRepository::<OwnershipTransfer>::new()),
            verifications: verifications.clone(),
            numbers: DocumentNumberGenerator::new(Arc::new(InMemorySequenceStore::new())),
            directory: directory.clone(),
            storage: storage.clone(),
            biometrics: Arc::new(ExactTemplateMatcher),
            events: events.clone(),
            clock,
            config,
        };

        Self {
            directory,
            storage,
            events,
            verifications,
            services,
        }
    }

    /// Replace the fingerprint matcher
    pub fn with_matcher(mut self, matcher: Arc<dyn BiometricMatcher>) -> Self {
        self.services.biometrics = matcher;
        self
    }

    /// Livestock registry over these services
    pub fn registry(&self) -> LivestockRegistry {
        LivestockRegistry::new(self.services.clone())
    }

    /// Clearance workflow over these services
    pub fn clearances(&self) -> ClearanceWorkflow {
        ClearanceWorkflow::new(self.services.clone())
    }

    /// Permit workflow over these services
    pub fn permits(&self) -> PermitWorkflow {
        PermitWorkflow::new(self.services.clone())
    }

    /// Transfer workflow over these services
    pub fn transfers(&self) -> OwnershipTransferWorkflow {
        OwnershipTransferWorkflow::new(self.services.clone())
    }
}

/// Reject blank free-text input
pub(crate) fn required_text(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(crate::errors::DomainError::validation(field, "must not be empty"));
    }
    Ok(value.to_string())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::clock::FixedClock;
    use crate::domain::Owner;
    use chrono::{TimeZone, Utc};

    pub(crate) struct World {
        pub backend: InMemoryBackend,
        pub clock: Arc<FixedClock>,
        pub police: Officer,
        pub extension: Officer,
        pub owner: Owner,
        pub buyer: Owner,
        pub cow: Livestock,
    }

    pub(crate) async fn world() -> World {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 4, 10, 8, 0, 0).unwrap(),
        ));
        let backend = InMemoryBackend::with_clock(WorkflowConfig::default(), clock.clone());

        let police = backend
            .directory
            .add_officer(Officer::new("E. Amupolo", "NAMPOL-11", OfficerRole::Police).in_province("KW"))
            .await;
        let extension = backend
            .directory
            .add_officer(Officer::new("P. Tjiueza", "EXT-4", OfficerRole::ExtensionOfficer))
            .await;
        let owner = backend
            .directory
            .add_owner(Owner::new("S. Hamutenya", "70020200456"))
            .await
            .unwrap();
        let buyer = backend
            .directory
            .add_owner(Owner::new("R. Kavari", "85030300789"))
            .await
            .unwrap();

        let cow = backend
            .registry()
            .register(RegisterLivestock::new("NA-KW-0001", owner.id, "cattle"))
            .await
            .unwrap();

        World {
            backend,
            clock,
            police,
            extension,
            owner,
            buyer,
            cow,
        }
    }
}
