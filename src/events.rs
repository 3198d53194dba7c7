// Copyright 2025 Cowboy AI, LLC.

//! Domain events emitted by the workflows
//!
//! Every accepted transition produces one [`LivestockEvent`], published after
//! the unit of work has been committed.

use crate::domain::{ConfirmingParty, PermitStatus};
use crate::entity::{ClearanceId, LivestockId, OfficerId, OwnerId, PermitId, TransferId, VerificationId};
use crate::errors::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Base trait for domain events
pub trait DomainEvent: Debug + Send + Sync {
    /// ID of the aggregate the event belongs to
    fn aggregate_id(&self) -> Uuid;

    /// Stable event type name
    fn event_type(&self) -> &'static str;
}

/// Everything that can happen to livestock documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LivestockEvent {
    /// A clearance request was recorded
    ClearanceRequested {
        /// Clearance
        clearance_id: ClearanceId,
        /// Assigned number
        clearance_number: String,
        /// Animal
        livestock_id: LivestockId,
        /// Officer who took the request
        issued_by: OfficerId,
    },
    /// Police approved a clearance
    ClearanceApproved {
        /// Clearance
        clearance_id: ClearanceId,
        /// Approving officer
        approved_by: OfficerId,
        /// Last valid day
        expiry_date: NaiveDate,
    },
    /// Police refused a clearance
    ClearanceRejected {
        /// Clearance
        clearance_id: ClearanceId,
        /// Stated reason
        reason: String,
    },
    /// A movement permit was issued
    PermitIssued {
        /// Permit
        permit_id: PermitId,
        /// Assigned number
        permit_number: String,
        /// Clearance it rests on
        clearance_id: ClearanceId,
        /// Animal
        livestock_id: LivestockId,
    },
    /// A checkpoint scan was recorded
    PermitVerified {
        /// Permit
        permit_id: PermitId,
        /// Scan record
        verification_id: VerificationId,
        /// Whether the permit passed
        valid: bool,
        /// Why it did not
        flag_reason: Option<String>,
    },
    /// A scan found the animal reported stolen
    StolenLivestockAlert {
        /// Permit
        permit_id: PermitId,
        /// Animal
        livestock_id: LivestockId,
        /// Scanning officer
        verified_by: OfficerId,
    },
    /// First scan: the animal is on the move
    PermitMovementStarted {
        /// Permit
        permit_id: PermitId,
    },
    /// Arrival recorded
    PermitCompleted {
        /// Permit
        permit_id: PermitId,
    },
    /// Permit withdrawn
    PermitCancelled {
        /// Permit
        permit_id: PermitId,
        /// Status before cancellation
        previous_status: PermitStatus,
        /// Stated reason
        reason: String,
    },
    /// Ownership transfer opened
    TransferInitiated {
        /// Transfer
        transfer_id: TransferId,
        /// Animal
        livestock_id: LivestockId,
        /// Giving owner
        from_owner_id: OwnerId,
        /// Receiving owner
        to_owner_id: OwnerId,
    },
    /// One side confirmed
    TransferConfirmed {
        /// Transfer
        transfer_id: TransferId,
        /// Which side
        side: ConfirmingParty,
        /// Whether a fingerprint proof was supplied
        with_fingerprint: bool,
    },
    /// Both sides have confirmed
    TransferFullyConfirmed {
        /// Transfer
        transfer_id: TransferId,
    },
    /// Ownership changed
    TransferCompleted {
        /// Transfer
        transfer_id: TransferId,
        /// Animal
        livestock_id: LivestockId,
        /// New owner of record
        new_owner_id: OwnerId,
    },
    /// Transfer abandoned
    TransferCancelled {
        /// Transfer
        transfer_id: TransferId,
        /// Stated reason
        reason: String,
    },
    /// Theft reported
    LivestockReportedStolen {
        /// Animal
        livestock_id: LivestockId,
        /// Date of the theft
        stolen_date: NaiveDate,
        /// Reporting officer
        reported_by: OfficerId,
    },
    /// Stolen animal recovered
    LivestockRecovered {
        /// Animal
        livestock_id: LivestockId,
        /// Officer recording the recovery
        recorded_by: OfficerId,
    },
}

impl DomainEvent for LivestockEvent {
    fn aggregate_id(&self) -> Uuid {
        match self {
            LivestockEvent::ClearanceRequested { clearance_id, .. }
            | LivestockEvent::ClearanceApproved { clearance_id, .. }
            | LivestockEvent::ClearanceRejected { clearance_id, .. } => *clearance_id.as_uuid(),
            LivestockEvent::PermitIssued { permit_id, .. }
            | LivestockEvent::PermitVerified { permit_id, .. }
            | LivestockEvent::StolenLivestockAlert { permit_id, .. }
            | LivestockEvent::PermitMovementStarted { permit_id }
            | LivestockEvent::PermitCompleted { permit_id }
            | LivestockEvent::PermitCancelled { permit_id, .. } => *permit_id.as_uuid(),
            LivestockEvent::TransferInitiated { transfer_id, .. }
            | LivestockEvent::TransferConfirmed { transfer_id, .. }
            | LivestockEvent::TransferFullyConfirmed { transfer_id }
            | LivestockEvent::TransferCompleted { transfer_id, .. }
            | LivestockEvent::TransferCancelled { transfer_id, .. } => *transfer_id.as_uuid(),
            LivestockEvent::LivestockReportedStolen { livestock_id, .. }
            | LivestockEvent::LivestockRecovered { livestock_id, .. } => *livestock_id.as_uuid(),
        }
    }

    fn event_type(&self) -> &'static str {
        match self {
            LivestockEvent::ClearanceRequested { .. } => "ClearanceRequested",
            LivestockEvent::ClearanceApproved { .. } => "ClearanceApproved",
            LivestockEvent::ClearanceRejected { .. } => "ClearanceRejected",
            LivestockEvent::PermitIssued { .. } => "PermitIssued",
            LivestockEvent::PermitVerified { .. } => "PermitVerified",
            LivestockEvent::StolenLivestockAlert { .. } => "StolenLivestockAlert",
            LivestockEvent::PermitMovementStarted { .. } => "PermitMovementStarted",
            LivestockEvent::PermitCompleted { .. } => "PermitCompleted",
            LivestockEvent::PermitCancelled { .. } => "PermitCancelled",
            LivestockEvent::TransferInitiated { .. } => "TransferInitiated",
            LivestockEvent::TransferConfirmed { .. } => "TransferConfirmed",
            LivestockEvent::TransferFullyConfirmed { .. } => "TransferFullyConfirmed",
            LivestockEvent::TransferCompleted { .. } => "TransferCompleted",
            LivestockEvent::TransferCancelled { .. } => "TransferCancelled",
            LivestockEvent::LivestockReportedStolen { .. } => "LivestockReportedStolen",
            LivestockEvent::LivestockRecovered { .. } => "LivestockRecovered",
        }
    }
}

/// A published event with its envelope metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedEvent {
    /// Unique event ID
    pub event_id: Uuid,
    /// When it was published
    pub occurred_at: DateTime<Utc>,
    /// Payload
    pub event: LivestockEvent,
}

/// Event publisher trait for workflows to emit events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish domain events
    async fn publish(&self, events: Vec<LivestockEvent>) -> DomainResult<()>;
}

/// Publisher that keeps events in memory for inspection
#[derive(Debug, Default)]
pub struct InMemoryEventPublisher {
    published: RwLock<Vec<PublishedEvent>>,
}

impl InMemoryEventPublisher {
    /// Create an empty publisher
    pub fn new() -> Self {
        Self::default()
    }

    /// All published events, oldest first
    pub async fn published(&self) -> Vec<PublishedEvent> {
        self.published.read().await.clone()
    }

    /// Event type names, oldest first
    pub async fn event_types(&self) -> Vec<&'static str> {
        self.published
            .read()
            .await
            .iter()
            .map(|e| e.event.event_type())
            .collect()
    }

    /// Events belonging to one aggregate
    pub async fn for_aggregate(&self, aggregate_id: Uuid) -> Vec<LivestockEvent> {
        self.published
            .read()
            .await
            .iter()
            .filter(|e| e.event.aggregate_id() == aggregate_id)
            .map(|e| e.event.clone())
            .collect()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, events: Vec<LivestockEvent>) -> DomainResult<()> {
        let now = Utc::now();
        let mut published = self.published.write().await;
        published.extend(events.into_iter().map(|event| PublishedEvent {
            event_id: Uuid::new_v4(),
            occurred_at: now,
            event,
        }));
        Ok(())
    }
}
