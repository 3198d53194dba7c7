// Copyright 2025 Cowboy AI, LLC.

//! # Livestock Movement
//!
//! Livestock movement control: the documents an animal needs before it may
//! leave its farm and change hands.
//!
//! - **Police clearance**: a police officer attests the owner may move the
//!   animal; valid for a fixed window after approval
//! - **Movement permit**: an extension officer authorizes one trip against an
//!   approved clearance
//! - **Checkpoint verification**: any officer scans a permit on the road;
//!   every scan is kept, flagged or not
//! - **Ownership transfer**: both owners confirm, then an officer hands the
//!   animal over
//!
//! ## Design Principles
//!
//! 1. **Type Safety**: phantom-typed IDs keep a permit ID out of a clearance slot
//! 2. **Controlled State**: each document moves through a Mealy state machine
//! 3. **Optimistic Writes**: every save checks the version it read
//! 4. **Events After Commit**: observers only hear about stored changes
//!
//! ```rust
//! use livestock_movement::{WorkflowConfig, workflows::InMemoryBackend};
//!
//! let backend = InMemoryBackend::new(WorkflowConfig::default());
//! let _clearances = backend.clearances();
//! ```

#![warn(missing_docs)]

pub mod api;
pub mod clock;
pub mod config;
pub mod domain;
mod entity;
mod errors;
pub mod events;
pub mod numbering;
pub mod persistence;
pub mod services;
mod state_machine;
pub mod workflows;

/// Phantom markers for [`EntityId`]
pub mod markers {
    pub use crate::entity::{
        ClearanceMarker, LivestockMarker, OfficerMarker, OwnerMarker, PermitMarker,
        TransferMarker, VerificationMarker,
    };
}

pub use api::{ApiRequest, ApiResponse, LivestockApi};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::WorkflowConfig;
pub use entity::{
    AggregateRoot, ClearanceId, EntityId, LivestockId, OfficerId, OwnerId, PermitId, TransferId,
    VerificationId,
};
pub use errors::{DomainError, DomainResult, ErrorKind};
pub use events::{EventPublisher, InMemoryEventPublisher, LivestockEvent};
pub use state_machine::{MealyStateTransitions, State, TransitionInput};
pub use workflows::{InMemoryBackend, Services};
