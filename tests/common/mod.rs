// Copyright 2025 Cowboy AI, LLC.

//! Shared world for the integration tests

#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};
use livestock_movement::domain::{Livestock, Location, Officer, OfficerRole, Owner};
use livestock_movement::workflows::{CreateClearance, CreatePermit, PermitView, RegisterLivestock};
use livestock_movement::{ClearanceId, FixedClock, InMemoryBackend, WorkflowConfig};
use std::sync::Arc;

pub struct World {
    pub backend: InMemoryBackend,
    pub clock: Arc<FixedClock>,
    pub police: Officer,
    pub extension: Officer,
    pub owner: Owner,
    pub buyer: Owner,
    pub cow: Livestock,
}

pub fn day(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).unwrap()
}

/// Officers, two owners and one registered cow; the clock reads 2026-05-04
pub async fn world() -> World {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 5, 4, 7, 30, 0).unwrap(),
    ));
    let backend = InMemoryBackend::with_clock(WorkflowConfig::default(), clock.clone());

    let police = backend
        .directory
        .add_officer(Officer::new("J. Nangolo", "NAMPOL-220", OfficerRole::Police).in_province("OT"))
        .await;
    let extension = backend
        .directory
        .add_officer(Officer::new("M. Garoes", "EXT-17", OfficerRole::ExtensionOfficer))
        .await;
    let owner = backend
        .directory
        .add_owner(Owner::new("T. Shikongo", "68110400123"))
        .await
        .unwrap();
    let buyer = backend
        .directory
        .add_owner(Owner::new("A. Van Wyk", "90071500321"))
        .await
        .unwrap();
    let cow = backend
        .registry()
        .register(RegisterLivestock::new("NA-OT-1042", owner.id, "cattle"))
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

impl World {
    /// Approved clearance for the cow
    pub async fn approved_clearance(&self) -> ClearanceId {
        let clearances = self.backend.clearances();
        let clearance = clearances
            .create(CreateClearance::new(self.cow.id, self.owner.id, self.police.id))
            .await
            .unwrap();
        clearances.approve(clearance.id, self.police.id).await.unwrap();
        clearance.id
    }

    /// Permit valid from today through 2026-05-06
    pub async fn approved_permit(&self) -> PermitView {
        let clearance_id = self.approved_clearance().await;
        self.backend
            .permits()
            .create(CreatePermit::new(
                clearance_id,
                self.cow.id,
                Location::named("Otjiwarongo"),
                Location::named("Grootfontein"),
                day(5, 4),
                day(5, 6),
                self.extension.id,
            ))
            .await
            .unwrap()
    }
}
