// Copyright 2025 Cowboy AI, LLC.

//! Livestock registry and theft reporting
//!
//! Registration is plain creation. The stolen flag is the one piece of
//! registry state the document workflows consult, so it is changed here
//! under the same officer and version rules as the documents.

use super::{required_text, Services};
use crate::domain::{Livestock, OfficerRole, Sex};
use crate::entity::{LivestockId, OfficerId, OwnerId};
use crate::errors::{DomainError, DomainResult};
use crate::events::LivestockEvent;
use chrono::NaiveDate;
use tracing::{info, instrument, warn};

/// Registration request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterLivestock {
    /// Ear tag code (unique)
    pub tag_code: String,
    /// Owner of record
    pub owner_id: OwnerId,
    /// Species
    pub species: String,
    /// Breed
    pub breed: Option<String>,
    /// Sex
    pub sex: Option<Sex>,
    /// Date of birth
    pub birth_date: Option<NaiveDate>,
    /// Dam
    pub mother_id: Option<LivestockId>,
    /// Sire
    pub father_id: Option<LivestockId>,
}

impl RegisterLivestock {
    /// Request with only the required fields
    pub fn new(tag_code: impl Into<String>, owner_id: OwnerId, species: impl Into<String>) -> Self {
        Self {
            tag_code: tag_code.into(),
            owner_id,
            species: species.into(),
            breed: None,
            sex: None,
            birth_date: None,
            mother_id: None,
            father_id: None,
        }
    }

    /// Record the parents
    pub fn with_parents(mut self, mother_id: Option<LivestockId>, father_id: Option<LivestockId>) -> Self {
        self.mother_id = mother_id;
        self.father_id = father_id;
        self
    }
}

/// Livestock registry
#[derive(Clone)]
pub struct LivestockRegistry {
    services: Services,
}

impl LivestockRegistry {
    /// Registry over `services`
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// Register an animal
    #[instrument(skip_all, fields(tag_code = %request.tag_code))]
    pub async fn register(&self, request: RegisterLivestock) -> DomainResult<Livestock> {
        let tag_code = required_text("tag_code", &request.tag_code)?;
        let species = required_text("species", &request.species)?;
        self.services.directory.get_owner(&request.owner_id).await?;

        let mut animal = Livestock::new(tag_code, request.owner_id, species);
        animal.breed = request.breed;
        animal.sex = request.sex;
        animal.birth_date = request.birth_date;
        animal.registered_at = self.services.clock.now();

        for (field, parent) in [("mother_id", request.mother_id), ("father_id", request.father_id)] {
            if let Some(parent_id) = parent {
                if parent_id == animal.id {
                    return Err(DomainError::validation(field, "an animal cannot be its own parent"));
                }
                self.services.livestock.get(&parent_id).await?;
            }
        }
        animal.mother_id = request.mother_id;
        animal.father_id = request.father_id;

        let stored = self.services.livestock.insert(&animal).await?;
        info!(livestock_id = %stored.id, owner_id = %stored.owner_id, "livestock registered");
        Ok(stored)
    }

    /// Flag an animal as stolen
    #[instrument(skip_all, fields(livestock_id = %livestock_id, officer_id = %officer_id))]
    pub async fn report_stolen(
        &self,
        livestock_id: LivestockId,
        officer_id: OfficerId,
        stolen_date: NaiveDate,
    ) -> DomainResult<Livestock> {
        let officer = self
            .services
            .acting_officer(&officer_id, "report stolen livestock", &[OfficerRole::Police])
            .await?;
        let mut animal = self.services.livestock.get(&livestock_id).await?;
        if animal.stolen {
            return Err(DomainError::rule(format!(
                "livestock {} is already reported stolen",
                animal.tag_code
            )));
        }
        if stolen_date > self.services.clock.today() {
            return Err(DomainError::validation("stolen_date", "must not be in the future"));
        }

        animal.mark_stolen(stolen_date);
        let saved = self.services.livestock.save(&animal).await?;
        warn!(tag_code = %saved.tag_code, %stolen_date, "livestock reported stolen");

        self.services
            .publish(vec![LivestockEvent::LivestockReportedStolen {
                livestock_id,
                stolen_date,
                reported_by: officer.id,
            }])
            .await;
        Ok(saved)
    }

    /// Clear the stolen flag
    #[instrument(skip_all, fields(livestock_id = %livestock_id, officer_id = %officer_id))]
    pub async fn report_recovered(
        &self,
        livestock_id: LivestockId,
        officer_id: OfficerId,
    ) -> DomainResult<Livestock> {
        let officer = self
            .services
            .acting_officer(&officer_id, "record recovered livestock", &[OfficerRole::Police])
            .await?;
        let mut animal = self.services.livestock.get(&livestock_id).await?;
        if !animal.stolen {
            return Err(DomainError::rule(format!(
                "livestock {} is not reported stolen",
                animal.tag_code
            )));
        }

        animal.mark_recovered();
        let saved = self.services.livestock.save(&animal).await?;
        info!(tag_code = %saved.tag_code, "livestock recovered");

        self.services
            .publish(vec![LivestockEvent::LivestockRecovered {
                livestock_id,
                recorded_by: officer.id,
            }])
            .await;
        Ok(saved)
    }

    /// Load by ID
    pub async fn get(&self, livestock_id: &LivestockId) -> DomainResult<Livestock> {
        self.services.livestock.get(livestock_id).await
    }

    /// Load by ear tag
    pub async fn find_by_tag(&self, tag_code: &str) -> DomainResult<Option<Livestock>> {
        self.services
            .livestock
            .find_by_natural_key(tag_code.trim())
            .await
    }

    /// Direct offspring of `parent_id` (one level)
    pub async fn offspring_of(&self, parent_id: &LivestockId) -> DomainResult<Vec<Livestock>> {
        let parent_id = *parent_id;
        self.services
            .livestock
            .find(&move |animal: &Livestock| {
                animal.mother_id == Some(parent_id) || animal.father_id == Some(parent_id)
            })
            .await
    }
}
