// Copyright 2025 Cowboy AI, LLC.

use crate::entity::{AggregateRoot, LivestockId, LivestockMarker, OwnerId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Sex of an animal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    /// Male
    Male,
    /// Female
    Female,
}

/// A registered animal
///
/// Parentage is stored as plain IDs. Nothing walks the parentage graph
/// recursively, so a malformed cycle can never be followed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Livestock {
    /// Livestock ID
    pub id: LivestockId,
    /// Ear tag code (globally unique)
    pub tag_code: String,
    /// Current owner of record
    pub owner_id: OwnerId,
    /// Species, e.g. "cattle"
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
    /// Reported stolen and not yet recovered
    pub stolen: bool,
    /// When the theft was reported to have happened
    pub stolen_date: Option<NaiveDate>,
    /// Registration time
    pub registered_at: DateTime<Utc>,
    version: u64,
}

impl Livestock {
    /// New, unstolen animal
    pub fn new(tag_code: impl Into<String>, owner_id: OwnerId, species: impl Into<String>) -> Self {
        Self {
            id: LivestockId::new(),
            tag_code: tag_code.into(),
            owner_id,
            species: species.into(),
            breed: None,
            sex: None,
            birth_date: None,
            mother_id: None,
            father_id: None,
            stolen: false,
            stolen_date: None,
            registered_at: Utc::now(),
            version: 0,
        }
    }

    /// Whether `owner_id` is the current owner of record
    pub fn is_owned_by(&self, owner_id: &OwnerId) -> bool {
        &self.owner_id == owner_id
    }

    pub(crate) fn mark_stolen(&mut self, stolen_date: NaiveDate) {
        self.stolen = true;
        self.stolen_date = Some(stolen_date);
    }

    pub(crate) fn mark_recovered(&mut self) {
        self.stolen = false;
        self.stolen_date = None;
    }

    /// Reassign the owner of record. Only a completed transfer calls this.
    pub(crate) fn change_owner(&mut self, owner_id: OwnerId) {
        self.owner_id = owner_id;
    }
}

impl AggregateRoot for Livestock {
    type Marker = LivestockMarker;
    const TYPE_NAME: &'static str = "Livestock";

    fn id(&self) -> LivestockId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn natural_key(&self) -> Option<String> {
        Some(self.tag_code.clone())
    }
}
