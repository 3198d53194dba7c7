// Copyright 2025 Cowboy AI, LLC.

//! Owners and officers, as resolved from the identity directory

use crate::entity::{OfficerId, OwnerId};
use crate::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};

/// Registered livestock owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// Owner ID
    pub id: OwnerId,
    /// Full legal name
    pub full_name: String,
    /// National identity number (unique)
    pub national_id: String,
    /// Contact phone number
    pub phone: Option<String>,
    /// Storage reference of the enrolled fingerprint template
    pub fingerprint_template_ref: Option<String>,
}

impl Owner {
    /// Owner without contact details or biometrics
    pub fn new(full_name: impl Into<String>, national_id: impl Into<String>) -> Self {
        Self {
            id: OwnerId::new(),
            full_name: full_name.into(),
            national_id: national_id.into(),
            phone: None,
            fingerprint_template_ref: None,
        }
    }
}

/// What an officer is allowed to issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfficerRole {
    /// Issues police clearances and theft reports
    Police,
    /// Issues movement permits
    ExtensionOfficer,
    /// Veterinary services; may scan permits and handle transfers
    Veterinarian,
    /// May perform any operation
    Admin,
}

impl OfficerRole {
    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            OfficerRole::Police => "POLICE",
            OfficerRole::ExtensionOfficer => "EXTENSION_OFFICER",
            OfficerRole::Veterinarian => "VETERINARIAN",
            OfficerRole::Admin => "ADMIN",
        }
    }
}

/// Government officer acting on documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Officer {
    /// Officer ID
    pub id: OfficerId,
    /// Full name
    pub name: String,
    /// Badge or staff number
    pub badge_number: String,
    /// Role
    pub role: OfficerRole,
    /// Deactivated officers may not act
    pub active: bool,
    /// Province the officer is stationed in
    pub province_code: Option<String>,
}

impl Officer {
    /// Active officer with the given role
    pub fn new(name: impl Into<String>, badge_number: impl Into<String>, role: OfficerRole) -> Self {
        Self {
            id: OfficerId::new(),
            name: name.into(),
            badge_number: badge_number.into(),
            role,
            active: true,
            province_code: None,
        }
    }

    /// Station the officer in a province
    pub fn in_province(mut self, province_code: impl Into<String>) -> Self {
        self.province_code = Some(province_code.into());
        self
    }

    /// Fail unless the officer is active and holds one of `roles`.
    ///
    /// `Admin` always passes the role check; an empty `roles` slice means any
    /// role is acceptable.
    pub fn ensure_may(&self, action: &str, roles: &[OfficerRole]) -> DomainResult<()> {
        if !self.active {
            return Err(DomainError::AuthorizationError(format!(
                "officer {} is inactive and may not {action}",
                self.badge_number
            )));
        }
        if roles.is_empty() || self.role == OfficerRole::Admin || roles.contains(&self.role) {
            return Ok(());
        }
        Err(DomainError::AuthorizationError(format!(
            "officer {} with role {} may not {action}",
            self.badge_number,
            self.role.name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(OfficerRole::Police, true ; "police may approve")]
    #[test_case(OfficerRole::Admin, true ; "admin may approve")]
    #[test_case(OfficerRole::ExtensionOfficer, false ; "extension officer may not")]
    #[test_case(OfficerRole::Veterinarian, false ; "veterinarian may not")]
    fn test_role_check(role: OfficerRole, allowed: bool) {
        let officer = Officer::new("N. Shikongo", "B-100", role);
        assert_eq!(
            officer.ensure_may("approve clearances", &[OfficerRole::Police]).is_ok(),
            allowed
        );
    }

    #[test]
    fn test_inactive_officer_is_refused() {
        let mut officer = Officer::new("N. Shikongo", "B-100", OfficerRole::Admin);
        officer.active = false;

        let err = officer.ensure_may("scan permits", &[]).unwrap_err();
        assert!(matches!(err, DomainError::AuthorizationError(_)));
    }

    #[test]
    fn test_role_serializes_screaming_case() {
        let json = serde_json::to_string(&OfficerRole::ExtensionOfficer).unwrap();
        assert_eq!(json, "\"EXTENSION_OFFICER\"");
    }
}
