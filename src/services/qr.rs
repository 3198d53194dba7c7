// Copyright 2025 Cowboy AI, LLC.

//! QR-encodable document summaries
//!
//! The payload is stored as JSON through [`ObjectStorage`]; rendering it to
//! an image happens outside this crate.

use super::ObjectStorage;
use crate::domain::{MovementPermit, PoliceClearance};
use crate::errors::{DomainError, DomainResult};
use bytes::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Content type of stored QR payloads
pub const QR_CONTENT_TYPE: &str = "application/vnd.livestock.qr+json";

/// Kind of document a QR code vouches for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QrDocumentType {
    /// Police clearance
    PoliceClearance,
    /// Movement permit
    MovementPermit,
}

/// What a checkpoint officer sees after scanning a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    /// Document kind
    pub document_type: QrDocumentType,
    /// Clearance or permit number
    pub document_number: String,
    /// Ear tag of the animal
    pub livestock_tag: String,
    /// Last valid day
    pub valid_until: NaiveDate,
}

impl QrPayload {
    /// Summary of an approved clearance
    pub fn for_clearance(clearance: &PoliceClearance, livestock_tag: &str) -> DomainResult<Self> {
        let valid_until = clearance.expiry_date.ok_or_else(|| {
            DomainError::rule(format!(
                "clearance {} has no expiry date",
                clearance.clearance_number
            ))
        })?;
        Ok(Self {
            document_type: QrDocumentType::PoliceClearance,
            document_number: clearance.clearance_number.clone(),
            livestock_tag: livestock_tag.to_string(),
            valid_until,
        })
    }

    /// Summary of an issued permit
    pub fn for_permit(permit: &MovementPermit, livestock_tag: &str) -> Self {
        Self {
            document_type: QrDocumentType::MovementPermit,
            document_number: permit.permit_number.clone(),
            livestock_tag: livestock_tag.to_string(),
            valid_until: permit.valid_until,
        }
    }

    /// Serialized form
    pub fn to_bytes(&self) -> DomainResult<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    /// Parse a stored payload
    pub fn from_bytes(data: &[u8]) -> DomainResult<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Store the payload and return its reference
    pub async fn store(&self, storage: &dyn ObjectStorage) -> DomainResult<String> {
        storage.put(QR_CONTENT_TYPE, self.to_bytes()?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ClearanceId, LivestockId, OfficerId, OwnerId};
    use crate::domain::Location;
    use crate::services::InMemoryObjectStorage;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_permit_payload_is_stored_as_json() {
        let valid_until = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        let permit = MovementPermit::issued(
            "DG-2026-000042".into(),
            ClearanceId::new(),
            LivestockId::new(),
            OwnerId::new(),
            Location::named("Gobabis"),
            Location::named("Windhoek"),
            NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            valid_until,
            OfficerId::new(),
            Utc::now(),
        );
        let storage = InMemoryObjectStorage::new();

        let reference = QrPayload::for_permit(&permit, "NA-0001")
            .store(&storage)
            .await
            .unwrap();

        let stored = QrPayload::from_bytes(&storage.get(&reference).await.unwrap()).unwrap();
        assert_eq!(
            stored,
            QrPayload {
                document_type: QrDocumentType::MovementPermit,
                document_number: "DG-2026-000042".into(),
                livestock_tag: "NA-0001".into(),
                valid_until,
            }
        );
        assert_eq!(
            storage.content_type(&reference).await.as_deref(),
            Some(QR_CONTENT_TYPE)
        );
    }

    #[test]
    fn test_pending_clearance_has_no_payload() {
        let clearance = PoliceClearance::pending(
            "PC-KW-000001".into(),
            LivestockId::new(),
            OwnerId::new(),
            OfficerId::new(),
            "KW".into(),
            Utc::now(),
        );
        assert!(QrPayload::for_clearance(&clearance, "NA-0001").is_err());
    }
}
