// Copyright 2025 Cowboy AI, LLC.

//! Append-only audit trail of checkpoint scans

use crate::domain::PermitVerification;
use crate::entity::PermitId;
use crate::errors::{DomainError, DomainResult};
use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

/// Storage for [`PermitVerification`] rows. There is no update or delete.
#[async_trait]
pub trait VerificationLog: Send + Sync {
    /// Record a scan
    async fn append(&self, verification: PermitVerification) -> DomainResult<()>;

    /// Every scan of a permit, oldest first
    async fn for_permit(&self, permit_id: &PermitId) -> DomainResult<Vec<PermitVerification>>;

    /// Number of scans of a permit
    async fn count_for_permit(&self, permit_id: &PermitId) -> DomainResult<usize> {
        Ok(self.for_permit(permit_id).await?.len())
    }
}

/// In-memory verification log
#[derive(Debug, Default)]
pub struct InMemoryVerificationLog {
    rows: RwLock<IndexMap<PermitId, Vec<PermitVerification>>>,
}

impl InMemoryVerificationLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VerificationLog for InMemoryVerificationLog {
    async fn append(&self, verification: PermitVerification) -> DomainResult<()> {
        let mut rows = self.rows.write().await;
        let scans = rows.entry(verification.permit_id).or_default();
        if scans.iter().any(|row| row.id == verification.id) {
            return Err(DomainError::AlreadyExists(format!(
                "PermitVerification {}",
                verification.id
            )));
        }
        scans.push(verification);
        Ok(())
    }

    async fn for_permit(&self, permit_id: &PermitId) -> DomainResult<Vec<PermitVerification>> {
        let mut scans = self
            .rows
            .read()
            .await
            .get(permit_id)
            .cloned()
            .unwrap_or_default();
        scans.sort_by_key(|row| row.verified_at);
        Ok(scans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{OfficerId, VerificationId};
    use chrono::{Duration, Utc};

    fn scan(permit_id: PermitId, minutes_ago: i64) -> PermitVerification {
        PermitVerification {
            id: VerificationId::new(),
            permit_id,
            verified_by: OfficerId::new(),
            verified_at: Utc::now() - Duration::minutes(minutes_ago),
            coordinates: None,
            notes: None,
            valid: true,
            flag_reason: None,
        }
    }

    #[tokio::test]
    async fn test_scans_come_back_oldest_first() {
        let log = InMemoryVerificationLog::new();
        let permit = PermitId::new();
        log.append(scan(permit, 1)).await.unwrap();
        log.append(scan(permit, 30)).await.unwrap();
        log.append(scan(PermitId::new(), 5)).await.unwrap();

        let scans = log.for_permit(&permit).await.unwrap();
        assert_eq!(scans.len(), 2);
        assert!(scans[0].verified_at < scans[1].verified_at);
        assert_eq!(log.count_for_permit(&PermitId::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_same_row_cannot_be_appended_twice() {
        let log = InMemoryVerificationLog::new();
        let row = scan(PermitId::new(), 0);
        log.append(row.clone()).await.unwrap();

        assert!(log.append(row).await.unwrap_err().is_conflict());
    }
}
