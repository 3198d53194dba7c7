// Copyright 2025 Cowboy AI, LLC.

//! Document numbers
//!
//! Numbers have the form `{PREFIX}-{SEQUENCE:06}`:
//! - clearance: `PC-{province code}-000123`
//! - permit: `DG-{year}-000123`
//!
//! Each prefix owns its own counter in a [`SequenceStore`], so numbers are
//! allocated by atomic increment and never by counting existing documents.

use crate::errors::{DomainError, DomainResult};
use crate::persistence::SequenceStore;
use std::fmt;
use std::sync::Arc;

const CLEARANCE_PREFIX: &str = "PC";
const PERMIT_PREFIX: &str = "DG";

/// Which sequence a number is drawn from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentScope {
    /// Police clearances, one sequence per province
    Clearance {
        /// Two-letter province code
        province_code: String,
    },
    /// Movement permits, one sequence per year
    Permit {
        /// Four-digit year
        year: i32,
    },
}

impl DocumentScope {
    /// Clearance scope; the province code is validated and upper-cased
    pub fn clearance(province_code: &str) -> DomainResult<Self> {
        Ok(DocumentScope::Clearance {
            province_code: validate_province_code(province_code)?,
        })
    }

    /// Permit scope; the year must have four digits
    pub fn permit(year: i32) -> DomainResult<Self> {
        if !(1000..=9999).contains(&year) {
            return Err(DomainError::validation("year", "must have four digits"));
        }
        Ok(DocumentScope::Permit { year })
    }

    /// Prefix shared by every number in this scope
    pub fn prefix(&self) -> String {
        match self {
            DocumentScope::Clearance { province_code } => {
                format!("{CLEARANCE_PREFIX}-{province_code}")
            }
            DocumentScope::Permit { year } => format!("{PERMIT_PREFIX}-{year}"),
        }
    }
}

impl fmt::Display for DocumentScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix())
    }
}

/// Normalize a province code to two upper-case ASCII letters
pub fn validate_province_code(code: &str) -> DomainResult<String> {
    let code = code.trim();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(DomainError::validation(
            "province_code",
            "must be two ASCII letters",
        ));
    }
    Ok(code.to_ascii_uppercase())
}

/// Format a number from its prefix and sequence value
pub fn format_document_number(prefix: &str, sequence: u64) -> String {
    format!("{prefix}-{sequence:06}")
}

/// Hands out unique, human-readable document numbers
#[derive(Clone)]
pub struct DocumentNumberGenerator {
    sequences: Arc<dyn SequenceStore>,
}

impl DocumentNumberGenerator {
    /// Generator backed by `sequences`
    pub fn new(sequences: Arc<dyn SequenceStore>) -> Self {
        Self { sequences }
    }

    /// Next number for an arbitrary prefix
    pub async fn next(&self, scope_prefix: &str) -> DomainResult<String> {
        if scope_prefix.trim().is_empty() {
            return Err(DomainError::validation("scope_prefix", "must not be empty"));
        }
        let sequence = self.sequences.next_value(scope_prefix).await?;
        Ok(format_document_number(scope_prefix, sequence))
    }

    /// Next number in a typed scope
    pub async fn next_in(&self, scope: &DocumentScope) -> DomainResult<String> {
        self.next(&scope.prefix()).await
    }

    /// `PC-{province}-NNNNNN`
    pub async fn next_clearance_number(&self, province_code: &str) -> DomainResult<String> {
        self.next_in(&DocumentScope::clearance(province_code)?).await
    }

    /// `DG-{year}-NNNNNN`
    pub async fn next_permit_number(&self, year: i32) -> DomainResult<String> {
        self.next_in(&DocumentScope::permit(year)?).await
    }
}
