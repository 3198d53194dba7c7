// Copyright 2025 Cowboy AI, LLC.

//! Workflow configuration

use crate::errors::{DomainError, DomainResult};
use crate::numbering::validate_province_code;
use serde::{Deserialize, Serialize};

/// Longest clearance validity window accepted, in days
pub const MAX_CLEARANCE_VALIDITY_DAYS: i64 = 3650;

/// Tunables shared by all workflows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Days a police clearance stays valid after approval
    pub clearance_validity_days: i64,

    /// Province used for clearance numbers when the request names none
    pub default_province_code: String,

    /// Base path the HTTP surface is mounted under
    pub api_base_path: String,

    /// Header carrying the acting officer's ID
    pub officer_header: String,

    /// Reload-and-retry budget for commutative follow-up writes
    pub max_write_retries: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            clearance_validity_days: 14,
            default_province_code: "NA".to_string(),
            api_base_path: "/api/v1".to_string(),
            officer_header: "X-Officer-Id".to_string(),
            max_write_retries: 3,
        }
    }
}

impl WorkflowConfig {
    /// Parse a JSON document; absent fields take their defaults
    pub fn from_json_str(json: &str) -> DomainResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `LIVESTOCK_*` environment variables
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DomainResult<Self> {
        let mut config = Self::default();

        if let Some(days) = lookup("LIVESTOCK_CLEARANCE_VALIDITY_DAYS") {
            config.clearance_validity_days = days.trim().parse().map_err(|_| {
                DomainError::validation("clearance_validity_days", "must be an integer")
            })?;
        }
        if let Some(code) = lookup("LIVESTOCK_DEFAULT_PROVINCE") {
            config.default_province_code = code.trim().to_string();
        }
        if let Some(path) = lookup("LIVESTOCK_API_BASE_PATH") {
            config.api_base_path = path.trim().to_string();
        }
        if let Some(header) = lookup("LIVESTOCK_OFFICER_HEADER") {
            config.officer_header = header.trim().to_string();
        }
        if let Some(retries) = lookup("LIVESTOCK_MAX_WRITE_RETRIES") {
            config.max_write_retries = retries.trim().parse().map_err(|_| {
                DomainError::validation("max_write_retries", "must be a non-negative integer")
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings no workflow can run with
    pub fn validate(&self) -> DomainResult<()> {
        if self.clearance_validity_days <= 0 {
            return Err(DomainError::validation(
                "clearance_validity_days",
                "must be positive",
            ));
        }
        if self.clearance_validity_days > MAX_CLEARANCE_VALIDITY_DAYS {
            return Err(DomainError::validation(
                "clearance_validity_days",
                format!("must not exceed {MAX_CLEARANCE_VALIDITY_DAYS}"),
            ));
        }
        validate_province_code(&self.default_province_code)
            .map_err(|_| DomainError::validation("default_province_code", "must be two ASCII letters"))?;
        if !self.api_base_path.starts_with('/') {
            return Err(DomainError::validation("api_base_path", "must start with '/'"));
        }
        if self.officer_header.trim().is_empty() {
            return Err(DomainError::validation("officer_header", "must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = WorkflowConfig::default();
        assert_eq!(config.clearance_validity_days, 14);
        assert_eq!(config.api_base_path, "/api/v1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let config =
            WorkflowConfig::from_json_str(r#"{"clearance_validity_days": 30, "default_province_code": "KW"}"#)
                .unwrap();
        assert_eq!(config.clearance_validity_days, 30);
        assert_eq!(config.default_province_code, "KW");
        assert_eq!(config.officer_header, "X-Officer-Id");
    }

    #[test]
    fn test_rejects_non_positive_window() {
        let err = WorkflowConfig::from_json_str(r#"{"clearance_validity_days": 0}"#).unwrap_err();
        assert_eq!(err.field(), Some("clearance_validity_days"));
    }

    #[test]
    fn test_rejects_window_beyond_ten_years() {
        let err = WorkflowConfig::from_json_str(r#"{"clearance_validity_days": 1000000000000}"#)
            .unwrap_err();
        assert_eq!(err.field(), Some("clearance_validity_days"));

        let err = WorkflowConfig::from_lookup(|key| {
            (key == "LIVESTOCK_CLEARANCE_VALIDITY_DAYS").then(|| "3651".to_string())
        })
        .unwrap_err();
        assert!(err.is_validation_error());

        let config = WorkflowConfig::from_json_str(r#"{"clearance_validity_days": 3650}"#).unwrap();
        assert_eq!(config.clearance_validity_days, MAX_CLEARANCE_VALIDITY_DAYS);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("LIVESTOCK_CLEARANCE_VALIDITY_DAYS", "7"),
            ("LIVESTOCK_DEFAULT_PROVINCE", "HH"),
            ("LIVESTOCK_MAX_WRITE_RETRIES", "5"),
        ]
        .into_iter()
        .collect();

        let config =
            WorkflowConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.clearance_validity_days, 7);
        assert_eq!(config.default_province_code, "HH");
        assert_eq!(config.max_write_retries, 5);
    }

    #[test]
    fn test_env_rejects_garbage() {
        let err = WorkflowConfig::from_lookup(|key| {
            (key == "LIVESTOCK_CLEARANCE_VALIDITY_DAYS").then(|| "two weeks".to_string())
        })
        .unwrap_err();
        assert!(err.is_validation_error());
    }
}
