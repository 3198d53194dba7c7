// Copyright 2025 Cowboy AI, LLC.

//! Fingerprint matching capability
//!
//! The matching algorithm is opaque: a matcher scores one probe against one
//! template, and exposes the threshold at which a score counts as a match.

use crate::errors::DomainResult;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// An enrolled template offered for identification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiometricCandidate {
    /// Storage reference of the template
    pub reference: String,
    /// Template bytes
    pub template: Bytes,
}

/// Best match found during identification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiometricMatch {
    /// Reference of the matching template
    pub reference: String,
    /// Its score
    pub score: f64,
}

/// Fingerprint matcher
pub trait BiometricMatcher: Send + Sync {
    /// Minimum score that counts as a match
    fn match_threshold(&self) -> f64;

    /// Similarity of `probe` to `candidate`
    fn score(&self, probe: &[u8], candidate: &[u8]) -> DomainResult<f64>;

    /// Whether `probe` matches `candidate`
    fn is_match(&self, probe: &[u8], candidate: &[u8]) -> DomainResult<bool> {
        Ok(self.score(probe, candidate)? >= self.match_threshold())
    }

    /// Highest-scoring candidate at or above the threshold.
    ///
    /// Ties go to the earlier candidate.
    fn identify_best(
        &self,
        probe: &[u8],
        candidates: &[BiometricCandidate],
    ) -> DomainResult<Option<BiometricMatch>> {
        let threshold = self.match_threshold();
        let mut best: Option<BiometricMatch> = None;
        for candidate in candidates {
            let score = self.score(probe, &candidate.template)?;
            if score < threshold {
                continue;
            }
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(BiometricMatch {
                    reference: candidate.reference.clone(),
                    score,
                });
            }
        }
        Ok(best)
    }
}

/// Matcher that accepts only byte-identical templates
///
/// Scores 1.0 for identical bytes and 0.0 otherwise. Useful for wiring and
/// tests where no real matcher is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactTemplateMatcher;

impl BiometricMatcher for ExactTemplateMatcher {
    fn match_threshold(&self) -> f64 {
        1.0
    }

    fn score(&self, probe: &[u8], candidate: &[u8]) -> DomainResult<f64> {
        Ok(if probe == candidate { 1.0 } else { 0.0 })
    }
}
