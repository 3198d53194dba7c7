// Copyright 2025 Cowboy AI, LLC.

//! External collaborators consumed at the workflow boundary
//!
//! - **Identity directory**: officers (role, active status) and owners
//! - **Object storage**: QR payloads and fingerprint probes by reference
//! - **Biometric matcher**: opaque fingerprint scoring

mod biometric;
mod directory;
mod qr;
mod storage;

pub use biometric::{BiometricCandidate, BiometricMatch, BiometricMatcher, ExactTemplateMatcher};
pub use directory::{IdentityDirectory, InMemoryDirectory};
pub use qr::{QrDocumentType, QrPayload, QR_CONTENT_TYPE};
pub use storage::{InMemoryObjectStorage, ObjectStorage};
