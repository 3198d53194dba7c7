// Copyright 2025 Cowboy AI, LLC.

//! # Persistence Layer
//!
//! Storage seams for the workflows. Each seam is an async trait with an
//! in-memory implementation; a relational backend implements the same traits
//! with row versions (or `SELECT ... FOR UPDATE`) and a sequence object.
//!
//! ## Components
//!
//! - **Repositories**: versioned aggregate storage with compare-and-swap saves
//! - **Verification log**: append-only checkpoint scan records
//! - **Sequences**: atomic per-scope counters for document numbers

pub mod repository;
pub mod sequence;
pub mod verification_log;

pub use repository::{Filter, InMemoryRepository, Repository};
pub use sequence::{InMemorySequenceStore, SequenceStore};
pub use verification_log::{InMemoryVerificationLog, VerificationLog};
