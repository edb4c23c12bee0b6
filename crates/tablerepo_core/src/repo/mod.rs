//! Repository layer.
//!
//! # Responsibility
//! - Expose domain-level CRUD and query APIs over a pluggable table store.
//! - Own the unit-of-work journal and its commit orchestration.
//!
//! # Invariants
//! - Store failures surface as `RepoError::Store`; absence is `Ok(None)`.

pub mod table_repo;
