//! Storage-side data model.
//!
//! # Responsibility
//! - Define the keyed row shape exchanged with table stores.
//! - Define the mutation vocabulary shared by journal, hooks and stores.
//!
//! # Invariants
//! - Every row is addressed by a validated `EntityKey`.
//! - Domain types never appear here; mappers bridge to them.

pub mod entity;
pub mod key;
pub mod operation;
