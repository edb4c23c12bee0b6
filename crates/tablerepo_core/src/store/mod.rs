//! Table store adapter contract and implementations.
//!
//! # Responsibility
//! - Define the narrow interface the repository persists through.
//! - Provide in-memory and SQLite-backed adapters with identical semantics.
//!
//! # Invariants
//! - Mutations are queued at dispatch and applied only by `commit()`.
//! - Each dispatch runs the matching `before_*` hook first.
//! - `commit()` consumes the pending batch whether or not it succeeds.
//! - Inserted and updated rows must pass `ensure_storable`; otherwise the
//!   batch fails with `InvalidData`.
//! - Absence on `single`/`first` is `Ok(None)`, never an error.
//!
//! # See also
//! - `crate::hooks` for interception semantics.

use crate::db::DbError;
use crate::hooks::{BatchSummary, CommitHooks};
use crate::model::entity::{PropertyValue, TableEntity};
use crate::model::key::EntityKey;
use crate::model::operation::OperationKind;
use crate::query::filter::{is_reserved_field, key_filter, Filter};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

mod memory;
mod sqlite;

pub use memory::MemoryTableStore;
pub use sqlite::SqliteTableStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Row resolver applied to raw query results before they are returned.
pub type EntityResolver<'r> = &'r dyn Fn(TableEntity) -> TableEntity;

/// Errors reported by table store adapters.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    EntityAlreadyExists(EntityKey),
    EntityNotFound(EntityKey),
    InvalidData(String),
    Serialization(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::EntityAlreadyExists(key) => write!(f, "entity already exists: {key}"),
            Self::EntityNotFound(key) => write!(f, "entity not found: {key}"),
            Self::InvalidData(message) => write!(f, "invalid stored entity data: {message}"),
            Self::Serialization(err) => write!(f, "entity serialization failed: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::EntityAlreadyExists(_) | Self::EntityNotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Outcome of dispatching one mutation to a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Queued for the next `commit()`.
    Queued,
    /// Cancelled by a `before_*` hook; nothing was queued.
    Skipped,
}

/// One queued, not yet applied mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation {
    pub kind: OperationKind,
    pub entity: TableEntity,
}

/// Narrow persistence interface consumed by `TableRepository`.
pub trait TableStore {
    fn insert(&mut self, entity: TableEntity, hooks: &mut dyn CommitHooks)
        -> StoreResult<Dispatch>;

    fn update(&mut self, entity: TableEntity, hooks: &mut dyn CommitHooks)
        -> StoreResult<Dispatch>;

    fn delete(&mut self, entity: TableEntity, hooks: &mut dyn CommitHooks)
        -> StoreResult<Dispatch>;

    /// Applies every queued mutation and fires `after_commit` on success.
    fn commit(&mut self, hooks: &mut dyn CommitHooks) -> StoreResult<BatchSummary>;

    /// Drops queued mutations without applying them.
    fn discard_pending(&mut self);

    /// Number of queued mutations.
    fn pending_len(&self) -> usize;

    /// Rows matching every filter, ordered by partition key then row key.
    fn query(&self, filters: &[Filter]) -> StoreResult<Vec<TableEntity>>;

    fn query_with_resolver(
        &self,
        resolver: EntityResolver<'_>,
        filters: &[Filter],
    ) -> StoreResult<Vec<TableEntity>> {
        Ok(self.query(filters)?.into_iter().map(resolver).collect())
    }

    fn single(&self, key: &EntityKey) -> StoreResult<Option<TableEntity>> {
        Ok(self.query(&key_filter(key))?.into_iter().next())
    }

    fn first(&self, filters: &[Filter]) -> StoreResult<Option<TableEntity>> {
        Ok(self.query(filters)?.into_iter().next())
    }
}

/// Queues `entity` after running its hook; shared by the bundled adapters.
pub(crate) fn queue_mutation(
    pending: &mut Vec<PendingMutation>,
    kind: OperationKind,
    mut entity: TableEntity,
    hooks: &mut dyn CommitHooks,
) -> Dispatch {
    if !crate::hooks::run_before_hook(hooks, kind, &mut entity) {
        return Dispatch::Skipped;
    }
    pending.push(PendingMutation { kind, entity });
    Dispatch::Queued
}

/// Rejects rows that could not be read back unchanged.
///
/// Reserved field names would be shadowed by the key or timestamp in filters,
/// and non-finite doubles have no JSON encoding.
pub(crate) fn ensure_storable(entity: &TableEntity) -> StoreResult<()> {
    for (name, value) in &entity.properties {
        if is_reserved_field(name) {
            return Err(StoreError::InvalidData(format!(
                "property `{name}` on `{}` uses a reserved field name",
                entity.key
            )));
        }
        if let PropertyValue::Double(number) = value {
            if !number.is_finite() {
                return Err(StoreError::InvalidData(format!(
                    "property `{name}` on `{}` holds non-finite double {number}",
                    entity.key
                )));
            }
        }
    }
    Ok(())
}

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}
