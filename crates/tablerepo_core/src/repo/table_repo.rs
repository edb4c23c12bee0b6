//! Domain-mapped repository over a table store.
//!
//! # Responsibility
//! - Accept domain-level insert/update/delete requests into a journal.
//! - Replay the journal, mapped to storage rows, as one store batch.
//! - Serve queries mapped back to domain values.
//!
//! # Invariants
//! - Insert/Update/Delete never touch the store; mapping happens at commit.
//! - Commit dispatches entries one at a time in submission order.
//! - The journal is reset only after the store batch commit succeeds.
//! - On any store failure the journal keeps its entries and the store's
//!   unflushed batch is discarded, so a retry replays the unit exactly once.
//! - Queries never observe uncommitted journal entries.

use crate::hooks::{BatchSummary, CommitHooks, NoopHooks};
use crate::journal::{Journal, JournalEntry, JournalError};
use crate::mapper::EntityMapper;
use crate::model::entity::TableEntity;
use crate::model::key::EntityKey;
use crate::model::operation::{EntityState, OperationKind};
use crate::query::filter::Filter;
use crate::query::TableQuery;
use crate::store::{Dispatch, EntityResolver, StoreError, TableStore};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error taxonomy.
#[derive(Debug)]
pub enum RepoError {
    /// Rejected before reaching the journal (absent entity).
    InvalidArgument(JournalError),
    /// Store failure, passed through unmodified.
    Store(StoreError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidArgument(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<JournalError> for RepoError {
    fn from(value: JournalError) -> Self {
        Self::InvalidArgument(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Result of one successful commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Entries the store queued.
    pub dispatched: usize,
    /// Entries a `before_*` hook cancelled.
    pub skipped: usize,
    pub batch: BatchSummary,
}

/// Unit-of-work repository mapping domain values onto a table store.
///
/// One instance serves one writer; callers serialize mutation and commit
/// calls themselves.
pub struct TableRepository<S, M, H = NoopHooks>
where
    S: TableStore,
    M: EntityMapper,
{
    store: S,
    mapper: M,
    hooks: H,
    journal: Journal<M::Domain>,
}

impl<S, M> TableRepository<S, M, NoopHooks>
where
    S: TableStore,
    M: EntityMapper,
{
    pub fn new(store: S, mapper: M) -> Self {
        Self::with_hooks(store, mapper, NoopHooks)
    }
}

impl<S, M, H> TableRepository<S, M, H>
where
    S: TableStore,
    M: EntityMapper,
    H: CommitHooks,
{
    pub fn with_hooks(store: S, mapper: M, hooks: H) -> Self {
        Self {
            store,
            mapper,
            hooks,
            journal: Journal::new(),
        }
    }

    /// Queues an insert. `None` is rejected with `RepoError::InvalidArgument`.
    pub fn insert(&mut self, entity: impl Into<Option<M::Domain>>) -> RepoResult<()> {
        Ok(self.journal.insert(entity)?)
    }

    /// Queues an update. `None` is rejected with `RepoError::InvalidArgument`.
    pub fn update(&mut self, entity: impl Into<Option<M::Domain>>) -> RepoResult<()> {
        Ok(self.journal.update(entity)?)
    }

    /// Queues a delete. `None` is rejected with `RepoError::InvalidArgument`.
    pub fn delete(&mut self, entity: impl Into<Option<M::Domain>>) -> RepoResult<()> {
        Ok(self.journal.delete(entity)?)
    }

    /// Pending entries in submission order.
    pub fn journal(&self) -> &[JournalEntry<M::Domain>] {
        self.journal.entries()
    }

    pub fn pending_count(&self) -> usize {
        self.journal.len()
    }

    /// Replays the journal against the store and flushes it as one batch.
    ///
    /// # Errors
    /// - `RepoError::Store` when a dispatch or the batch commit fails. The
    ///   journal is left intact; whatever the store applied stays applied.
    pub fn commit(&mut self) -> RepoResult<CommitSummary> {
        let started_at = Instant::now();
        let mut summary = CommitSummary::default();
        info!(
            "event=repo_commit module=repo status=start pending={}",
            self.journal.len()
        );

        for entry in self.journal.entries() {
            let entity = self.mapper.map_to_entity(&entry.entity);
            let dispatched = match entry.kind {
                OperationKind::Insert => self.store.insert(entity, &mut self.hooks),
                OperationKind::Update => self.store.update(entity, &mut self.hooks),
                OperationKind::Delete => self.store.delete(entity, &mut self.hooks),
            };

            match dispatched {
                Ok(Dispatch::Queued) => summary.dispatched += 1,
                Ok(Dispatch::Skipped) => summary.skipped += 1,
                Err(err) => {
                    self.store.discard_pending();
                    error!(
                        "event=repo_commit module=repo status=error stage=dispatch op={} sequence={} duration_ms={} error={}",
                        entry.kind.as_str(),
                        entry.sequence,
                        started_at.elapsed().as_millis(),
                        err
                    );
                    return Err(err.into());
                }
            }
        }

        match self.store.commit(&mut self.hooks) {
            Ok(batch) => {
                summary.batch = batch;
                self.journal.reset();
                info!(
                    "event=repo_commit module=repo status=ok dispatched={} skipped={} inserted={} updated={} deleted={} duration_ms={}",
                    summary.dispatched,
                    summary.skipped,
                    batch.inserted,
                    batch.updated,
                    batch.deleted,
                    started_at.elapsed().as_millis()
                );
                Ok(summary)
            }
            Err(err) => {
                self.store.discard_pending();
                error!(
                    "event=repo_commit module=repo status=error stage=batch pending={} duration_ms={} error={}",
                    self.journal.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Discards the pending unit of work without touching the store.
    pub fn rollback(&mut self) {
        let discarded = self.journal.len();
        self.journal.reset();
        info!("event=repo_rollback module=repo status=ok discarded={discarded}");
    }

    /// Committed rows matching every filter, mapped to domain values.
    pub fn query(&self, filters: &[Filter]) -> RepoResult<Vec<M::Domain>> {
        let rows = self.store.query(filters)?;
        Ok(self.map_all(rows))
    }

    /// Like `query`, passing each raw row through `resolver` before mapping.
    pub fn query_with_resolver(
        &self,
        resolver: EntityResolver<'_>,
        filters: &[Filter],
    ) -> RepoResult<Vec<M::Domain>> {
        let rows = self.store.query_with_resolver(resolver, filters)?;
        Ok(self.map_all(rows))
    }

    /// Unmapped, re-runnable query over raw rows.
    pub fn table_query(&self, filters: &[Filter]) -> TableQuery<'_, S> {
        TableQuery::new(&self.store, filters.to_vec())
    }

    /// Point lookup; `Ok(None)` when the key does not exist.
    pub fn single(&self, key: &EntityKey) -> RepoResult<Option<M::Domain>> {
        let row = self.store.single(key)?;
        Ok(row.map(|entity| self.mapper.map_from_entity(entity)))
    }

    /// First match in key order; `Ok(None)` when nothing matches.
    pub fn first(&self, filters: &[Filter]) -> RepoResult<Option<M::Domain>> {
        let row = self.store.first(filters)?;
        Ok(row.map(|entity| self.mapper.map_from_entity(entity)))
    }

    /// Reserved for change tracking; currently a no-op.
    pub fn attach(&mut self, _entity: &M::Domain, _state: EntityState) {}

    /// Reserved for change tracking; currently a no-op.
    pub fn detach(&mut self, _entity: &M::Domain) {}

    pub fn convert_to_table_entity(&self, entity: &M::Domain) -> TableEntity {
        self.mapper.map_to_entity(entity)
    }

    pub fn convert_from_table_entity(&self, entity: TableEntity) -> M::Domain {
        self.mapper.map_from_entity(entity)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct store access; mutations made here bypass the journal.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    /// Splits the repository; pending journal entries are dropped.
    pub fn into_parts(self) -> (S, M, H) {
        (self.store, self.mapper, self.hooks)
    }

    fn map_all(&self, rows: Vec<TableEntity>) -> Vec<M::Domain> {
        rows.into_iter()
            .map(|entity| self.mapper.map_from_entity(entity))
            .collect()
    }
}
