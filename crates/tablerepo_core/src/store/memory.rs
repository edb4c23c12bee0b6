//! In-process table store.
//!
//! # Invariants
//! - A batch is applied to a staged copy and swapped in only when every
//!   mutation succeeds, so a failed commit leaves rows untouched.

use super::{
    ensure_storable, now_epoch_ms, queue_mutation, Dispatch, PendingMutation, StoreError,
    StoreResult, TableStore,
};
use crate::hooks::{BatchSummary, CommitHooks};
use crate::model::entity::TableEntity;
use crate::model::key::EntityKey;
use crate::model::operation::OperationKind;
use crate::query::filter::{matches_all, Filter};
use std::collections::BTreeMap;

/// `BTreeMap`-backed adapter, ordered by `EntityKey`.
#[derive(Debug, Default, Clone)]
pub struct MemoryTableStore {
    rows: BTreeMap<EntityKey, TableEntity>,
    pending: Vec<PendingMutation>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Queued mutations in dispatch order.
    pub fn pending(&self) -> &[PendingMutation] {
        &self.pending
    }
}

impl TableStore for MemoryTableStore {
    fn insert(
        &mut self,
        entity: TableEntity,
        hooks: &mut dyn CommitHooks,
    ) -> StoreResult<Dispatch> {
        Ok(queue_mutation(
            &mut self.pending,
            OperationKind::Insert,
            entity,
            hooks,
        ))
    }

    fn update(
        &mut self,
        entity: TableEntity,
        hooks: &mut dyn CommitHooks,
    ) -> StoreResult<Dispatch> {
        Ok(queue_mutation(
            &mut self.pending,
            OperationKind::Update,
            entity,
            hooks,
        ))
    }

    fn delete(
        &mut self,
        entity: TableEntity,
        hooks: &mut dyn CommitHooks,
    ) -> StoreResult<Dispatch> {
        Ok(queue_mutation(
            &mut self.pending,
            OperationKind::Delete,
            entity,
            hooks,
        ))
    }

    fn commit(&mut self, hooks: &mut dyn CommitHooks) -> StoreResult<BatchSummary> {
        let pending = std::mem::take(&mut self.pending);
        let mut staged = self.rows.clone();
        let mut summary = BatchSummary::default();
        let timestamp = now_epoch_ms();

        for PendingMutation { kind, mut entity } in pending {
            match kind {
                OperationKind::Insert => {
                    ensure_storable(&entity)?;
                    if staged.contains_key(&entity.key) {
                        return Err(StoreError::EntityAlreadyExists(entity.key));
                    }
                    entity.timestamp = Some(timestamp);
                    staged.insert(entity.key.clone(), entity);
                }
                OperationKind::Update => {
                    ensure_storable(&entity)?;
                    if !staged.contains_key(&entity.key) {
                        return Err(StoreError::EntityNotFound(entity.key));
                    }
                    entity.timestamp = Some(timestamp);
                    staged.insert(entity.key.clone(), entity);
                }
                OperationKind::Delete => {
                    if staged.remove(&entity.key).is_none() {
                        return Err(StoreError::EntityNotFound(entity.key));
                    }
                }
            }
            summary.record(kind);
        }

        self.rows = staged;
        hooks.after_commit(&summary);
        Ok(summary)
    }

    fn discard_pending(&mut self) {
        self.pending.clear();
    }

    fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn query(&self, filters: &[Filter]) -> StoreResult<Vec<TableEntity>> {
        Ok(self
            .rows
            .values()
            .filter(|entity| matches_all(filters, entity))
            .cloned()
            .collect())
    }

    fn single(&self, key: &EntityKey) -> StoreResult<Option<TableEntity>> {
        Ok(self.rows.get(key).cloned())
    }
}
