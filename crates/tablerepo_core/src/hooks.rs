//! Commit-time interception points.
//!
//! # Responsibility
//! - Let callers stamp or veto each storage mutation right before a store
//!   queues it.
//! - Notify once after a batch has been flushed successfully.
//!
//! # Invariants
//! - Exactly one `before_*` call per dispatched mutation, matching its kind.
//! - `after_commit` fires once per successful batch and never on failure.
//! - Hooks see the storage entity, not the domain entity.

use crate::model::entity::TableEntity;
use crate::model::operation::OperationKind;

/// Counts of mutations applied by one successful batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }

    /// Counts one applied mutation.
    pub fn record(&mut self, kind: OperationKind) {
        match kind {
            OperationKind::Insert => self.inserted += 1,
            OperationKind::Update => self.updated += 1,
            OperationKind::Delete => self.deleted += 1,
        }
    }
}

/// Mutable view of one storage entity about to be queued.
#[derive(Debug)]
pub struct MutationContext<'a> {
    kind: OperationKind,
    entity: &'a mut TableEntity,
    cancelled: bool,
}

impl<'a> MutationContext<'a> {
    pub fn new(kind: OperationKind, entity: &'a mut TableEntity) -> Self {
        Self {
            kind,
            entity,
            cancelled: false,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn entity(&self) -> &TableEntity {
        &*self.entity
    }

    pub fn entity_mut(&mut self) -> &mut TableEntity {
        &mut *self.entity
    }

    /// Drops this single mutation; the rest of the batch proceeds.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Commit interception callbacks. Every method defaults to a no-op.
pub trait CommitHooks {
    fn before_insert(&mut self, _ctx: &mut MutationContext<'_>) {}

    fn before_update(&mut self, _ctx: &mut MutationContext<'_>) {}

    fn before_delete(&mut self, _ctx: &mut MutationContext<'_>) {}

    fn after_commit(&mut self, _summary: &BatchSummary) {}
}

/// Hook set that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl CommitHooks for NoopHooks {}

/// Runs the `before_*` hook matching `kind`.
///
/// Returns `false` when the hook cancelled the mutation. Store adapters call
/// this from their dispatch methods so every adapter fires hooks alike.
pub fn run_before_hook(
    hooks: &mut dyn CommitHooks,
    kind: OperationKind,
    entity: &mut TableEntity,
) -> bool {
    let mut ctx = MutationContext::new(kind, entity);
    match kind {
        OperationKind::Insert => hooks.before_insert(&mut ctx),
        OperationKind::Update => hooks.before_update(&mut ctx),
        OperationKind::Delete => hooks.before_delete(&mut ctx),
    }
    !ctx.is_cancelled()
}
