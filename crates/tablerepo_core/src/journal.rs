//! Unit-of-work journal.
//!
//! # Responsibility
//! - Record pending insert/update/delete requests against domain entities.
//! - Hand them back in submission order for replay at commit time.
//!
//! # Invariants
//! - Entries are never coalesced, reordered or validated against each other.
//! - An absent entity is rejected and leaves the journal untouched.
//! - `reset()` empties the journal and is idempotent.
//! - Sequence numbers keep increasing across resets.

use crate::model::operation::OperationKind;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type JournalResult<T> = Result<T, JournalError>;

/// Errors raised while recording a journal entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalError {
    /// No entity was supplied for the requested operation.
    MissingEntity(OperationKind),
}

impl Display for JournalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEntity(kind) => {
                write!(f, "invalid argument: {} requires an entity", kind.as_str())
            }
        }
    }
}

impl Error for JournalError {}

/// One pending mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry<D> {
    pub kind: OperationKind,
    pub entity: D,
    /// Monotonic submission number, unique for the journal lifetime.
    pub sequence: u64,
}

/// Ordered record of pending mutations for one unit of work.
#[derive(Debug, Clone)]
pub struct Journal<D> {
    entries: Vec<JournalEntry<D>>,
    next_sequence: u64,
}

impl<D> Default for Journal<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Journal<D> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_sequence: 0,
        }
    }

    /// Queues an insert. Accepts `entity` or `Some(entity)`; `None` is rejected.
    pub fn insert(&mut self, entity: impl Into<Option<D>>) -> JournalResult<()> {
        self.record(OperationKind::Insert, entity.into())
    }

    /// Queues an update. Accepts `entity` or `Some(entity)`; `None` is rejected.
    pub fn update(&mut self, entity: impl Into<Option<D>>) -> JournalResult<()> {
        self.record(OperationKind::Update, entity.into())
    }

    /// Queues a delete. Accepts `entity` or `Some(entity)`; `None` is rejected.
    pub fn delete(&mut self, entity: impl Into<Option<D>>) -> JournalResult<()> {
        self.record(OperationKind::Delete, entity.into())
    }

    /// Appends one entry of the given kind.
    pub fn record(&mut self, kind: OperationKind, entity: Option<D>) -> JournalResult<()> {
        let entity = entity.ok_or(JournalError::MissingEntity(kind))?;
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.push(JournalEntry {
            kind,
            entity,
            sequence,
        });
        Ok(())
    }

    /// Pending entries exactly as submitted.
    ///
    /// The borrow keeps the journal frozen while the slice is alive.
    pub fn entries(&self) -> &[JournalEntry<D>] {
        &self.entries
    }

    /// Owned copy of the pending entries.
    pub fn snapshot(&self) -> Vec<JournalEntry<D>>
    where
        D: Clone,
    {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of pending entries of one kind.
    pub fn count_of(&self, kind: OperationKind) -> usize {
        self.entries.iter().filter(|entry| entry.kind == kind).count()
    }

    /// Drops every pending entry.
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{Journal, JournalError};
    use crate::model::operation::OperationKind;

    #[test]
    fn keeps_submission_order_without_coalescing() {
        let mut journal: Journal<&str> = Journal::new();
        journal.insert("a").unwrap();
        journal.update("b").unwrap();
        journal.delete("a").unwrap();
        journal.update("a").unwrap();

        let kinds: Vec<_> = journal
            .entries()
            .iter()
            .map(|entry| (entry.kind, entry.entity))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (OperationKind::Insert, "a"),
                (OperationKind::Update, "b"),
                (OperationKind::Delete, "a"),
                (OperationKind::Update, "a"),
            ]
        );
        assert_eq!(journal.count_of(OperationKind::Update), 2);
    }

    #[test]
    fn rejects_missing_entity_without_appending() {
        let mut journal: Journal<u32> = Journal::new();
        journal.insert(1).unwrap();

        assert_eq!(
            journal.insert(None::<u32>).unwrap_err(),
            JournalError::MissingEntity(OperationKind::Insert)
        );
        assert_eq!(
            journal.update(None::<u32>).unwrap_err(),
            JournalError::MissingEntity(OperationKind::Update)
        );
        assert_eq!(
            journal.delete(None::<u32>).unwrap_err(),
            JournalError::MissingEntity(OperationKind::Delete)
        );
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut journal: Journal<u32> = Journal::new();
        journal.insert(1).unwrap();
        journal.reset();
        assert!(journal.is_empty());
        journal.reset();
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn snapshot_does_not_observe_later_entries() {
        let mut journal: Journal<u32> = Journal::new();
        journal.insert(1).unwrap();
        let snapshot = journal.snapshot();
        journal.insert(2).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(journal.len(), 2);
    }

    #[test]
    fn sequence_numbers_survive_reset() {
        let mut journal: Journal<u32> = Journal::new();
        journal.insert(1).unwrap();
        journal.insert(2).unwrap();
        journal.reset();
        journal.insert(3).unwrap();
        assert_eq!(journal.entries()[0].sequence, 2);
    }
}
