//! Mutation kinds and change-tracking states.

/// Kind of pending mutation recorded in a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Insert,
    Update,
    Delete,
}

impl OperationKind {
    /// Stable lowercase name used in log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Change-tracking state accepted by `TableRepository::attach`.
///
/// Reserved for change tracking; the repository does not act on it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityState {
    #[default]
    Detached,
    Unchanged,
    Added,
    Modified,
    Deleted,
}
