//! Unit-of-work repository over partitioned table stores.
//!
//! Domain values are queued in a journal, mapped to keyed rows at commit
//! time and replayed in submission order against a `TableStore` batch.

pub mod config;
pub mod db;
pub mod hooks;
pub mod journal;
pub mod logging;
pub mod mapper;
pub mod model;
pub mod query;
pub mod repo;
pub mod store;

pub use config::{DbConfig, LoggingConfig, TableName, TableNameError};
pub use hooks::{BatchSummary, CommitHooks, MutationContext, NoopHooks};
pub use journal::{Journal, JournalEntry, JournalError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use mapper::{EntityMapper, FnMapper};
pub use model::entity::{PropertyValue, TableEntity};
pub use model::key::{EntityKey, KeyError};
pub use model::operation::{EntityState, OperationKind};
pub use query::filter::{CompareOp, Filter};
pub use query::TableQuery;
pub use repo::table_repo::{CommitSummary, RepoError, RepoResult, TableRepository};
pub use store::{
    Dispatch, MemoryTableStore, SqliteTableStore, StoreError, StoreResult, TableStore,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
