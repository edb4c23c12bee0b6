//! Query expressions and deferred query handles.
//!
//! # Responsibility
//! - Define the filter algebra that stores compile or evaluate.
//! - Expose unmapped, re-runnable queries for raw row access.

pub mod filter;
mod table_query;

pub use table_query::TableQuery;
