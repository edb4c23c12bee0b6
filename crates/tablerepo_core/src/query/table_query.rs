//! Deferred, restartable query over raw storage entities.

use crate::model::entity::TableEntity;
use crate::query::filter::Filter;
use crate::store::{StoreResult, TableStore};

/// Unmapped query bound to a store; nothing runs until `execute()`.
///
/// Every `execute()` re-runs against the store and sees rows committed since
/// the previous run.
pub struct TableQuery<'s, S: TableStore + ?Sized> {
    store: &'s S,
    filters: Vec<Filter>,
}

impl<'s, S: TableStore + ?Sized> TableQuery<'s, S> {
    pub fn new(store: &'s S, filters: Vec<Filter>) -> Self {
        Self { store, filters }
    }

    /// Adds one more ANDed filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn execute(&self) -> StoreResult<Vec<TableEntity>> {
        self.store.query(&self.filters)
    }

    pub fn first(&self) -> StoreResult<Option<TableEntity>> {
        self.store.first(&self.filters)
    }

    pub fn count(&self) -> StoreResult<usize> {
        Ok(self.execute()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::TableQuery;
    use crate::hooks::NoopHooks;
    use crate::model::entity::TableEntity;
    use crate::model::key::EntityKey;
    use crate::query::filter::Filter;
    use crate::store::{MemoryTableStore, TableStore};

    #[test]
    fn execute_is_restartable() {
        let mut store = MemoryTableStore::new();
        store
            .insert(
                TableEntity::new(EntityKey::new("p", "1").unwrap()).with("on", true),
                &mut NoopHooks,
            )
            .unwrap();
        store.commit(&mut NoopHooks).unwrap();

        let query = TableQuery::new(&store, Vec::new()).filter(Filter::eq("on", true));
        assert_eq!(query.count().unwrap(), 1);
        assert_eq!(query.count().unwrap(), 1);
        assert!(query.first().unwrap().is_some());
    }
}
