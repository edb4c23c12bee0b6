#![allow(dead_code)]

use tablerepo_core::hooks::BatchSummary;
use tablerepo_core::store::EntityResolver;
use tablerepo_core::{
    CommitHooks, Dispatch, EntityKey, EntityMapper, Filter, MemoryTableStore, MutationContext,
    OperationKind, StoreError, StoreResult, TableEntity, TableStore,
};

pub const CUSTOMER_PARTITION: &str = "customers";

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: u32,
    pub name: String,
    pub tier: i64,
    pub active: bool,
}

impl Customer {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            tier: 1,
            active: true,
        }
    }
}

pub fn customer_key(id: u32) -> EntityKey {
    EntityKey::new(CUSTOMER_PARTITION, format!("{id:08}")).unwrap()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerMapper;

impl EntityMapper for CustomerMapper {
    type Domain = Customer;

    fn map_to_entity(&self, customer: &Customer) -> TableEntity {
        TableEntity::new(customer_key(customer.id))
            .with("id", i64::from(customer.id))
            .with("name", customer.name.as_str())
            .with("tier", customer.tier)
            .with("active", customer.active)
    }

    fn map_from_entity(&self, entity: TableEntity) -> Customer {
        Customer {
            id: entity
                .get_i64("id")
                .and_then(|id| u32::try_from(id).ok())
                .unwrap_or_default(),
            name: entity.get_str("name").unwrap_or_default().to_string(),
            tier: entity.get_i64("tier").unwrap_or_default(),
            active: entity.get_bool("active").unwrap_or_default(),
        }
    }
}

/// Store call observed by `RecordingStore`, keyed by row key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Insert(String),
    Update(String),
    Delete(String),
    Commit,
}

/// Memory store wrapper that records calls and injects failures.
#[derive(Debug, Default)]
pub struct RecordingStore {
    pub inner: MemoryTableStore,
    pub calls: Vec<StoreCall>,
    /// Zero-based dispatch index that fails with `InvalidData`.
    pub fail_dispatch_at: Option<usize>,
    pub fail_commit: bool,
    dispatches: usize,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
        self.dispatches = 0;
    }

    fn dispatch(
        &mut self,
        kind: OperationKind,
        entity: TableEntity,
        hooks: &mut dyn CommitHooks,
    ) -> StoreResult<Dispatch> {
        let row_key = entity.key.row_key().to_string();
        let index = self.dispatches;
        self.dispatches += 1;
        if self.fail_dispatch_at == Some(index) {
            return Err(StoreError::InvalidData(format!(
                "injected dispatch failure at {index}"
            )));
        }
        self.calls.push(match kind {
            OperationKind::Insert => StoreCall::Insert(row_key),
            OperationKind::Update => StoreCall::Update(row_key),
            OperationKind::Delete => StoreCall::Delete(row_key),
        });
        match kind {
            OperationKind::Insert => self.inner.insert(entity, hooks),
            OperationKind::Update => self.inner.update(entity, hooks),
            OperationKind::Delete => self.inner.delete(entity, hooks),
        }
    }
}

impl TableStore for RecordingStore {
    fn insert(
        &mut self,
        entity: TableEntity,
        hooks: &mut dyn CommitHooks,
    ) -> StoreResult<Dispatch> {
        self.dispatch(OperationKind::Insert, entity, hooks)
    }

    fn update(
        &mut self,
        entity: TableEntity,
        hooks: &mut dyn CommitHooks,
    ) -> StoreResult<Dispatch> {
        self.dispatch(OperationKind::Update, entity, hooks)
    }

    fn delete(
        &mut self,
        entity: TableEntity,
        hooks: &mut dyn CommitHooks,
    ) -> StoreResult<Dispatch> {
        self.dispatch(OperationKind::Delete, entity, hooks)
    }

    fn commit(&mut self, hooks: &mut dyn CommitHooks) -> StoreResult<BatchSummary> {
        self.calls.push(StoreCall::Commit);
        if self.fail_commit {
            self.inner.discard_pending();
            return Err(StoreError::InvalidData("injected commit failure".to_string()));
        }
        self.inner.commit(hooks)
    }

    fn discard_pending(&mut self) {
        self.inner.discard_pending();
    }

    fn pending_len(&self) -> usize {
        self.inner.pending_len()
    }

    fn query(&self, filters: &[Filter]) -> StoreResult<Vec<TableEntity>> {
        self.inner.query(filters)
    }

    fn query_with_resolver(
        &self,
        resolver: EntityResolver<'_>,
        filters: &[Filter],
    ) -> StoreResult<Vec<TableEntity>> {
        self.inner.query_with_resolver(resolver, filters)
    }
}

/// Hook set counting every callback in firing order.
#[derive(Debug, Default)]
pub struct CountingHooks {
    pub events: Vec<String>,
    pub before_insert: usize,
    pub before_update: usize,
    pub before_delete: usize,
    pub after_commit: usize,
    pub last_batch: Option<BatchSummary>,
    /// When set, `before_delete` cancels the mutation.
    pub veto_deletes: bool,
    /// When set, `before_insert` stamps an `audited` property.
    pub stamp_inserts: bool,
}

impl CommitHooks for CountingHooks {
    fn before_insert(&mut self, ctx: &mut MutationContext<'_>) {
        self.before_insert += 1;
        self.events
            .push(format!("before_insert:{}", ctx.entity().key.row_key()));
        if self.stamp_inserts {
            ctx.entity_mut().set("audited", true);
        }
    }

    fn before_update(&mut self, ctx: &mut MutationContext<'_>) {
        self.before_update += 1;
        self.events
            .push(format!("before_update:{}", ctx.entity().key.row_key()));
    }

    fn before_delete(&mut self, ctx: &mut MutationContext<'_>) {
        self.before_delete += 1;
        self.events
            .push(format!("before_delete:{}", ctx.entity().key.row_key()));
        if self.veto_deletes {
            ctx.cancel();
        }
    }

    fn after_commit(&mut self, summary: &BatchSummary) {
        self.after_commit += 1;
        self.events.push("after_commit".to_string());
        self.last_batch = Some(*summary);
    }
}
