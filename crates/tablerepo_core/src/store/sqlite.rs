//! SQLite-backed table store.
//!
//! # Responsibility
//! - Persist rows of one logical table into `table_entities`.
//! - Keep SQL details inside the store boundary.
//!
//! # Invariants
//! - A batch runs inside one SQLite transaction; any failing mutation rolls
//!   the whole batch back.
//! - Properties are stored as tagged JSON and must decode on read; a row that
//!   would not decode fails its batch instead of being written.
//! - Partition-key equality is pushed down to SQL; every other filter is
//!   evaluated in process with `Filter::matches`.

use super::{
    ensure_storable, now_epoch_ms, queue_mutation, Dispatch, PendingMutation, StoreError,
    StoreResult, TableStore,
};
use crate::config::TableName;
use crate::hooks::{BatchSummary, CommitHooks};
use crate::model::entity::{PropertyValue, TableEntity};
use crate::model::key::EntityKey;
use crate::model::operation::OperationKind;
use crate::query::filter::{matches_all, partition_key_of, Filter};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::BTreeMap;

const ENTITY_SELECT_SQL: &str = "SELECT
    partition_key,
    row_key,
    properties,
    timestamp_ms
FROM table_entities";

type RawRow = (String, String, String, i64);

/// Adapter storing one logical table in a migrated SQLite connection.
pub struct SqliteTableStore<'conn> {
    conn: &'conn Connection,
    table: TableName,
    pending: Vec<PendingMutation>,
}

impl<'conn> SqliteTableStore<'conn> {
    /// Binds a store to `table`, registering the table if it is new.
    ///
    /// `conn` must come from `db::open_db*` so the schema is migrated.
    pub fn new(conn: &'conn Connection, table: TableName) -> StoreResult<Self> {
        conn.execute(
            "INSERT OR IGNORE INTO table_registry (table_name) VALUES (?1);",
            [table.as_str()],
        )?;
        Ok(Self {
            conn,
            table,
            pending: Vec::new(),
        })
    }

    pub fn table_name(&self) -> &TableName {
        &self.table
    }

    /// Number of committed rows in this table.
    pub fn row_count(&self) -> StoreResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM table_entities WHERE table_name = ?1;",
            [self.table.as_str()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Names of every registered table, ascending.
    pub fn list_tables(conn: &Connection) -> StoreResult<Vec<String>> {
        let mut stmt =
            conn.prepare("SELECT table_name FROM table_registry ORDER BY table_name ASC;")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn apply(
        &self,
        tx: &rusqlite::Transaction<'_>,
        mutation: &PendingMutation,
        timestamp: i64,
    ) -> StoreResult<()> {
        let key = &mutation.entity.key;
        if mutation.kind != OperationKind::Delete {
            ensure_storable(&mutation.entity)?;
        }
        let changed = match mutation.kind {
            OperationKind::Insert => tx.execute(
                "INSERT OR IGNORE INTO table_entities (
                    table_name,
                    partition_key,
                    row_key,
                    properties,
                    timestamp_ms
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    self.table.as_str(),
                    key.partition_key(),
                    key.row_key(),
                    serde_json::to_string(&mutation.entity.properties)?,
                    timestamp,
                ],
            )?,
            OperationKind::Update => tx.execute(
                "UPDATE table_entities
                 SET
                    properties = ?1,
                    timestamp_ms = ?2
                 WHERE table_name = ?3 AND partition_key = ?4 AND row_key = ?5;",
                params![
                    serde_json::to_string(&mutation.entity.properties)?,
                    timestamp,
                    self.table.as_str(),
                    key.partition_key(),
                    key.row_key(),
                ],
            )?,
            OperationKind::Delete => tx.execute(
                "DELETE FROM table_entities
                 WHERE table_name = ?1 AND partition_key = ?2 AND row_key = ?3;",
                params![self.table.as_str(), key.partition_key(), key.row_key()],
            )?,
        };

        if changed == 0 {
            return Err(match mutation.kind {
                OperationKind::Insert => StoreError::EntityAlreadyExists(key.clone()),
                OperationKind::Update | OperationKind::Delete => {
                    StoreError::EntityNotFound(key.clone())
                }
            });
        }
        Ok(())
    }
}

impl TableStore for SqliteTableStore<'_> {
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
        let timestamp = now_epoch_ms();
        let mut summary = BatchSummary::default();

        // Dropping `tx` on an early return rolls the batch back.
        let tx = self.conn.unchecked_transaction()?;
        for mutation in &pending {
            self.apply(&tx, mutation, timestamp)?;
            summary.record(mutation.kind);
        }
        tx.commit()?;

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
        let mut sql = format!("{ENTITY_SELECT_SQL} WHERE table_name = ?");
        let mut bind_values = vec![Value::Text(self.table.as_str().to_string())];

        if let Some(partition_key) = partition_key_of(filters) {
            sql.push_str(" AND partition_key = ?");
            bind_values.push(Value::Text(partition_key.to_string()));
        }
        sql.push_str(" ORDER BY partition_key ASC, row_key ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let raw_rows = stmt
            .query_map(params_from_iter(bind_values), |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<Result<Vec<RawRow>, _>>()?;

        let mut entities = Vec::new();
        for raw in raw_rows {
            let entity = parse_entity_row(raw)?;
            if matches_all(filters, &entity) {
                entities.push(entity);
            }
        }
        Ok(entities)
    }

    fn single(&self, key: &EntityKey) -> StoreResult<Option<TableEntity>> {
        let raw: Option<RawRow> = self
            .conn
            .query_row(
                &format!(
                    "{ENTITY_SELECT_SQL}
                     WHERE table_name = ?1 AND partition_key = ?2 AND row_key = ?3;"
                ),
                params![self.table.as_str(), key.partition_key(), key.row_key()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        raw.map(parse_entity_row).transpose()
    }
}

fn parse_entity_row(
    (partition_key, row_key, properties, timestamp): RawRow,
) -> StoreResult<TableEntity> {
    let key = EntityKey::new(partition_key, row_key).map_err(|err| {
        StoreError::InvalidData(format!("invalid key in table_entities: {err}"))
    })?;
    let properties: BTreeMap<String, PropertyValue> = serde_json::from_str(&properties)
        .map_err(|err| {
            StoreError::InvalidData(format!(
                "invalid properties json for `{key}` in table_entities.properties: {err}"
            ))
        })?;

    Ok(TableEntity {
        key,
        properties,
        timestamp: Some(timestamp),
    })
}
