//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `tablerepo_core` linkage and one end-to-end commit.
//! - Keep output deterministic for quick local sanity checks.

use std::process::ExitCode;
use tablerepo_core::db::open_db_in_memory;
use tablerepo_core::{
    EntityKey, FnMapper, SqliteTableStore, TableEntity, TableName, TableRepository,
};

fn main() -> ExitCode {
    println!("tablerepo_core version={}", tablerepo_core::core_version());
    match run_smoke() {
        Ok(rows) => {
            println!("tablerepo_core smoke=ok rows={rows}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("tablerepo_core smoke=error error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run_smoke() -> Result<usize, Box<dyn std::error::Error>> {
    let conn = open_db_in_memory()?;
    let store = SqliteTableStore::new(&conn, TableName::new("smoke")?)?;
    let mapper = FnMapper::new(
        |(key, name): &(EntityKey, String)| {
            TableEntity::new(key.clone()).with("name", name.as_str())
        },
        |entity: TableEntity| {
            let name = entity.get_str("name").unwrap_or_default().to_string();
            (entity.key, name)
        },
    );

    let mut repo = TableRepository::new(store, mapper);
    for (row_key, name) in [("1", "a"), ("2", "b")] {
        repo.insert((EntityKey::new("smoke", row_key)?, name.to_string()))?;
    }
    repo.commit()?;
    Ok(repo.query(&[])?.len())
}
