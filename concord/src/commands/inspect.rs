// concord/src/commands/inspect.rs
//
// USE CASE: Inspect a DuckDB table (schema + sample rows).

use std::path::Path;

use anyhow::Context;
use concord_core::application::inspect_table;
use concord_core::infrastructure::adapters::duckdb::DuckDBConnector;

use super::render;

pub async fn execute(db_path: String, table: String, limit: usize) -> anyhow::Result<()> {
    if !Path::new(&db_path).exists() {
        anyhow::bail!(
            "❌ Database not found at: {}\n👉 Have you run 'concord run'?",
            db_path
        );
    }

    let connector = DuckDBConnector::new(&db_path)
        .with_context(|| format!("Failed to open DuckDB at {}", db_path))?;

    println!("\n🔍 Inspecting Table: '{}'", table);
    let output = inspect_table(&connector, &table, limit).await?;
    println!("   --- Rows (Limit {}) ---", limit);
    println!("{}", render(&output));

    Ok(())
}
