// concord/src/commands/query.rs
//
// USE CASE: Execute a raw SQL query (ad-hoc).

use anyhow::Context;
use concord_core::application::execute_query;
use concord_core::infrastructure::adapters::duckdb::DuckDBConnector;

use super::render;

pub async fn execute(query: String, db_path: String) -> anyhow::Result<()> {
    let connector = DuckDBConnector::new(&db_path)
        .with_context(|| format!("Failed to open DuckDB at {}", db_path))?;

    let output = execute_query(&connector, &query)
        .await
        .with_context(|| format!("Query failed: {}", query))?;

    if output.columns.is_empty() {
        println!("✅ Statement executed.");
    } else {
        println!("{}", render(&output));
        println!("({} rows)", output.rows.len());
    }
    Ok(())
}
