// concord-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use duckdb::{Config, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

// Imports Hexagonaux
use crate::domain::identity::resolver::quote_ident;
use crate::error::ConcordError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::connector::{ColumnSchema, Connector, Row};

pub struct DuckDBConnector {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDBConnector {
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();

        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, ConcordError> {
        self.conn
            .lock()
            .map_err(|_| ConcordError::Infrastructure(DatabaseError::Poisoned.into()))
    }
}

fn db_err(e: duckdb::Error) -> ConcordError {
    ConcordError::Infrastructure(InfrastructureError::Database(DatabaseError::DuckDB(e)))
}

const CSV_READER: &str = "read_csv_auto";

/// Table function able to read `path`, picked from its extension.
fn reader_for(path: &str) -> Result<&'static str, ConcordError> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "csv" | "tsv" | "txt" => Ok(CSV_READER),
        "parquet" => Ok("read_parquet"),
        "json" | "ndjson" | "jsonl" => Ok("read_json_auto"),
        other => Err(ConcordError::Infrastructure(InfrastructureError::ConfigError(
            format!(
                "Unsupported source format '{}' for '{}'. Expected csv, tsv, parquet or json.",
                other, path
            ),
        ))),
    }
}

#[async_trait]
impl Connector for DuckDBConnector {
    async fn execute(&self, query: &str) -> Result<(), ConcordError> {
        let conn = self.lock()?;
        conn.execute_batch(query).map_err(db_err)
    }

    async fn fetch_columns(&self, table_name: &str) -> Result<Vec<ColumnSchema>, ConcordError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(&format!(
                "PRAGMA table_info('{}')",
                table_name.replace('\'', "''")
            ))
            .map_err(db_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ColumnSchema {
                    name: row.get("name")?,
                    data_type: row.get("type")?,
                    is_nullable: !row.get::<_, bool>("notnull")?,
                })
            })
            .map_err(db_err)?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row.map_err(db_err)?);
        }

        Ok(columns)
    }

    async fn register_source(&self, name: &str, path: &str) -> Result<(), ConcordError> {
        let reader = reader_for(path)?;
        debug!(name, path, reader, "Registering source view");
        let view = quote_ident(name);
        let path = path.replace('\'', "''");

        // Feeds are read as text so every value reaches the parsers as written
        // (offsets included). Type inference would turn `+08:00` into UTC.
        if reader == CSV_READER {
            return self
                .execute(&format!(
                    "CREATE OR REPLACE VIEW {} AS SELECT * FROM {}('{}', header = true, all_varchar = true)",
                    view, reader, path
                ))
                .await;
        }

        // Typed formats: scan once to learn the columns, then expose them as text.
        let scan = format!("{}('{}')", reader, path);
        self.execute(&format!("CREATE OR REPLACE VIEW {} AS SELECT * FROM {}", view, scan))
            .await?;
        let projection: Vec<String> = self
            .fetch_columns(name)
            .await?
            .iter()
            .map(|c| {
                let col = quote_ident(&c.name);
                format!("CAST({} AS VARCHAR) AS {}", col, col)
            })
            .collect();
        self.execute(&format!(
            "CREATE OR REPLACE VIEW {} AS SELECT {} FROM {}",
            view,
            projection.join(", "),
            scan
        ))
        .await
    }

    async fn query_rows(&self, query: &str, width: usize) -> Result<Vec<Row>, ConcordError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(query).map_err(db_err)?;
        let mut rows = stmt.query([]).map_err(db_err)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(db_err)? {
            let mut values = Vec::with_capacity(width);
            for idx in 0..width {
                values.push(row.get::<_, Option<String>>(idx).map_err(db_err)?);
            }
            out.push(values);
        }
        Ok(out)
    }

    async fn query_scalar(&self, query: &str) -> Result<u64, ConcordError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(query).map_err(db_err)?;
        let mut rows = stmt.query([]).map_err(db_err)?;

        let row = rows.next().map_err(db_err)?.ok_or_else(|| {
            ConcordError::Infrastructure(DatabaseError::NoRow(query.to_string()).into())
        })?;

        let value: i64 = row.get(0).map_err(db_err)?;
        u64::try_from(value)
            .map_err(|_| ConcordError::InternalError(format!("Negative scalar {} from: {}", value, query)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_duckdb_flow() -> Result<()> {
        let connector = DuckDBConnector::new(":memory:")?;

        connector
            .execute("CREATE TABLE interactions (interaction_id VARCHAR, age INTEGER)")
            .await?;

        let columns = connector.fetch_columns("interactions").await?;
        assert_eq!(columns.len(), 2);

        let age = columns
            .iter()
            .find(|c| c.name == "age")
            .ok_or_else(|| anyhow::anyhow!("Column 'age' not found"))?;
        assert_eq!(age.data_type, "INTEGER");
        Ok(())
    }

    #[tokio::test]
    async fn test_query_rows_and_scalar() -> Result<()> {
        let connector = DuckDBConnector::new(":memory:")?;
        connector
            .execute(
                "CREATE TABLE t (id VARCHAR, n INTEGER); \
                 INSERT INTO t VALUES ('ABC-123', 1), (NULL, 2);",
            )
            .await?;

        let rows = connector
            .query_rows("SELECT id, CAST(n AS VARCHAR) FROM t ORDER BY n", 2)
            .await?;
        assert_eq!(
            rows,
            vec![
                vec![Some("ABC-123".to_string()), Some("1".to_string())],
                vec![None, Some("2".to_string())],
            ]
        );

        assert_eq!(connector.query_scalar("SELECT COUNT(*) FROM t").await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_csv_source() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("raw_events.csv");
        fs::write(&path, "transaction_id,store_id\nABC-123,102\nxyz_9,103\n")?;

        let connector = DuckDBConnector::new(":memory:")?;
        connector
            .register_source("raw_events", &path.to_string_lossy())
            .await?;

        let names: Vec<String> = connector
            .fetch_columns("raw_events")
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["transaction_id", "store_id"]);
        assert_eq!(
            connector.query_scalar("SELECT COUNT(*) FROM raw_events").await?,
            2
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_csv_source_keeps_timestamp_text() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("interactions.csv");
        fs::write(
            &path,
            "interaction_id,transaction_date,age\n\
abc123,2025-03-10T14:00:00+08:00,20\n\
def456,2025-03-10T14:30:00Z,31\n",
        )?;

        let connector = DuckDBConnector::new(":memory:")?;
        connector
            .register_source("interactions", &path.to_string_lossy())
            .await?;

        let columns = connector.fetch_columns("interactions").await?;
        assert!(columns.iter().all(|c| c.data_type == "VARCHAR"));

        let rows = connector
            .query_rows("SELECT transaction_date FROM interactions", 1)
            .await?;
        assert_eq!(
            rows,
            vec![
                vec![Some("2025-03-10T14:00:00+08:00".to_string())],
                vec![Some("2025-03-10T14:30:00Z".to_string())],
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_parquet_source_is_exposed_as_text() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("overrides.parquet");
        let connector = DuckDBConnector::new(":memory:")?;
        connector
            .execute(&format!(
                "COPY (SELECT 'abc123' AS canonical_id, TIMESTAMP '2025-03-10 14:00:00' AS override_ts) \
                 TO '{}' (FORMAT PARQUET)",
                path.to_string_lossy()
            ))
            .await?;

        connector
            .register_source("overrides", &path.to_string_lossy())
            .await?;

        let columns = connector.fetch_columns("overrides").await?;
        assert_eq!(columns.len(), 2);
        assert!(columns.iter().all(|c| c.data_type == "VARCHAR"));

        let rows = connector
            .query_rows("SELECT canonical_id, override_ts FROM overrides", 2)
            .await?;
        assert_eq!(rows[0][1].as_deref(), Some("2025-03-10 14:00:00"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unsupported_extension() -> Result<()> {
        let connector = DuckDBConnector::new(":memory:")?;
        let result = connector.register_source("x", "/tmp/data.xlsx").await;
        assert!(result.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_duckdb_error() -> Result<()> {
        let connector = DuckDBConnector::new(":memory:")?;
        let result = connector.execute("SELECT * FROM non_existent_table").await;
        assert!(result.is_err());
        Ok(())
    }
}
