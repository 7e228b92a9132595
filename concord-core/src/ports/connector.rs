// concord-core/src/ports/connector.rs

// This file defines what the pipeline needs from a SQL engine, without knowing how it's done.
// The reconciliation core only ever sees column descriptions and string-typed rows.

use crate::error::ConcordError;
use async_trait::async_trait;

/// Engine-independent description of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
        }
    }
}

/// One result row, every value cast to text by the query (`NULL` -> `None`).
pub type Row = Vec<Option<String>>;

#[async_trait]
pub trait Connector: Send + Sync {
    async fn execute(&self, query: &str) -> Result<(), ConcordError>;

    async fn fetch_columns(&self, table_name: &str) -> Result<Vec<ColumnSchema>, ConcordError>;

    /// Expose a file (csv, parquet, json) as a queryable view named `name`.
    /// Every column of the view is text.
    async fn register_source(&self, name: &str, path: &str) -> Result<(), ConcordError>;

    /// Runs `query` and returns `width` text columns per row.
    async fn query_rows(&self, query: &str, width: usize) -> Result<Vec<Row>, ConcordError>;

    async fn query_scalar(&self, query: &str) -> Result<u64, ConcordError>;
}
