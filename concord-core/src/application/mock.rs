// concord-core/src/application/mock.rs
//
// In-memory Connector for use-case tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use regex::Regex;

use crate::error::ConcordError;
use crate::ports::connector::{ColumnSchema, Connector, Row};

#[derive(Clone, Default)]
pub struct MockConnector {
    pub executed_queries: Arc<Mutex<Vec<String>>>,
    pub registered: Arc<Mutex<Vec<(String, String)>>>,
    pub columns: HashMap<String, Vec<ColumnSchema>>,
    pub rows: HashMap<String, Vec<Row>>,
    pub scalars: HashMap<String, u64>,
}

#[allow(clippy::unwrap_used)]
impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a relation with text columns and its rows.
    pub fn with_table(mut self, name: &str, columns: &[&str], rows: Vec<Vec<Option<&str>>>) -> Self {
        self.columns.insert(
            name.to_string(),
            columns
                .iter()
                .map(|c| ColumnSchema::new(*c, "VARCHAR"))
                .collect(),
        );
        let count = rows.len() as u64;
        self.rows.insert(
            name.to_string(),
            rows.into_iter()
                .map(|r| r.into_iter().map(|v| v.map(str::to_string)).collect())
                .collect(),
        );
        self.scalars.insert(name.to_string(), count);
        self
    }

    pub fn with_schema(mut self, name: &str, columns: Vec<ColumnSchema>) -> Self {
        self.columns.insert(name.to_string(), columns);
        self
    }

    pub fn with_count(mut self, name: &str, count: u64) -> Self {
        self.scalars.insert(name.to_string(), count);
        self
    }

    /// Statements seen by `execute` and `query_rows`, in order.
    pub fn queries(&self) -> Vec<String> {
        self.executed_queries.lock().unwrap().clone()
    }

    fn table_in(&self, query: &str, known: impl Iterator<Item = String>) -> Option<String> {
        known
            .filter(|name| query.contains(&format!("FROM \"{}\"", name)))
            .max_by_key(|name| name.len())
    }
}

#[allow(clippy::unwrap_used)]
#[async_trait]
impl Connector for MockConnector {
    async fn execute(&self, query: &str) -> Result<(), ConcordError> {
        self.executed_queries
            .lock()
            .unwrap()
            .push(query.to_string());
        Ok(())
    }

    async fn fetch_columns(&self, table_name: &str) -> Result<Vec<ColumnSchema>, ConcordError> {
        Ok(self.columns.get(table_name).cloned().unwrap_or_default())
    }

    async fn register_source(&self, name: &str, path: &str) -> Result<(), ConcordError> {
        self.registered
            .lock()
            .unwrap()
            .push((name.to_string(), path.to_string()));
        Ok(())
    }

    async fn query_rows(&self, query: &str, width: usize) -> Result<Vec<Row>, ConcordError> {
        self.executed_queries
            .lock()
            .unwrap()
            .push(query.to_string());
        let Some(table) = self.table_in(query, self.rows.keys().cloned()) else {
            return Ok(vec![]);
        };
        let rows = self.rows.get(&table).cloned().unwrap_or_default();
        let columns = self.columns.get(&table).cloned().unwrap_or_default();

        // Emulates the `CAST(<col|NULL> AS VARCHAR)` projections built by the resolver
        let cast = Regex::new(r#"CAST\((NULL|"([^"]+)") AS VARCHAR\)"#).unwrap();
        let projection: Vec<Option<usize>> = cast
            .captures_iter(query)
            .map(|c| {
                c.get(2)
                    .and_then(|col| columns.iter().position(|s| s.name == col.as_str()))
            })
            .collect();

        Ok(rows
            .into_iter()
            .map(|r| {
                let mut out: Row = if projection.is_empty() {
                    r
                } else {
                    projection
                        .iter()
                        .map(|idx| idx.and_then(|i| r.get(i).cloned().flatten()))
                        .collect()
                };
                out.resize(width, None);
                out
            })
            .collect())
    }

    async fn query_scalar(&self, query: &str) -> Result<u64, ConcordError> {
        let table = self.table_in(query, self.scalars.keys().cloned());
        table
            .and_then(|t| self.scalars.get(&t).copied())
            .ok_or_else(|| ConcordError::InternalError(format!("no scalar for: {}", query)))
    }
}
