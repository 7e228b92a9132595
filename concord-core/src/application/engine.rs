// concord-core/src/application/engine.rs

use std::time::Instant;
use tracing::{debug, error, instrument};

use crate::domain::identity::resolver::quote_ident;
use crate::error::ConcordError;
use crate::ports::connector::{Connector, Row};

const ADHOC_VIEW: &str = "__concord_adhoc";

/// Tabular result of an ad-hoc statement. Empty for statements without rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

fn returns_rows(query: &str) -> bool {
    let first = query
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    matches!(first.as_str(), "select" | "with" | "from" | "values" | "table")
}

/// Runs a raw SQL statement with timing. Row-returning statements come back
/// as text cells.
#[instrument(skip(connector), fields(query.len = query.len()))]
pub async fn execute_query(
    connector: &dyn Connector,
    query: &str,
) -> Result<QueryOutput, ConcordError> {
    let start = Instant::now();
    debug!("Executing Query: {}", query);

    let result = if returns_rows(query) {
        fetch_as_text(connector, query).await
    } else {
        connector.execute(query).await.map(|_| QueryOutput::default())
    };

    match &result {
        Ok(out) => debug!(rows = out.rows.len(), "Query finished in {:.2?}", start.elapsed()),
        Err(e) => error!("Query failed after {:.2?}: {}", start.elapsed(), e),
    }
    result
}

async fn fetch_as_text(connector: &dyn Connector, query: &str) -> Result<QueryOutput, ConcordError> {
    let view = quote_ident(ADHOC_VIEW);
    let body = query.trim().trim_end_matches(';');
    connector
        .execute(&format!("CREATE OR REPLACE TEMP VIEW {} AS {}", view, body))
        .await?;

    let columns: Vec<String> = connector
        .fetch_columns(ADHOC_VIEW)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    let rows = connector
        .query_rows(
            &format!("SELECT COLUMNS(*)::VARCHAR FROM {}", view),
            columns.len(),
        )
        .await?;

    connector.execute(&format!("DROP VIEW IF EXISTS {}", view)).await?;
    Ok(QueryOutput { columns, rows })
}

/// Schema and first `limit` rows of a table.
pub async fn inspect_table(
    connector: &dyn Connector,
    table: &str,
    limit: usize,
) -> Result<QueryOutput, ConcordError> {
    let columns = connector.fetch_columns(table).await?;
    if columns.is_empty() {
        return Err(ConcordError::InternalError(format!(
            "Table '{}' not found or has no columns",
            table
        )));
    }
    let rows = connector
        .query_rows(
            &format!(
                "SELECT COLUMNS(*)::VARCHAR FROM {} LIMIT {}",
                quote_ident(table),
                limit
            ),
            columns.len(),
        )
        .await?;
    Ok(QueryOutput {
        columns: columns
            .into_iter()
            .map(|c| format!("{} ({})", c.name, c.data_type))
            .collect(),
        rows,
    })
}
