// concord-core/src/application/validation.rs
//
// Contract checks against a materialised relation. Any failure here is fatal:
// a contract-incompatible export must never be published.

use tracing::info;

use crate::domain::identity::resolver::quote_ident;
use crate::domain::quality::{Baseline, SchemaContract};
use crate::error::ConcordError;
use crate::ports::connector::Connector;

/// Column names, order and types of `table` against the contract.
pub async fn validate_structure(
    connector: &dyn Connector,
    table: &str,
    contract: &SchemaContract,
) -> Result<(), ConcordError> {
    let actual = connector.fetch_columns(table).await?;
    contract.validate_columns(&actual)?;
    info!(table, columns = actual.len(), "Export shape matches contract");
    Ok(())
}

/// Row count of `table` against the contract baseline. Returns the row count.
pub async fn validate_baseline(
    connector: &dyn Connector,
    table: &str,
    contract: &SchemaContract,
) -> Result<u64, ConcordError> {
    let actual = count_rows(connector, table).await?;

    if let Some(baseline) = &contract.baseline {
        let expected = match baseline {
            Baseline::Table(name) => count_rows(connector, name).await?,
            Baseline::RowCount(n) => *n,
        };
        contract.validate_row_count(&baseline.label(), expected, actual)?;
        info!(table, rows = actual, baseline = %baseline.label(), "Row count matches baseline");
    }

    Ok(actual)
}

pub async fn count_rows(connector: &dyn Connector, table: &str) -> Result<u64, ConcordError> {
    connector
        .query_scalar(&format!("SELECT count(*) FROM {}", quote_ident(table)))
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::mock::MockConnector;
    use crate::domain::error::DomainError;
    use crate::domain::quality::ContractColumn;
    use crate::ports::connector::ColumnSchema;

    fn contract(baseline: Option<Baseline>) -> SchemaContract {
        SchemaContract {
            columns: vec![
                ContractColumn::new("canonical_id", "VARCHAR"),
                ContractColumn::new("txn_ts", "TIMESTAMP"),
            ],
            baseline,
        }
    }

    #[tokio::test]
    async fn test_structure_ok() {
        let connector = MockConnector::new().with_schema(
            "export",
            vec![
                ColumnSchema::new("canonical_id", "VARCHAR"),
                ColumnSchema::new("txn_ts", "TIMESTAMP"),
            ],
        );
        assert!(validate_structure(&connector, "export", &contract(None)).await.is_ok());
    }

    #[tokio::test]
    async fn test_structure_drift_is_contract_violation() {
        let connector = MockConnector::new().with_schema(
            "export",
            vec![
                ColumnSchema::new("txn_ts", "TIMESTAMP"),
                ColumnSchema::new("canonical_id", "VARCHAR"),
            ],
        );
        let err = validate_structure(&connector, "export", &contract(None))
            .await
            .unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[tokio::test]
    async fn test_baseline_table_count() {
        let connector = MockConnector::new()
            .with_count("export", 10)
            .with_count("raw_events", 10);
        let rows = validate_baseline(
            &connector,
            "export",
            &contract(Some(Baseline::Table("raw_events".into()))),
        )
        .await
        .unwrap();
        assert_eq!(rows, 10);
    }

    #[tokio::test]
    async fn test_baseline_mismatch_is_fatal() {
        let connector = MockConnector::new().with_count("export", 9);
        let err = validate_baseline(&connector, "export", &contract(Some(Baseline::RowCount(10))))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConcordError::Domain(DomainError::BaselineRowCountMismatch {
                expected: 10,
                actual: 9,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_no_baseline_only_counts() {
        let connector = MockConnector::new().with_count("export", 3);
        assert_eq!(
            validate_baseline(&connector, "export", &contract(None)).await.unwrap(),
            3
        );
    }
}
