// concord-core/src/domain/quality/contract.rs

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::export::EXPORT_COLUMNS;
use crate::ports::ColumnSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

impl ContractColumn {
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
        }
    }
}

/// Dataset the export row count must equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Baseline {
    /// Count of a registered relation, usually the raw event feed.
    Table(String),
    RowCount(u64),
}

/// Published, order-sensitive shape of the canonical export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaContract {
    pub columns: Vec<ContractColumn>,
    #[serde(default = "default_baseline")]
    pub baseline: Option<Baseline>,
}

fn default_baseline() -> Option<Baseline> {
    Some(Baseline::Table("raw_events".to_string()))
}

impl Default for SchemaContract {
    fn default() -> Self {
        Self {
            columns: EXPORT_COLUMNS
                .iter()
                .map(|(name, ty)| ContractColumn::new(name, ty))
                .collect(),
            baseline: default_baseline(),
        }
    }
}

impl SchemaContract {
    /// Position-for-position check. The first mismatch aborts publication.
    pub fn validate_columns(&self, actual: &[ColumnSchema]) -> Result<(), DomainError> {
        let width = self.columns.len().max(actual.len());

        for position in 0..width {
            let expected = self.columns.get(position);
            let found = actual.get(position);

            let matches = match (expected, found) {
                (Some(e), Some(a)) => {
                    e.name == a.name && canonical_type(&e.data_type) == canonical_type(&a.data_type)
                }
                _ => false,
            };

            if !matches {
                return Err(DomainError::SchemaContractViolation {
                    position: position + 1,
                    expected: expected
                        .map(|e| format!("{} {}", e.name, e.data_type))
                        .unwrap_or_else(|| "<no column>".to_string()),
                    actual: found
                        .map(|a| format!("{} {}", a.name, a.data_type))
                        .unwrap_or_else(|| "<no column>".to_string()),
                });
            }
        }

        Ok(())
    }

    pub fn validate_row_count(
        &self,
        baseline_label: &str,
        expected: u64,
        actual: u64,
    ) -> Result<(), DomainError> {
        if expected != actual {
            return Err(DomainError::BaselineRowCountMismatch {
                baseline: baseline_label.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}

impl Baseline {
    pub fn label(&self) -> String {
        match self {
            Baseline::Table(name) => name.clone(),
            Baseline::RowCount(n) => format!("fixed count {n}"),
        }
    }
}

/// Engine spellings of the same logical type compare equal.
fn canonical_type(raw: &str) -> String {
    let upper = raw.trim().to_ascii_uppercase();
    match upper.as_str() {
        "TEXT" | "STRING" | "CHAR" | "BPCHAR" => "VARCHAR".to_string(),
        "INT" | "INT4" | "SIGNED" => "INTEGER".to_string(),
        "INT8" | "LONG" => "BIGINT".to_string(),
        "FLOAT8" | "NUMERIC" => "DOUBLE".to_string(),
        "DATETIME" | "TIMESTAMP WITHOUT TIME ZONE" => "TIMESTAMP".to_string(),
        "BOOL" | "LOGICAL" => "BOOLEAN".to_string(),
        _ => upper,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn actual_from_contract(contract: &SchemaContract) -> Vec<ColumnSchema> {
        contract
            .columns
            .iter()
            .map(|c| ColumnSchema::new(c.name.clone(), c.data_type.to_lowercase()))
            .collect()
    }

    #[test]
    fn test_matching_shape_passes() {
        let contract = SchemaContract::default();
        assert!(contract.validate_columns(&actual_from_contract(&contract)).is_ok());
    }

    #[test]
    fn test_type_aliases_are_equivalent() {
        let contract = SchemaContract {
            columns: vec![ContractColumn::new("id", "VARCHAR"), ContractColumn::new("n", "INT")],
            baseline: None,
        };
        let actual = vec![ColumnSchema::new("id", "TEXT"), ColumnSchema::new("n", "INTEGER")];
        assert!(contract.validate_columns(&actual).is_ok());
    }

    #[test]
    fn test_swapped_columns_fail_at_first_position() {
        let contract = SchemaContract::default();
        let mut actual = actual_from_contract(&contract);
        actual.swap(1, 2);

        let err = contract.validate_columns(&actual).unwrap_err();
        assert!(matches!(err, DomainError::SchemaContractViolation { position: 2, .. }));
    }

    #[test]
    fn test_missing_trailing_column_fails() {
        let contract = SchemaContract::default();
        let mut actual = actual_from_contract(&contract);
        actual.pop();

        match contract.validate_columns(&actual) {
            Err(DomainError::SchemaContractViolation { position, actual, .. }) => {
                assert_eq!(position, contract.columns.len());
                assert_eq!(actual, "<no column>");
            }
            other => panic!("expected contract violation, got {other:?}"),
        }
    }

    #[test]
    fn test_type_change_fails() {
        let contract = SchemaContract::default();
        let mut actual = actual_from_contract(&contract);
        let idx = contract
            .columns
            .iter()
            .position(|c| c.name == "total_amount")
            .unwrap_or_default();
        actual[idx].data_type = "VARCHAR".into();
        assert!(contract.validate_columns(&actual).is_err());
    }

    #[test]
    fn test_row_count_mismatch_is_fatal() {
        let contract = SchemaContract::default();
        assert!(contract.validate_row_count("raw_events", 10, 10).is_ok());
        let err = contract.validate_row_count("raw_events", 10, 11).unwrap_err();
        assert_eq!(
            err,
            DomainError::BaselineRowCountMismatch {
                baseline: "raw_events".into(),
                expected: 10,
                actual: 11
            }
        );
    }

    #[test]
    fn test_contract_from_yaml() {
        let yaml = "columns:\n  - { name: canonical_id, type: VARCHAR }\nbaseline:\n  row_count: 3\n";
        let contract: SchemaContract = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(contract.columns.len(), 1);
        assert_eq!(contract.baseline, Some(Baseline::RowCount(3)));
    }
}
