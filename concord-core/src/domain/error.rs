// concord-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid identifier: {0:?} is empty after trimming")]
    #[diagnostic(
        code(concord::domain::identifier),
        help("The record is kept but cannot be matched against the system of record.")
    )]
    InvalidIdentifier(String),

    #[error("Schema resolution failed on feed '{feed}': no column found for required field '{field}'")]
    #[diagnostic(
        code(concord::domain::schema_resolution),
        help("Known column names tried: {candidates}. Add the new name to mappings.yml or define a default.")
    )]
    SchemaResolution {
        feed: String,
        field: String,
        candidates: String,
    },

    #[error("Malformed payload: {reason}")]
    #[diagnostic(code(concord::domain::payload))]
    MalformedPayload { reason: String },

    #[error("Schema contract violation at column {position}: expected {expected}, found {actual}")]
    #[diagnostic(
        code(concord::domain::contract),
        help("Downstream consumers bind export columns by position. Fix the export or publish a new contract.")
    )]
    SchemaContractViolation {
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("Baseline row count mismatch against '{baseline}': expected {expected} rows, found {actual}")]
    #[diagnostic(code(concord::domain::baseline))]
    BaselineRowCountMismatch {
        baseline: String,
        expected: u64,
        actual: u64,
    },

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(concord::domain::config))]
    InvalidConfiguration(String),
}
