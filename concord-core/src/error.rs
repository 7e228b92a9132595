// concord-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum ConcordError {
    // --- DOMAIN ERRORS (identity, schema resolution, contracts) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (IO, Parsing, DuckDB) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- GENERIC / APPLICATION ERRORS ---
    #[error("Internal Error: {0}")]
    InternalError(String),

    #[error("Unsafe path traversal detected: {0}")]
    UnsafePath(String),
}

impl ConcordError {
    /// True when the run was aborted because the export broke its published contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            ConcordError::Domain(
                DomainError::SchemaContractViolation { .. }
                    | DomainError::BaselineRowCountMismatch { .. }
            )
        )
    }
}

// Manual implementation to avoid duplicate enum variant but keep ergonomics
impl From<std::io::Error> for ConcordError {
    fn from(err: std::io::Error) -> Self {
        ConcordError::Infrastructure(InfrastructureError::Io(err))
    }
}
