// concord-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DuckDB Engine Error: {0}")]
    #[diagnostic(
        code(concord::infra::database::duckdb),
        help("An error occurred inside the SQL engine.")
    )]
    DuckDB(#[from] duckdb::Error),

    #[error("DuckDB connection lock poisoned")]
    #[diagnostic(code(concord::infra::database::poisoned))]
    Poisoned,

    #[error("Query returned no row: {0}")]
    #[diagnostic(code(concord::infra::database::empty))]
    NoRow(String),
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- DATABASE (Abstracted) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(concord::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error in {path}: {source}")]
    #[diagnostic(
        code(concord::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(concord::infra::config))]
    ConfigError(String),

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(
        code(concord::infra::config_missing),
        help("Create a concord.yaml at the project root or pass --project-dir.")
    )]
    ConfigNotFound(String),

    // --- ARTEFACTS ---
    #[error("JSON Error: {0}")]
    #[diagnostic(code(concord::infra::json))]
    Json(#[from] serde_json::Error),

    #[error("CSV Error: {0}")]
    #[diagnostic(code(concord::infra::csv))]
    Csv(#[from] csv::Error),

    #[error("Source feed '{feed}' not found at '{path}'")]
    #[diagnostic(
        code(concord::infra::source_missing),
        help("Check the `sources` section of concord.yaml.")
    )]
    SourceNotFound { feed: String, path: String },

    #[error("Another run holds the publication lock at '{0}'")]
    #[diagnostic(
        code(concord::infra::lock_busy),
        help("Wait for the other run to finish. Remove the lock file only if no run is active.")
    )]
    PublishLockBusy(String),
}

// Manual implementation for shortcuts (e.g. `?` operator on duckdb calls)
impl From<duckdb::Error> for InfrastructureError {
    fn from(err: duckdb::Error) -> Self {
        InfrastructureError::Database(DatabaseError::DuckDB(err))
    }
}
