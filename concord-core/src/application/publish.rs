// concord-core/src/application/publish.rs
//
// Staging -> validation -> promotion. Every artefact is staged first; nothing
// reaches the target directory or the published table unless the export passed
// its contract. Promotion persists the export, then the artefacts in the order
// given (run results last), then swaps the table.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, instrument, warn};

use crate::application::validation::{validate_baseline, validate_structure};
use crate::domain::export::{EXPORT_COLUMNS, export_header, export_record};
use crate::domain::identity::resolver::quote_ident;
use crate::domain::model::CanonicalTransaction;
use crate::domain::persona::{PersonaLabel, PersonaScore};
use crate::domain::quality::SchemaContract;
use crate::error::ConcordError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::connector::Connector;

pub const EXPORT_TABLE: &str = "canonical_transactions";
pub const EXPORT_FILE: &str = "canonical_transactions.csv";

fn staging_table() -> String {
    format!("{}__staging", EXPORT_TABLE)
}

/// A file to publish alongside the export.
pub struct Artefact {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl Artefact {
    pub fn json<T: serde::Serialize>(file_name: &str, value: &T) -> Result<Self, ConcordError> {
        Ok(Self {
            file_name: file_name.to_string(),
            content: serde_json::to_vec_pretty(value).map_err(InfrastructureError::Json)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub rows: u64,
    pub files: Vec<PathBuf>,
}

pub fn render_export_csv(
    transactions: &[CanonicalTransaction],
    personas: &[PersonaScore],
) -> Result<Vec<u8>, ConcordError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(export_header())
        .map_err(InfrastructureError::Csv)?;

    for (idx, txn) in transactions.iter().enumerate() {
        let label = personas
            .get(idx)
            .map(|p| p.label)
            .unwrap_or(PersonaLabel::Unknown);
        writer
            .write_record(export_record(txn, label))
            .map_err(InfrastructureError::Csv)?;
    }

    writer
        .into_inner()
        .map_err(|e| ConcordError::from(e.into_error()))
}

fn stage(dir: &Path, content: &[u8]) -> Result<NamedTempFile, ConcordError> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content)?;
    file.flush()?;
    Ok(file)
}

/// Loads the staged CSV as written: names, width and order come from its own
/// header, each column is cast to its declared export type (unknown names stay
/// text), so a value that does not fit its type fails here.
async fn load_staging(connector: &dyn Connector, csv_path: &Path) -> Result<(), ConcordError> {
    let staging = staging_table();
    let raw = format!("{}_text", staging);
    connector
        .execute(&format!(
            "CREATE OR REPLACE VIEW {} AS SELECT * FROM read_csv('{}', header = true, all_varchar = true)",
            quote_ident(&raw),
            csv_path.to_string_lossy().replace('\'', "''")
        ))
        .await?;

    let projection: Vec<String> = connector
        .fetch_columns(&raw)
        .await?
        .iter()
        .map(|c| {
            let ty = EXPORT_COLUMNS
                .iter()
                .find(|(name, _)| *name == c.name)
                .map_or("VARCHAR", |(_, ty)| *ty);
            let col = quote_ident(&c.name);
            format!("CAST({} AS {}) AS {}", col, ty, col)
        })
        .collect();

    let loaded = connector
        .execute(&format!(
            "CREATE OR REPLACE TABLE {} AS SELECT {} FROM {}",
            quote_ident(&staging),
            projection.join(", "),
            quote_ident(&raw)
        ))
        .await;
    connector
        .execute(&format!("DROP VIEW IF EXISTS {}", quote_ident(&raw)))
        .await?;
    loaded
}

async fn drop_staging(connector: &dyn Connector) {
    let staging = quote_ident(&staging_table());
    if let Err(e) = connector
        .execute(&format!("DROP TABLE IF EXISTS {}", staging))
        .await
    {
        warn!("Could not drop staging table: {}", e);
    }
}

#[instrument(skip_all, fields(target = ?target_dir))]
pub async fn publish(
    connector: &dyn Connector,
    target_dir: &Path,
    contract: &SchemaContract,
    transactions: &[CanonicalTransaction],
    personas: &[PersonaScore],
    artefacts: Vec<Artefact>,
) -> Result<Publication, ConcordError> {
    // 1. STAGE (temp files are deleted on drop if we bail out)
    let export = stage(target_dir, &render_export_csv(transactions, personas)?)?;
    let mut staged = Vec::with_capacity(artefacts.len());
    for artefact in artefacts {
        staged.push((artefact.file_name, stage(target_dir, &artefact.content)?));
    }

    // 2. VALIDATE (against the file actually written)
    let staging = staging_table();
    let validated = async {
        load_staging(connector, export.path()).await?;
        validate_structure(connector, &staging, contract).await?;
        validate_baseline(connector, &staging, contract).await
    }
    .await;

    let rows = match validated {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Publication aborted: {}", e);
            drop_staging(connector).await;
            return Err(e);
        }
    };

    // 3. PROMOTE
    let mut files = Vec::with_capacity(staged.len() + 1);
    let export_path = target_dir.join(EXPORT_FILE);
    let persisted = export
        .persist(&export_path)
        .map_err(|e| ConcordError::from(e.error));
    if let Err(e) = persisted {
        drop_staging(connector).await;
        return Err(e);
    }
    files.push(export_path);

    for (name, file) in staged {
        let path = target_dir.join(&name);
        file.persist(&path).map_err(|e| ConcordError::from(e.error))?;
        files.push(path);
    }

    connector
        .execute(&format!(
            "CREATE OR REPLACE TABLE {} AS SELECT * FROM {}; DROP TABLE {};",
            quote_ident(EXPORT_TABLE),
            quote_ident(&staging),
            quote_ident(&staging)
        ))
        .await?;

    info!(rows, files = files.len(), "Published");
    Ok(Publication { rows, files })
}
