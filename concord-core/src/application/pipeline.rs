// concord-core/src/application/pipeline.rs

use std::fs;
use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::application::ingest::ingest;
use crate::application::publish::{Artefact, publish};
use crate::domain::persona::PersonaScorer;
use crate::domain::project::ProjectConfig;
use crate::domain::quality::{DriftFinding, QualityReport, RowCountDrift};
use crate::domain::reconcile::{ReconcileStats, reconcile};
use crate::error::ConcordError;
use crate::infrastructure::fs::PublishLock;
use crate::ports::connector::Connector;

pub const RUN_RESULTS_FILE: &str = "run_results.json";
pub const QUALITY_REPORT_FILE: &str = "quality_report.json";
pub const PERSONA_SCORES_FILE: &str = "persona_scores.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub success: bool,
    pub project: String,
    pub started_at: String,
    pub finished_at: String,
    pub duration_ms: u128,
    pub row_count: u64,
    #[serde(default)]
    pub previous_row_count: Option<u64>,
    pub completeness_score: f64,
    pub duplicate_alert: bool,
    pub completeness_alert: bool,
    pub stats: ReconcileStats,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// One full run: ingest, reconcile, score, validate, publish.
///
/// Holds the publication lock for its whole duration. Any error leaves the
/// previous publication untouched.
#[instrument(skip_all, fields(project = %config.name))]
pub async fn run_pipeline(
    project_dir: &Path,
    config: &ProjectConfig,
    connector: &dyn Connector,
) -> Result<RunResult, ConcordError> {
    let start = Instant::now();
    let started_at = Utc::now().to_rfc3339();

    // 1. SETUP
    let target_dir = project_dir.join(&config.target_path);
    let _lock = PublishLock::acquire(&target_dir)?;
    let previous_row_count = load_previous_run(&target_dir.join(RUN_RESULTS_FILE)).map(|r| r.row_count);

    // 2. INGEST
    let snapshot = ingest(connector, project_dir, config).await?;
    info!(
        raw_events = snapshot.raw_events.len(),
        interactions = snapshot.interactions.len(),
        overrides = snapshot.overrides.len(),
        "Snapshot loaded"
    );

    // 3. RECONCILE
    let reconciliation = reconcile(
        &snapshot.raw_events,
        &snapshot.interactions,
        &snapshot.overrides,
    );
    let stats = &reconciliation.stats;
    info!(
        matched = stats.matched,
        unmatched = stats.unmatched,
        overrides = stats.overrides_applied,
        "Reconciled"
    );

    // 4. QUALITY (reported, never fatal)
    let mut report = QualityReport::build(&reconciliation, &snapshot.interactions, &config.quality);
    if let Some(threshold) = config.quality.row_count_drift_ratio {
        match RowCountDrift::check(report.total_transactions as u64, previous_row_count, threshold) {
            Ok(()) => {}
            Err(DriftFinding::NoHistory) => info!("First run, row count drift not checked"),
            Err(finding) => report.warnings.push(finding.to_string()),
        }
    }
    report
        .validate()
        .map_err(|e| ConcordError::InternalError(format!("Quality report out of range: {}", e)))?;
    for warning in &report.warnings {
        warn!("{}", warning);
    }

    // 5. PERSONAS
    let scorer = PersonaScorer::new(&config.personas)?;
    let personas = scorer.score_all(&reconciliation.transactions);

    // 6. PUBLISH
    let mut result = RunResult {
        success: true,
        project: config.name.clone(),
        started_at,
        finished_at: String::new(),
        duration_ms: 0,
        row_count: reconciliation.transactions.len() as u64,
        previous_row_count,
        completeness_score: report.completeness_score,
        duplicate_alert: report.duplicate_alert,
        completeness_alert: report.completeness_alert,
        stats: reconciliation.stats.clone(),
        warnings: report.warnings.clone(),
    };
    result.finished_at = Utc::now().to_rfc3339();
    result.duration_ms = start.elapsed().as_millis();

    let artefacts = vec![
        Artefact::json(QUALITY_REPORT_FILE, &report)?,
        Artefact::json(PERSONA_SCORES_FILE, &personas)?,
        Artefact::json(RUN_RESULTS_FILE, &result)?,
    ];

    let publication = publish(
        connector,
        &target_dir,
        &config.contract,
        &reconciliation.transactions,
        &personas,
        artefacts,
    )
    .await?;
    result.row_count = publication.rows;

    if let Err(e) = connector.execute("CHECKPOINT").await {
        warn!("Checkpoint failed: {}", e);
    }

    info!(
        rows = result.row_count,
        "Done in {:.2}s",
        start.elapsed().as_secs_f64()
    );
    Ok(result)
}

fn load_previous_run(path: &Path) -> Option<RunResult> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(result) => Some(result),
        Err(e) => {
            warn!(path = ?path, "Ignoring unreadable previous run results: {}", e);
            None
        }
    }
}

/// Last published quality report of a project, if any.
pub fn load_quality_report(target_dir: &Path) -> Result<QualityReport, ConcordError> {
    let content = fs::read_to_string(target_dir.join(QUALITY_REPORT_FILE))?;
    serde_json::from_str(&content)
        .map_err(|e| ConcordError::Infrastructure(e.into()))
}
