// concord/src/commands/report.rs
//
// USE CASE: Render the last published quality report.

use std::path::PathBuf;

use anyhow::Context;
use comfy_table::Table;
use concord_core::application::load_quality_report;
use concord_core::infrastructure::config::project::load_project_config;

pub fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let config = load_project_config(&project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;
    let target_dir = project_dir.join(&config.target_path);
    let report = load_quality_report(&target_dir).with_context(|| {
        format!(
            "No quality report in {:?}. Have you run 'concord run'?",
            target_dir
        )
    })?;

    println!("\n📊 Quality Report: {}", config.name);

    let mut summary = Table::new();
    summary.set_header(vec!["Metric", "Value"]);
    summary.add_row(vec!["Transactions".to_string(), report.total_transactions.to_string()]);
    summary.add_row(vec!["Completeness score".to_string(), format!("{:.1}", report.completeness_score)]);
    summary.add_row(vec!["Matched".to_string(), report.matched_transactions.to_string()]);
    summary.add_row(vec!["Unmatched".to_string(), report.unmatched_transactions.to_string()]);
    summary.add_row(vec!["Invalid identifiers".to_string(), report.invalid_identifiers.to_string()]);
    summary.add_row(vec!["Malformed payloads".to_string(), report.malformed_payloads.to_string()]);
    summary.add_row(vec!["Overrides applied".to_string(), report.override_applied.to_string()]);
    summary.add_row(vec!["Overrides rejected".to_string(), report.override_rejected.to_string()]);
    summary.add_row(vec![
        "Duplicate ratio".to_string(),
        format!("{:.2}%", report.duplicate_ratio * 100.0),
    ]);
    summary.add_row(vec![
        "Duplicate ratio (system of record)".to_string(),
        format!("{:.2}%", report.authoritative_duplicate_ratio * 100.0),
    ]);
    println!("{}", summary);

    let mut fields = Table::new();
    fields.set_header(vec!["Field", "Present", "Missing", "Percent"]);
    for field in &report.field_completeness {
        fields.add_row(vec![
            field.field.clone(),
            field.present.to_string(),
            field.missing.to_string(),
            format!("{:.1}%", field.percent),
        ]);
    }
    println!("{}", fields);

    if report.has_alerts() {
        println!("🚨 Alerts:");
        if report.duplicate_alert {
            println!("   - duplicate volume above threshold");
        }
        if report.completeness_alert {
            println!("   - completeness below threshold");
        }
    }
    for warning in &report.warnings {
        println!("   ⚠️  {}", warning);
    }

    Ok(())
}
