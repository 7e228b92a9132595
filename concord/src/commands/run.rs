// concord/src/commands/run.rs
//
// USE CASE: Run the reconciliation pipeline.

use std::path::PathBuf;

use anyhow::Context;
use concord_core::application::run_pipeline;
use concord_core::infrastructure::adapters::duckdb::DuckDBConnector;
use concord_core::infrastructure::config::project::load_project_config;

pub async fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let start = std::time::Instant::now();

    // A. Load the Config (Infra)
    println!("⚙️  Loading configuration...");
    let config = load_project_config(&project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;
    println!("   Project: {} (v{})", config.name, config.version);

    // B. Open the database relative to the project
    let db_path = if config.database == ":memory:" {
        config.database.clone()
    } else {
        project_dir.join(&config.database).to_string_lossy().into_owned()
    };
    println!("   Engine: DuckDB 🦆 ({})", db_path);
    tracing::debug!(target_path = %config.target_path, "Opening connector");
    let connector = DuckDBConnector::new(&db_path)
        .with_context(|| format!("Failed to initialize DuckDB at {}", db_path))?;

    // C. Run the Pipeline (Application Layer)
    match run_pipeline(&project_dir, &config, &connector).await {
        Ok(result) => {
            let stats = &result.stats;
            println!(
                "   Reconciled {} events: {} matched, {} unmatched, {} overrides applied",
                stats.raw_events, stats.matched, stats.unmatched, stats.overrides_applied
            );
            println!("   Completeness score: {:.1}", result.completeness_score);
            for warning in &result.warnings {
                println!("   ⚠️  {}", warning);
            }
            println!(
                "\n✨ SUCCESS! Published {} rows to {:?} in {:.2?}",
                result.row_count,
                project_dir.join(&config.target_path),
                start.elapsed()
            );
        }
        Err(e) => {
            if e.is_contract_violation() {
                eprintln!("\n❌ Publication aborted, the previous output was kept.");
            }
            eprintln!("\n💥 CRITICAL PIPELINE ERROR: {:?}", miette::Report::new(e));
            std::process::exit(1);
        }
    }

    Ok(())
}
