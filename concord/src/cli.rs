// concord/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "concord")]
#[command(about = "Reconciles field-device transactions with the system of record", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🚀 Runs the reconciliation pipeline (ingest -> reconcile -> validate -> publish)
    Run {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🧹 Cleans build artifacts (target/ folder)
    Clean {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// ⚡ Executes a raw SQL query (Ad-hoc)
    Query {
        query: String,
        #[arg(long, env = "CONCORD_DATABASE", default_value = "concord.duckdb")]
        db_path: String,
    },

    /// 🔍 Inspects a DuckDB table (schema + sample rows)
    Inspect {
        /// Path to the DuckDB database file
        #[arg(long, env = "CONCORD_DATABASE", default_value = "concord.duckdb")]
        db_path: String,

        /// Table name to inspect
        #[arg(long, short, default_value = "canonical_transactions")]
        table: String,

        /// Number of sample rows to display
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// 🔑 Prints the canonical form of transaction identifiers
    Normalize {
        #[arg(required = true)]
        identifiers: Vec<String>,
    },

    /// 📊 Shows the last published quality report
    Report {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },
}
