// concord-core/src/application/mod.rs

pub mod clean;
pub mod engine;
pub mod ingest;
pub mod pipeline;
pub mod publish;
pub mod validation;

#[cfg(test)]
pub(crate) mod mock;

// --- RE-EXPORTS (FACADE PATTERN) ---
// The CLI does `use concord_core::application::{run_pipeline, clean_project};`
// without knowing the internal file layout.

pub use clean::clean_project;
pub use engine::{QueryOutput, execute_query, inspect_table};
pub use ingest::{FeedSnapshot, ingest};
pub use pipeline::{RunResult, load_quality_report, run_pipeline};
pub use publish::{Artefact, Publication, publish};
