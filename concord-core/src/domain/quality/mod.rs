// concord-core/src/domain/quality/mod.rs

pub mod completeness;
pub mod contract;
pub mod drift;
pub mod duplicates;
pub mod report;

pub use completeness::{CompletenessSummary, FieldCompleteness, measure_completeness};
pub use contract::{Baseline, ContractColumn, SchemaContract};
pub use drift::{DriftFinding, RowCountDrift};
pub use duplicates::{DuplicateGroup, duplicate_ratio, find_duplicate_groups};
pub use report::QualityReport;
