// concord-core/src/domain/reconcile/mod.rs

pub mod engine;
pub mod payload;
pub mod time_authority;

pub use engine::{ReconcileStats, Reconciliation, reconcile};
pub use payload::extract_business_fields;
pub use time_authority::{TimeAuthorityPolicy, TimeResolution};
