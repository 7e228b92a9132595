pub mod dimensions;
pub mod error;
pub mod export;
pub mod identity;
pub mod model;
pub mod persona;
pub mod project;
pub mod quality;
pub mod reconcile;

// Re-exports pratiques pour simplifier les imports ailleurs
pub use error::DomainError;
