// concord-core/src/lib.rs

// 1. Mandatory documentation for production code
#![allow(missing_docs)]

// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Contracts the application needs from the outside world (Connector).
pub mod ports;

// 2. Domain (business core)
// Identity normalization, reconciliation, dimensions, quality, personas.
// Depends on nothing but the Ports data types (no infra, no app).
pub mod domain;

// 3. Infrastructure (Adapters)
// DuckDB, YAML configuration, filesystem publication.
// Depends on the Domain and the Ports.
pub mod infrastructure;

// 4. Application (Use Cases)
// Orchestration (Ingest, Pipeline, Publish, Clean)
// Depends on the Domain, the Infra and the Ports.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
// use concord_core::ConcordError;
pub use error::ConcordError;
