// concord-core/src/domain/persona/mod.rs

pub mod label;
pub mod rules;
pub mod scorer;

pub use label::PersonaLabel;
pub use rules::{PersonaRuleSet, ScoringRule, Signal, default_rules};
pub use scorer::{PersonaScore, PersonaScorer, PersonaSource};
