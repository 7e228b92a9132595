// concord-core/src/domain/quality/report.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::identity::normalize_opt;
use crate::domain::model::AuthoritativeInteraction;
use crate::domain::project::QualitySettings;
use crate::domain::quality::completeness::{FieldCompleteness, measure_completeness};
use crate::domain::quality::duplicates::{DuplicateGroup, duplicate_ratio, find_duplicate_groups};
use crate::domain::reconcile::Reconciliation;

/// Monitoring artefact for one run. Findings here never abort a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct QualityReport {
    pub total_transactions: usize,
    pub field_completeness: Vec<FieldCompleteness>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub completeness_score: f64,
    /// Canonical ids carried by more than one published transaction.
    pub canonical_duplicates: Vec<DuplicateGroup>,
    /// System-of-record interactions sharing a canonical id.
    pub authoritative_duplicates: Vec<DuplicateGroup>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub duplicate_ratio: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub authoritative_duplicate_ratio: f64,
    pub duplicate_alert: bool,
    pub completeness_alert: bool,
    pub invalid_identifiers: usize,
    pub malformed_payloads: usize,
    pub matched_transactions: usize,
    pub unmatched_transactions: usize,
    pub override_applied: usize,
    pub override_rejected: usize,
    pub embedded_timestamps_discarded: usize,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl QualityReport {
    pub fn build(
        reconciliation: &Reconciliation,
        interactions: &[AuthoritativeInteraction],
        settings: &QualitySettings,
    ) -> Self {
        let transactions = &reconciliation.transactions;
        let stats = &reconciliation.stats;
        let total = transactions.len();

        let completeness = measure_completeness(transactions);

        let canonical_duplicates =
            find_duplicate_groups(transactions.iter().map(|t| t.canonical_id.as_deref()));

        let interaction_ids: Vec<Option<String>> = interactions
            .iter()
            .map(|i| normalize_opt(i.enterprise_id.as_deref()))
            .collect();
        let authoritative_duplicates =
            find_duplicate_groups(interaction_ids.iter().map(Option::as_deref));

        let ratio = duplicate_ratio(&canonical_duplicates, total);
        let auth_ratio = duplicate_ratio(&authoritative_duplicates, interactions.len());
        let duplicate_alert =
            ratio > settings.duplicate_alert_ratio || auth_ratio > settings.duplicate_alert_ratio;
        let completeness_alert = completeness.score < settings.completeness_alert_below;

        let mut warnings = Vec::new();
        for group in &canonical_duplicates {
            warnings.push(format!(
                "DuplicateCanonicalId: '{}' published {} times (rows {:?})",
                group.canonical_id, group.size, group.positions
            ));
        }
        for group in &authoritative_duplicates {
            warnings.push(format!(
                "DuplicateCanonicalId: '{}' appears {} times in the system of record; earliest landed kept",
                group.canonical_id, group.size
            ));
        }
        if duplicate_alert {
            warnings.push(format!(
                "Duplicate volume above {:.1}% (published {:.1}%, system of record {:.1}%)",
                settings.duplicate_alert_ratio * 100.0,
                ratio * 100.0,
                auth_ratio * 100.0
            ));
        }
        if completeness_alert {
            warnings.push(format!(
                "Completeness score {:.1} below {:.1}",
                completeness.score, settings.completeness_alert_below
            ));
        }

        Self {
            total_transactions: total,
            field_completeness: completeness.fields,
            completeness_score: completeness.score,
            canonical_duplicates,
            authoritative_duplicates,
            duplicate_ratio: ratio,
            authoritative_duplicate_ratio: auth_ratio,
            duplicate_alert,
            completeness_alert,
            invalid_identifiers: stats.invalid_identifiers,
            malformed_payloads: stats.malformed_payloads,
            matched_transactions: stats.matched,
            unmatched_transactions: stats.unmatched,
            override_applied: stats.overrides_applied,
            override_rejected: stats.overrides_rejected,
            embedded_timestamps_discarded: stats.embedded_timestamps_discarded,
            warnings,
        }
    }

    pub fn has_alerts(&self) -> bool {
        self.duplicate_alert || self.completeness_alert
    }
}
