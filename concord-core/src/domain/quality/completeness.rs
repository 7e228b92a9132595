// concord-core/src/domain/quality/completeness.rs

use serde::{Deserialize, Serialize};

use crate::domain::model::CanonicalTransaction;

/// Presence counts for one tracked field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCompleteness {
    pub field: String,
    pub present: usize,
    pub missing: usize,
    pub percent: f64,
}

impl FieldCompleteness {
    fn new(field: &str, present: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100.0
        } else {
            present as f64 * 100.0 / total as f64
        };
        Self {
            field: field.to_string(),
            present,
            missing: total - present,
            percent,
        }
    }

    fn missing_rate(&self) -> f64 {
        1.0 - self.percent / 100.0
    }
}

type IsPresent = fn(&CanonicalTransaction) -> bool;

/// Fields entering the aggregate score, with their weight. Weights sum to 1.
const WEIGHTED_FIELDS: [(&str, f64, IsPresent); 4] = [
    ("canonical_id", 0.35, |t| t.canonical_id.is_some()),
    ("total_amount", 0.25, |t| t.business.total_amount.is_some()),
    ("txn_ts", 0.25, |t| t.txn_ts.is_some()),
    ("daypart", 0.15, |t| t.daypart.is_some() && t.day_type.is_some()),
];

/// Reported for monitoring, not scored.
const INFORMATIONAL_FIELDS: [(&str, IsPresent); 5] = [
    ("store_id", |t| t.store_id.is_some()),
    ("brand", |t| t.business.brand.is_some()),
    ("category", |t| t.business.category.is_some()),
    ("payment_method", |t| t.business.payment_method.is_some()),
    ("age", |t| t.age.is_some()),
];

#[derive(Debug, Clone, PartialEq)]
pub struct CompletenessSummary {
    pub fields: Vec<FieldCompleteness>,
    /// 0..=100, complement of the weighted missing rate.
    pub score: f64,
}

pub fn measure_completeness(transactions: &[CanonicalTransaction]) -> CompletenessSummary {
    let total = transactions.len();
    let count = |is_present: IsPresent| transactions.iter().filter(|t| is_present(t)).count();

    let mut fields = Vec::with_capacity(WEIGHTED_FIELDS.len() + INFORMATIONAL_FIELDS.len());
    let mut weighted_missing = 0.0;

    for (name, weight, is_present) in WEIGHTED_FIELDS {
        let field = FieldCompleteness::new(name, count(is_present), total);
        weighted_missing += weight * field.missing_rate();
        fields.push(field);
    }
    for (name, is_present) in INFORMATIONAL_FIELDS {
        fields.push(FieldCompleteness::new(name, count(is_present), total));
    }

    let score = ((1.0 - weighted_missing) * 100.0).clamp(0.0, 100.0);
    CompletenessSummary { fields, score }
}
