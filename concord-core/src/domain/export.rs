// concord-core/src/domain/export.rs

use chrono::NaiveDateTime;

use crate::domain::model::CanonicalTransaction;
use crate::domain::persona::PersonaLabel;

/// Published column order and SQL types of the canonical export.
/// Consumers bind by position: append only, never reorder.
pub const EXPORT_COLUMNS: [(&str, &str); 18] = [
    ("canonical_id", "VARCHAR"),
    ("raw_id", "VARCHAR"),
    ("store_id", "VARCHAR"),
    ("device_id", "VARCHAR"),
    ("brand", "VARCHAR"),
    ("category", "VARCHAR"),
    ("product_name", "VARCHAR"),
    ("item_count", "INTEGER"),
    ("total_amount", "DOUBLE"),
    ("payment_method", "VARCHAR"),
    ("txn_ts", "TIMESTAMP"),
    ("override_ts", "TIMESTAMP"),
    ("time_source", "VARCHAR"),
    ("daypart", "VARCHAR"),
    ("weekday_or_weekend", "VARCHAR"),
    ("age", "INTEGER"),
    ("gender", "VARCHAR"),
    ("persona", "VARCHAR"),
];

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn ts(value: Option<NaiveDateTime>) -> String {
    value
        .map(|t| t.format(TS_FORMAT).to_string())
        .unwrap_or_default()
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// One CSV record in `EXPORT_COLUMNS` order. Unset values are empty strings.
pub fn export_record(txn: &CanonicalTransaction, persona: PersonaLabel) -> Vec<String> {
    let b = &txn.business;
    vec![
        text(&txn.canonical_id),
        text(&txn.raw_id),
        text(&txn.store_id),
        text(&txn.device_id),
        text(&b.brand),
        text(&b.category),
        text(&b.product_name),
        b.item_count.map(|n| n.to_string()).unwrap_or_default(),
        b.total_amount.map(|n| n.to_string()).unwrap_or_default(),
        text(&b.payment_method),
        ts(txn.txn_ts),
        ts(txn.override_ts),
        txn.time_source.as_str().to_string(),
        txn.daypart.map(|d| d.as_str().to_string()).unwrap_or_default(),
        txn.day_type.map(|d| d.as_str().to_string()).unwrap_or_default(),
        txn.age.map(|a| a.to_string()).unwrap_or_default(),
        text(&txn.gender),
        persona.as_str().to_string(),
    ]
}

pub fn export_header() -> Vec<&'static str> {
    EXPORT_COLUMNS.iter().map(|(name, _)| *name).collect()
}
