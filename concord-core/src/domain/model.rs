// concord-core/src/domain/model.rs

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::dimensions::{DayType, Daypart};

/// One field-captured transaction, as landed. Never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEvent {
    /// Landing position in the feed.
    pub position: usize,
    pub raw_id: Option<String>,
    pub device_id: Option<String>,
    pub store_id: Option<String>,
    /// Semi-structured item/financial payload (JSON text).
    pub payload: Option<String>,
    /// Device clock. Untrusted: never a source of `txn_ts`.
    pub embedded_ts: Option<String>,
}

/// One system-of-record transaction. Sole source of transaction time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthoritativeInteraction {
    pub position: usize,
    pub enterprise_id: Option<String>,
    pub store_id: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    pub age: Option<u8>,
    pub gender: Option<String>,
    /// Explicit role as captured by the enterprise system ("student", "rider"...).
    pub role: Option<String>,
    pub emotion: Option<String>,
    pub transcript: Option<String>,
    pub landed_at: Option<NaiveDateTime>,
}

/// Operator-supplied timestamp for a transaction the system of record missed.
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideRecord {
    pub position: usize,
    pub canonical_id: String,
    pub override_ts: NaiveDateTime,
    pub reason: Option<String>,
}

/// Which rule produced `txn_ts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSource {
    Authoritative,
    Override,
    #[default]
    Unresolved,
}

impl TimeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authoritative => "authoritative",
            Self::Override => "override",
            Self::Unresolved => "unresolved",
        }
    }
}

impl fmt::Display for TimeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Business context extracted from the RawEvent payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BusinessFields {
    pub brand: Option<String>,
    pub category: Option<String>,
    pub product_name: Option<String>,
    pub item_count: Option<u32>,
    pub total_amount: Option<f64>,
    pub payment_method: Option<String>,
    pub transcript: Option<String>,
}

/// The merged, published entity. Exactly one per RawEvent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalTransaction {
    /// `normalize(raw_id)`; `None` when the raw identifier was unusable.
    pub canonical_id: Option<String>,
    pub raw_id: Option<String>,
    pub device_id: Option<String>,
    pub store_id: Option<String>,
    #[serde(flatten)]
    pub business: BusinessFields,
    pub txn_ts: Option<NaiveDateTime>,
    pub time_source: TimeSource,
    /// Operator correction on file for this id, applied or not.
    pub override_ts: Option<NaiveDateTime>,
    pub daypart: Option<Daypart>,
    pub day_type: Option<DayType>,
    pub matched: bool,
    pub age: Option<u8>,
    pub gender: Option<String>,
    pub role: Option<String>,
    pub emotion: Option<String>,
    pub interaction_transcript: Option<String>,
}

impl CanonicalTransaction {
    /// Free text for persona scoring: the system-of-record transcript first,
    /// then whatever the device captured.
    pub fn free_text(&self) -> Option<&str> {
        let non_blank = |t: &&str| !t.trim().is_empty();
        self.interaction_transcript
            .as_deref()
            .filter(non_blank)
            .or(self.business.transcript.as_deref().filter(non_blank))
    }
}

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Offset spellings. `%#z` takes `+08`, `+0800` and `+08:00`.
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

/// Parses the timestamp spellings found in the feeds.
///
/// Values with an offset (or `Z`) keep their local wall-clock time: dayparts
/// are about the store's day, not UTC. A bare date reads as midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt.naive_local());
    }

    // `Z` outside strict RFC 3339, e.g. "2025-03-10 14:00:00Z"
    let raw = raw.strip_suffix(['Z', 'z']).unwrap_or(raw);

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
