// concord-core/src/domain/reconcile/time_authority.rs

use chrono::NaiveDateTime;

use crate::domain::model::TimeSource;

/// Every timestamp known for one transaction, whatever its trust level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeCandidates<'a> {
    /// From the matched system-of-record interaction.
    pub authoritative: Option<NaiveDateTime>,
    /// From an operator override keyed by the same canonical id.
    pub override_ts: Option<NaiveDateTime>,
    /// Clock embedded in the device payload.
    pub embedded: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeResolution {
    pub txn_ts: Option<NaiveDateTime>,
    pub source: TimeSource,
    /// An override existed but lost to a present authoritative value.
    pub override_rejected: bool,
    /// The device clock was the only clock available and was discarded.
    pub embedded_discarded: bool,
}

/// Single source of time truth for the warehouse.
///
/// 1. The system-of-record timestamp, when present, always wins.
/// 2. An override fills the gap only when no authoritative value exists.
/// 3. The device clock is never used, even as a last resort.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeAuthorityPolicy;

impl TimeAuthorityPolicy {
    pub fn resolve(&self, candidates: TimeCandidates<'_>) -> TimeResolution {
        let has_embedded = candidates
            .embedded
            .is_some_and(|raw| !raw.trim().is_empty());

        match (candidates.authoritative, candidates.override_ts) {
            (Some(ts), override_ts) => TimeResolution {
                txn_ts: Some(ts),
                source: TimeSource::Authoritative,
                override_rejected: override_ts.is_some(),
                embedded_discarded: false,
            },
            (None, Some(ts)) => TimeResolution {
                txn_ts: Some(ts),
                source: TimeSource::Override,
                override_rejected: false,
                embedded_discarded: false,
            },
            (None, None) => TimeResolution {
                txn_ts: None,
                source: TimeSource::Unresolved,
                override_rejected: false,
                embedded_discarded: has_embedded,
            },
        }
    }
}
