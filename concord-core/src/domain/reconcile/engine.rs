// concord-core/src/domain/reconcile/engine.rs

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::dimensions::derive_dimensions;
use crate::domain::identity::normalize;
use crate::domain::model::{
    AuthoritativeInteraction, BusinessFields, CanonicalTransaction, OverrideRecord, RawEvent,
    TimeSource,
};
use crate::domain::reconcile::payload::extract_business_fields;
use crate::domain::reconcile::time_authority::{TimeAuthorityPolicy, TimeCandidates};

/// Counters collected while merging. Feed the quality report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    pub raw_events: usize,
    pub invalid_identifiers: usize,
    pub malformed_payloads: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub overrides_applied: usize,
    pub overrides_rejected: usize,
    pub embedded_timestamps_discarded: usize,
    /// Interactions dropped because an earlier-landed one owns the same canonical id.
    pub superseded_interactions: usize,
    pub unmatchable_interactions: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub transactions: Vec<CanonicalTransaction>,
    pub stats: ReconcileStats,
}

struct Merged {
    txn: CanonicalTransaction,
    invalid_identifier: bool,
    malformed_payload: bool,
    override_rejected: bool,
    embedded_discarded: bool,
}

/// Preserving merge: one CanonicalTransaction per RawEvent, in feed order.
///
/// When several interactions normalize to the same canonical id, the one that
/// landed first (earliest `landed_at`, then feed position) is the match; the
/// others are ignored rather than fanned out.
pub fn reconcile(
    raw_events: &[RawEvent],
    interactions: &[AuthoritativeInteraction],
    overrides: &[OverrideRecord],
) -> Reconciliation {
    let mut stats = ReconcileStats {
        raw_events: raw_events.len(),
        ..Default::default()
    };

    let by_id = index_interactions(interactions, &mut stats);
    let overrides_by_id = index_overrides(overrides);
    let policy = TimeAuthorityPolicy;

    let merged: Vec<Merged> = raw_events
        .par_iter()
        .map(|event| merge_one(event, &by_id, &overrides_by_id, &policy))
        .collect();

    let mut transactions = Vec::with_capacity(merged.len());
    for m in merged {
        stats.invalid_identifiers += usize::from(m.invalid_identifier);
        stats.malformed_payloads += usize::from(m.malformed_payload);
        stats.overrides_rejected += usize::from(m.override_rejected);
        stats.embedded_timestamps_discarded += usize::from(m.embedded_discarded);
        if m.txn.matched {
            stats.matched += 1;
        } else {
            stats.unmatched += 1;
        }
        if m.txn.time_source == TimeSource::Override {
            stats.overrides_applied += 1;
        }
        transactions.push(m.txn);
    }

    Reconciliation {
        transactions,
        stats,
    }
}

fn index_interactions<'a>(
    interactions: &'a [AuthoritativeInteraction],
    stats: &mut ReconcileStats,
) -> HashMap<String, &'a AuthoritativeInteraction> {
    let mut by_id: HashMap<String, &AuthoritativeInteraction> =
        HashMap::with_capacity(interactions.len());

    for interaction in interactions {
        let Some(id) = interaction
            .enterprise_id
            .as_deref()
            .and_then(|raw| normalize(raw).ok())
        else {
            stats.unmatchable_interactions += 1;
            continue;
        };

        match by_id.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(interaction);
            }
            Entry::Occupied(mut slot) => {
                stats.superseded_interactions += 1;
                if landing_key(interaction) < landing_key(slot.get()) {
                    debug!(canonical_id = %slot.key(), "Earlier-landed interaction supersedes previous match");
                    slot.insert(interaction);
                }
            }
        }
    }

    by_id
}

// Missing landing times sort after every known one.
fn landing_key(
    interaction: &AuthoritativeInteraction,
) -> (bool, Option<chrono::NaiveDateTime>, usize) {
    (
        interaction.landed_at.is_none(),
        interaction.landed_at,
        interaction.position,
    )
}

fn index_overrides(overrides: &[OverrideRecord]) -> HashMap<String, &OverrideRecord> {
    let mut by_id = HashMap::with_capacity(overrides.len());
    for record in overrides {
        match normalize(&record.canonical_id) {
            // First curated entry wins; later ones are operator mistakes
            Ok(id) => {
                by_id.entry(id).or_insert(record);
            }
            Err(e) => debug!(position = record.position, "Skipping override: {}", e),
        }
    }
    by_id
}

fn merge_one(
    event: &RawEvent,
    interactions: &HashMap<String, &AuthoritativeInteraction>,
    overrides: &HashMap<String, &OverrideRecord>,
    policy: &TimeAuthorityPolicy,
) -> Merged {
    let canonical_id = match event.raw_id.as_deref().map(normalize) {
        Some(Ok(id)) => Some(id),
        Some(Err(e)) => {
            debug!(position = event.position, "Unmatchable raw event: {}", e);
            None
        }
        None => None,
    };
    let invalid_identifier = canonical_id.is_none();

    let (business, malformed_payload) = match event.payload.as_deref() {
        Some(payload) if !payload.trim().is_empty() => match extract_business_fields(payload) {
            Ok(fields) => (fields, false),
            Err(e) => {
                debug!(raw_id = ?event.raw_id, "Payload degraded to unset fields: {}", e);
                (BusinessFields::default(), true)
            }
        },
        _ => (BusinessFields::default(), false),
    };

    let interaction = canonical_id
        .as_ref()
        .and_then(|id| interactions.get(id).copied());
    let override_record = canonical_id.as_ref().and_then(|id| overrides.get(id).copied());

    let resolution = policy.resolve(TimeCandidates {
        authoritative: interaction.and_then(|i| i.timestamp),
        override_ts: override_record.map(|o| o.override_ts),
        embedded: event.embedded_ts.as_deref(),
    });
    let dims = derive_dimensions(resolution.txn_ts);

    let txn = CanonicalTransaction {
        canonical_id,
        raw_id: event.raw_id.clone(),
        device_id: event.device_id.clone(),
        store_id: event
            .store_id
            .clone()
            .or_else(|| interaction.and_then(|i| i.store_id.clone())),
        business,
        txn_ts: resolution.txn_ts,
        time_source: resolution.source,
        override_ts: override_record.map(|o| o.override_ts),
        daypart: dims.daypart,
        day_type: dims.day_type,
        matched: interaction.is_some(),
        age: interaction.and_then(|i| i.age),
        gender: interaction.and_then(|i| i.gender.clone()),
        role: interaction.and_then(|i| i.role.clone()),
        emotion: interaction.and_then(|i| i.emotion.clone()),
        interaction_transcript: interaction.and_then(|i| i.transcript.clone()),
    };

    Merged {
        txn,
        invalid_identifier,
        malformed_payload,
        override_rejected: resolution.override_rejected,
        embedded_discarded: resolution.embedded_discarded,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::dimensions::{DayType, Daypart};
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn raw(position: usize, id: &str) -> RawEvent {
        RawEvent {
            position,
            raw_id: Some(id.to_string()),
            device_id: Some("SCOUTPI-0002".into()),
            store_id: Some("102".into()),
            payload: Some(r#"{"items":[{"brandName":"Oishi","category":"Snacks","totalPrice":15}]}"#.into()),
            embedded_ts: Some("2025-03-10T03:00:00".into()),
        }
    }

    fn interaction(position: usize, id: &str, at: Option<NaiveDateTime>) -> AuthoritativeInteraction {
        AuthoritativeInteraction {
            position,
            enterprise_id: Some(id.to_string()),
            timestamp: at,
            ..Default::default()
        }
    }

    #[test]
    fn test_scenario_authoritative_match_across_id_formats() {
        let result = reconcile(
            &[raw(0, "ABC-123")],
            &[interaction(0, "abc123", Some(ts(10, 14)))],
            &[],
        );

        assert_eq!(result.transactions.len(), 1);
        let txn = &result.transactions[0];
        assert_eq!(txn.canonical_id.as_deref(), Some("abc123"));
        assert_eq!(txn.txn_ts, Some(ts(10, 14)));
        assert_eq!(txn.time_source, TimeSource::Authoritative);
        assert_eq!(txn.daypart, Some(Daypart::Afternoon));
        assert_eq!(txn.day_type, Some(DayType::Weekday));
        assert_eq!(txn.business.brand.as_deref(), Some("Oishi"));
        assert!(txn.matched);
    }

    #[test]
    fn test_scenario_override_fills_missing_authoritative_record() {
        let overrides = [OverrideRecord {
            position: 0,
            canonical_id: "ABC_123".into(),
            override_ts: ts(10, 8),
            reason: Some("POS outage".into()),
        }];
        let result = reconcile(&[raw(0, "ABC-123")], &[], &overrides);

        let txn = &result.transactions[0];
        assert_eq!(txn.txn_ts, Some(ts(10, 8)));
        assert_eq!(txn.time_source, TimeSource::Override);
        assert_eq!(txn.daypart, Some(Daypart::Morning));
        assert!(!txn.matched);
        assert_eq!(result.stats.overrides_applied, 1);
    }

    #[test]
    fn test_override_never_replaces_authoritative_value() {
        let overrides = [OverrideRecord {
            position: 0,
            canonical_id: "abc123".into(),
            override_ts: ts(10, 8),
            reason: None,
        }];
        let result = reconcile(
            &[raw(0, "ABC-123")],
            &[interaction(0, "ABC123", Some(ts(10, 14)))],
            &overrides,
        );

        let txn = &result.transactions[0];
        assert_eq!(txn.txn_ts, Some(ts(10, 14)));
        assert_eq!(txn.override_ts, Some(ts(10, 8)));
        assert_eq!(result.stats.overrides_rejected, 1);
        assert_eq!(result.stats.overrides_applied, 0);
    }

    #[test]
    fn test_unmatched_event_keeps_no_time_even_with_embedded_clock() {
        let result = reconcile(&[raw(0, "ZZZ-999")], &[interaction(0, "abc123", Some(ts(10, 14)))], &[]);

        let txn = &result.transactions[0];
        assert_eq!(txn.txn_ts, None);
        assert_eq!(txn.daypart, None);
        assert_eq!(txn.day_type, None);
        assert!(!txn.matched);
        assert_eq!(result.stats.unmatched, 1);
        assert_eq!(result.stats.embedded_timestamps_discarded, 1);
    }

    #[test]
    fn test_duplicate_interactions_do_not_fan_out() {
        let result = reconcile(
            &[raw(0, "ABC-123")],
            &[
                interaction(0, "abc123", Some(ts(10, 14))),
                interaction(1, "ABC_123", Some(ts(10, 20))),
            ],
            &[],
        );

        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.transactions[0].txn_ts, Some(ts(10, 14)));
        assert_eq!(result.stats.superseded_interactions, 1);
    }

    #[test]
    fn test_earliest_landed_interaction_wins() {
        let mut late = interaction(0, "abc123", Some(ts(10, 14)));
        late.landed_at = Some(ts(11, 9));
        let mut early = interaction(1, "abc123", Some(ts(10, 20)));
        early.landed_at = Some(ts(11, 1));

        let result = reconcile(&[raw(0, "ABC-123")], &[late, early], &[]);
        assert_eq!(result.transactions[0].txn_ts, Some(ts(10, 20)));
    }

    #[test]
    fn test_cardinality_is_preserved() {
        let mut events: Vec<RawEvent> = (0..50).map(|i| raw(i, &format!("TX-{i:04}"))).collect();
        // Degenerate rows are kept, not dropped
        events.push(RawEvent {
            position: 50,
            raw_id: Some("  ".into()),
            ..Default::default()
        });
        events.push(RawEvent {
            position: 51,
            raw_id: None,
            payload: Some("{broken".into()),
            ..Default::default()
        });
        // Same transaction captured twice by the device
        events.push(raw(52, "tx_0001"));

        let interactions: Vec<_> = (0..50)
            .step_by(2)
            .map(|i| interaction(i, &format!("tx{i:04}"), Some(ts(12, 9))))
            .collect();

        let result = reconcile(&events, &interactions, &[]);

        assert_eq!(result.transactions.len(), events.len());
        assert_eq!(result.stats.invalid_identifiers, 2);
        assert_eq!(result.stats.malformed_payloads, 1);
        assert_eq!(result.stats.matched + result.stats.unmatched, events.len());
        // Feed order is preserved
        assert_eq!(result.transactions[3].raw_id.as_deref(), Some("TX-0003"));
        assert_eq!(result.transactions[51].canonical_id, None);
        assert_eq!(result.transactions[51].business, BusinessFields::default());
    }

    #[test]
    fn test_derived_fields_only_exist_with_txn_ts() {
        let events: Vec<RawEvent> = (0..20).map(|i| raw(i, &format!("id-{i}"))).collect();
        let interactions: Vec<_> = (0..20)
            .filter(|i| i % 3 == 0)
            .map(|i| interaction(i, &format!("ID{i}"), Some(ts(15, (i % 24) as u32))))
            .collect();

        let result = reconcile(&events, &interactions, &[]);
        for txn in &result.transactions {
            assert_eq!(txn.txn_ts.is_some(), txn.daypart.is_some());
            assert_eq!(txn.txn_ts.is_some(), txn.day_type.is_some());
        }
    }
}
