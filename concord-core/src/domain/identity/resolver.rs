// concord-core/src/domain/identity/resolver.rs
//
// Schema Column Resolver: upstream tables rename their columns over time
// ("transaction_id" -> "canonical_tx_id" -> "TransactionID"...). Each feed
// declares, per logical field, a priority-ordered list of known names. The
// mapping is resolved ONCE against the physical table, never per row.

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Logical fields the pipeline reads, independent of physical naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalField {
    Identifier,
    Device,
    Store,
    Payload,
    EmbeddedTimestamp,
    Timestamp,
    Age,
    Gender,
    Role,
    Emotion,
    Transcript,
    LandedAt,
    Reason,
}

impl LogicalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::Device => "device",
            Self::Store => "store",
            Self::Payload => "payload",
            Self::EmbeddedTimestamp => "embedded_timestamp",
            Self::Timestamp => "timestamp",
            Self::Age => "age",
            Self::Gender => "gender",
            Self::Role => "role",
            Self::Emotion => "emotion",
            Self::Transcript => "transcript",
            Self::LandedAt => "landed_at",
            Self::Reason => "reason",
        }
    }
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The three upstream feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    RawEvents,
    Interactions,
    Overrides,
}

impl FeedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RawEvents => "raw_events",
            Self::Interactions => "interactions",
            Self::Overrides => "overrides",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Known physical names, highest priority first. Matched case-insensitively.
    pub candidates: Vec<String>,

    /// Documented fallback name, used verbatim when no candidate exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default)]
    pub required: bool,
}

impl FieldMapping {
    pub fn required(candidates: &[&str]) -> Self {
        Self {
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
            default: None,
            required: true,
        }
    }

    pub fn optional(candidates: &[&str]) -> Self {
        Self {
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
            default: None,
            required: false,
        }
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }
}

/// Declarative mapping table of one feed.
pub type FeedMapping = BTreeMap<LogicalField, FieldMapping>;

/// Mapping tables of every feed. Built-in defaults, optionally patched by `mappings.yml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingSet {
    #[serde(default = "default_raw_event_mapping")]
    pub raw_events: FeedMapping,
    #[serde(default = "default_interaction_mapping")]
    pub interactions: FeedMapping,
    #[serde(default = "default_override_mapping")]
    pub overrides: FeedMapping,
}

impl Default for MappingSet {
    fn default() -> Self {
        Self {
            raw_events: default_raw_event_mapping(),
            interactions: default_interaction_mapping(),
            overrides: default_override_mapping(),
        }
    }
}

impl MappingSet {
    pub fn feed(&self, kind: FeedKind) -> &FeedMapping {
        match kind {
            FeedKind::RawEvents => &self.raw_events,
            FeedKind::Interactions => &self.interactions,
            FeedKind::Overrides => &self.overrides,
        }
    }

    /// Field-level patch: every field present in `patch` replaces the built-in entry.
    pub fn merge(&mut self, patch: PartialMappingSet) {
        self.raw_events.extend(patch.raw_events);
        self.interactions.extend(patch.interactions);
        self.overrides.extend(patch.overrides);
    }
}

/// Shape of `mappings.yml`: only the fields that differ from the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialMappingSet {
    #[serde(default)]
    pub raw_events: FeedMapping,
    #[serde(default)]
    pub interactions: FeedMapping,
    #[serde(default)]
    pub overrides: FeedMapping,
}

pub fn default_raw_event_mapping() -> FeedMapping {
    BTreeMap::from([
        (
            LogicalField::Identifier,
            FieldMapping::required(&[
                "transaction_id",
                "canonical_tx_id",
                "transactionid",
                "txn_id",
                "id",
            ]),
        ),
        (
            LogicalField::Device,
            FieldMapping::optional(&["device_id", "deviceid"]),
        ),
        (
            LogicalField::Store,
            FieldMapping::optional(&["store_id", "storeid", "store"]),
        ),
        (
            LogicalField::Payload,
            FieldMapping::optional(&["payload_json", "payload", "raw_payload"]),
        ),
        (
            LogicalField::EmbeddedTimestamp,
            FieldMapping::optional(&["event_ts", "timestamp", "created_at"]),
        ),
    ])
}

pub fn default_interaction_mapping() -> FeedMapping {
    BTreeMap::from([
        (
            LogicalField::Identifier,
            FieldMapping::required(&[
                "interaction_id",
                "canonical_tx_id",
                "interactionid",
                "transaction_id",
            ]),
        ),
        (
            LogicalField::Store,
            FieldMapping::optional(&["store_id", "storeid"]),
        ),
        (
            LogicalField::Timestamp,
            FieldMapping::required(&["transaction_date", "txn_ts", "ts_ph", "created_date"]),
        ),
        (LogicalField::Age, FieldMapping::optional(&["age"])),
        (LogicalField::Gender, FieldMapping::optional(&["gender", "sex"])),
        (
            LogicalField::Role,
            FieldMapping::optional(&["role", "demographics_role", "role_id"]),
        ),
        (
            LogicalField::Emotion,
            FieldMapping::optional(&["emotion", "emotional_state"]),
        ),
        (
            LogicalField::Transcript,
            FieldMapping::optional(&["transcript", "transcription_text", "audio_transcript"]),
        ),
        (
            LogicalField::LandedAt,
            FieldMapping::optional(&["landed_at", "ingested_at", "loaded_at"]),
        ),
    ])
}

pub fn default_override_mapping() -> FeedMapping {
    BTreeMap::from([
        (
            LogicalField::Identifier,
            FieldMapping::required(&["canonical_id", "canonical_tx_id", "transaction_id"]),
        ),
        (
            LogicalField::Timestamp,
            FieldMapping::required(&["override_ts", "txn_ts", "timestamp"]),
        ),
        (
            LogicalField::Reason,
            FieldMapping::optional(&["reason", "note"]),
        ),
    ])
}

/// How a logical field ended up bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "column", rename_all = "snake_case")]
pub enum ResolvedColumn {
    /// A candidate exists in the table (physical spelling kept).
    Column(String),
    /// No candidate exists; the documented default name is used as-is.
    Default(String),
    /// Optional field with nothing to bind: read as NULL.
    Absent,
}

impl ResolvedColumn {
    pub fn column_name(&self) -> Option<&str> {
        match self {
            Self::Column(c) | Self::Default(c) => Some(c),
            Self::Absent => None,
        }
    }
}

/// Result of one resolution: a fixed, ordered projection for a feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSchema {
    pub feed: FeedKind,
    pub fields: Vec<(LogicalField, ResolvedColumn)>,
}

impl ResolvedSchema {
    /// Position of `field` in rows produced by [`ResolvedSchema::select_sql`].
    pub fn position(&self, field: LogicalField) -> Option<usize> {
        self.fields.iter().position(|(f, _)| *f == field)
    }

    pub fn width(&self) -> usize {
        self.fields.len()
    }

    pub fn column(&self, field: LogicalField) -> Option<&ResolvedColumn> {
        self.fields.iter().find(|(f, _)| *f == field).map(|(_, c)| c)
    }

    /// One set-oriented projection, every value cast to text.
    pub fn select_sql(&self, table: &str) -> String {
        let projection: Vec<String> = self
            .fields
            .iter()
            .map(|(field, resolved)| match resolved.column_name() {
                Some(col) => format!(
                    "CAST({} AS VARCHAR) AS {}",
                    quote_ident(col),
                    quote_ident(field.as_str())
                ),
                None => format!("CAST(NULL AS VARCHAR) AS {}", quote_ident(field.as_str())),
            })
            .collect();

        format!("SELECT {} FROM {}", projection.join(", "), quote_ident(table))
    }
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub struct ColumnResolver;

impl ColumnResolver {
    /// Resolve every logical field of `mapping` against the columns actually present.
    ///
    /// Fails with [`DomainError::SchemaResolution`] only for a required field that has
    /// no candidate in the table and no default.
    pub fn resolve(
        feed: FeedKind,
        mapping: &FeedMapping,
        available: &[String],
    ) -> Result<ResolvedSchema, DomainError> {
        let mut fields = Vec::with_capacity(mapping.len());

        for (field, spec) in mapping {
            let found = spec.candidates.iter().find_map(|candidate| {
                available
                    .iter()
                    .find(|col| col.eq_ignore_ascii_case(candidate))
            });

            let resolved = match (found, &spec.default) {
                (Some(col), _) => ResolvedColumn::Column(col.clone()),
                (None, Some(default)) => ResolvedColumn::Default(default.clone()),
                (None, None) if spec.required => {
                    return Err(DomainError::SchemaResolution {
                        feed: feed.to_string(),
                        field: field.to_string(),
                        candidates: spec.candidates.join(", "),
                    });
                }
                (None, None) => ResolvedColumn::Absent,
            };

            fields.push((*field, resolved));
        }

        Ok(ResolvedSchema { feed, fields })
    }
}
