// concord-core/src/application/ingest.rs
//
// Feed loading: register each source, resolve its columns once, pull it with a
// single projection and parse the text rows into domain records.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::domain::identity::{ColumnResolver, FeedKind, LogicalField, MappingSet, ResolvedSchema};
use crate::domain::model::{AuthoritativeInteraction, OverrideRecord, RawEvent, parse_timestamp};
use crate::domain::project::{ProjectConfig, SourceLocation};
use crate::error::ConcordError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::connector::{Connector, Row};

/// Full input snapshot of one run.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    pub raw_events: Vec<RawEvent>,
    pub interactions: Vec<AuthoritativeInteraction>,
    pub overrides: Vec<OverrideRecord>,
    pub schemas: Vec<ResolvedSchema>,
}

fn absolute(project_dir: &Path, source: &SourceLocation) -> PathBuf {
    let raw = Path::new(&source.path);
    if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        project_dir.join(raw)
    }
}

/// Registers a feed as a view. Returns false when an optional feed is missing.
async fn register_feed(
    connector: &dyn Connector,
    project_dir: &Path,
    kind: FeedKind,
    source: &SourceLocation,
    required: bool,
) -> Result<bool, ConcordError> {
    let path = absolute(project_dir, source);
    if !path.exists() {
        if required {
            return Err(InfrastructureError::SourceNotFound {
                feed: kind.to_string(),
                path: path.display().to_string(),
            }
            .into());
        }
        warn!(feed = %kind, path = ?path, "Optional feed not found, continuing with an empty set");
        return Ok(false);
    }

    connector
        .register_source(kind.as_str(), &path.to_string_lossy())
        .await?;
    Ok(true)
}

/// Binds every logical field of `kind` to a physical column of its view.
pub async fn resolve_feed(
    connector: &dyn Connector,
    kind: FeedKind,
    mappings: &MappingSet,
) -> Result<ResolvedSchema, ConcordError> {
    let available: Vec<String> = connector
        .fetch_columns(kind.as_str())
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();

    let schema = ColumnResolver::resolve(kind, mappings.feed(kind), &available)?;
    for (field, column) in &schema.fields {
        debug!(feed = %kind, field = %field, column = ?column, "Resolved column");
    }
    Ok(schema)
}

async fn fetch_feed(
    connector: &dyn Connector,
    kind: FeedKind,
    mappings: &MappingSet,
) -> Result<(ResolvedSchema, Vec<Row>), ConcordError> {
    let schema = resolve_feed(connector, kind, mappings).await?;
    let rows = connector
        .query_rows(&schema.select_sql(kind.as_str()), schema.width())
        .await?;
    info!(feed = %kind, rows = rows.len(), "Feed loaded");
    Ok((schema, rows))
}

#[instrument(skip_all)]
pub async fn ingest(
    connector: &dyn Connector,
    project_dir: &Path,
    config: &ProjectConfig,
) -> Result<FeedSnapshot, ConcordError> {
    let sources = &config.sources;
    register_feed(connector, project_dir, FeedKind::RawEvents, &sources.raw_events, true).await?;
    register_feed(connector, project_dir, FeedKind::Interactions, &sources.interactions, true).await?;
    let has_overrides = match &sources.overrides {
        Some(source) => {
            register_feed(connector, project_dir, FeedKind::Overrides, source, false).await?
        }
        None => false,
    };

    let mappings = &config.mappings;
    let (raw, interactions) = futures::try_join!(
        fetch_feed(connector, FeedKind::RawEvents, mappings),
        fetch_feed(connector, FeedKind::Interactions, mappings),
    )?;

    let mut snapshot = FeedSnapshot {
        raw_events: parse_raw_events(&raw.0, &raw.1),
        interactions: parse_interactions(&interactions.0, &interactions.1),
        overrides: vec![],
        schemas: vec![raw.0, interactions.0],
    };

    if has_overrides {
        let (schema, rows) = fetch_feed(connector, FeedKind::Overrides, mappings).await?;
        snapshot.overrides = parse_overrides(&schema, &rows);
        snapshot.schemas.push(schema);
    }

    Ok(snapshot)
}

/// Reads one logical field out of a projected row. Blank text reads as unset.
struct RowReader<'a> {
    schema: &'a ResolvedSchema,
}

impl<'a> RowReader<'a> {
    fn get<'r>(&self, row: &'r Row, field: LogicalField) -> Option<&'r str> {
        let idx = self.schema.position(field)?;
        row.get(idx)?
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn owned(&self, row: &Row, field: LogicalField) -> Option<String> {
        self.get(row, field).map(str::to_string)
    }

    fn timestamp(&self, row: &Row, field: LogicalField) -> Option<chrono::NaiveDateTime> {
        let raw = self.get(row, field)?;
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            debug!(feed = %self.schema.feed, field = %field, value = raw, "Unparseable timestamp");
        }
        parsed
    }
}

pub fn parse_raw_events(schema: &ResolvedSchema, rows: &[Row]) -> Vec<RawEvent> {
    let r = RowReader { schema };
    rows.iter()
        .enumerate()
        .map(|(position, row)| RawEvent {
            position,
            raw_id: r.owned(row, LogicalField::Identifier),
            device_id: r.owned(row, LogicalField::Device),
            store_id: r.owned(row, LogicalField::Store),
            payload: r.owned(row, LogicalField::Payload),
            embedded_ts: r.owned(row, LogicalField::EmbeddedTimestamp),
        })
        .collect()
}

fn parse_age(raw: &str) -> Option<u8> {
    let value: f64 = raw.parse().ok()?;
    (0.0..=130.0)
        .contains(&value)
        .then_some(value.round() as u8)
}

pub fn parse_interactions(schema: &ResolvedSchema, rows: &[Row]) -> Vec<AuthoritativeInteraction> {
    let r = RowReader { schema };
    rows.iter()
        .enumerate()
        .map(|(position, row)| AuthoritativeInteraction {
            position,
            enterprise_id: r.owned(row, LogicalField::Identifier),
            store_id: r.owned(row, LogicalField::Store),
            timestamp: r.timestamp(row, LogicalField::Timestamp),
            age: r.get(row, LogicalField::Age).and_then(parse_age),
            gender: r.owned(row, LogicalField::Gender),
            role: r.owned(row, LogicalField::Role),
            emotion: r.owned(row, LogicalField::Emotion),
            transcript: r.owned(row, LogicalField::Transcript),
            landed_at: r.timestamp(row, LogicalField::LandedAt),
        })
        .collect()
}

/// Rows without an id or a usable timestamp cannot correct anything and are skipped.
pub fn parse_overrides(schema: &ResolvedSchema, rows: &[Row]) -> Vec<OverrideRecord> {
    let r = RowReader { schema };
    let mut out = Vec::with_capacity(rows.len());
    for (position, row) in rows.iter().enumerate() {
        match (
            r.owned(row, LogicalField::Identifier),
            r.timestamp(row, LogicalField::Timestamp),
        ) {
            (Some(canonical_id), Some(override_ts)) => out.push(OverrideRecord {
                position,
                canonical_id,
                override_ts,
                reason: r.owned(row, LogicalField::Reason),
            }),
            _ => warn!(position, "Skipping override row without id or timestamp"),
        }
    }
    out
}
