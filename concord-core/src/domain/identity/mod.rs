// concord-core/src/domain/identity/mod.rs

pub mod normalizer;
pub mod resolver;

pub use normalizer::{normalize, normalize_opt};
pub use resolver::{
    ColumnResolver, FeedKind, FeedMapping, FieldMapping, LogicalField, MappingSet, ResolvedColumn,
    ResolvedSchema,
};
