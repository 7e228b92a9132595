// concord-core/src/domain/quality/duplicates.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One canonical id held by more than one row. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub canonical_id: String,
    pub size: usize,
    /// Feed positions of the rows in the group.
    pub positions: Vec<usize>,
}

/// Groups ids (already normalized) and keeps those seen more than once.
/// Rows without an id are not part of any group. Output is sorted by id.
pub fn find_duplicate_groups<'a, I>(ids: I) -> Vec<DuplicateGroup>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (position, id) in ids.into_iter().enumerate() {
        if let Some(id) = id {
            groups.entry(id).or_default().push(position);
        }
    }

    groups
        .into_iter()
        .filter(|(_, positions)| positions.len() > 1)
        .map(|(id, positions)| DuplicateGroup {
            canonical_id: id.to_string(),
            size: positions.len(),
            positions,
        })
        .collect()
}

/// Share of rows that belong to a duplicate group.
pub fn duplicate_ratio(groups: &[DuplicateGroup], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rows: usize = groups.iter().map(|g| g.size).sum();
    rows as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_rows_sharing_an_id_make_one_group() {
        let ids = [Some("abc123"), Some("abc123"), Some("def456")];
        let groups = find_duplicate_groups(ids);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].canonical_id, "abc123");
        assert_eq!(groups[0].size, 2);
        assert_eq!(groups[0].positions, vec![0, 1]);
    }

    #[test]
    fn test_missing_ids_are_not_duplicates() {
        let groups = find_duplicate_groups([None, None, Some("a")]);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_ratio() {
        let groups = find_duplicate_groups([Some("a"), Some("a"), Some("b"), Some("c")]);
        assert!((duplicate_ratio(&groups, 4) - 0.5).abs() < 1e-9);
        assert_eq!(duplicate_ratio(&[], 0), 0.0);
    }
}
