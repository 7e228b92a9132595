// concord-core/src/domain/identity/normalizer.rs

use crate::domain::error::DomainError;

/// Characters that only carry formatting, never identity.
const SEPARATORS: [char; 2] = ['-', '_'];

/// Canonical form of a transaction identifier: lowercase, separators removed.
///
/// `"ABC-123"`, `"abc_123"` and `"Abc123"` all map to `"abc123"`, and
/// `normalize(normalize(x)) == normalize(x)` for every accepted input.
/// Fails with [`DomainError::InvalidIdentifier`] when nothing is left after
/// trimming; callers treat that record as unmatchable.
pub fn normalize(identifier: &str) -> Result<String, DomainError> {
    let canonical: String = identifier
        .trim()
        .chars()
        .filter(|c| !SEPARATORS.contains(c))
        .flat_map(char::to_lowercase)
        .collect();

    // Inner whitespace can surface once separators are gone ("- 12" -> " 12")
    let canonical = canonical.trim().to_string();

    if canonical.is_empty() {
        return Err(DomainError::InvalidIdentifier(identifier.to_string()));
    }
    Ok(canonical)
}

/// `None` for absent or invalid identifiers.
pub fn normalize_opt(identifier: Option<&str>) -> Option<String> {
    identifier.and_then(|id| normalize(id).ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_invariance() {
        let a = normalize("AB-12").unwrap();
        let b = normalize("ab12").unwrap();
        let c = normalize("Ab_12").unwrap();
        assert_eq!(a, "ab12");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_idempotence() {
        let samples = [
            "ABC-123",
            "  tx_2025-03-10_0001 ",
            "ÉCOLE-9",
            "a-_-b",
            "MiXeD_Case-Id",
            "0f8fad5b-d9cb-469f-a165-70867728950e",
        ];
        for raw in samples {
            let once = normalize(raw).unwrap();
            let twice = normalize(&once).unwrap();
            assert_eq!(once, twice, "normalize must be idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_empty_identifiers_are_rejected() {
        for raw in ["", "   ", "---", "_-_", " - "] {
            let res = normalize(raw);
            assert!(
                matches!(res, Err(DomainError::InvalidIdentifier(_))),
                "{raw:?} should be invalid"
            );
        }
    }

    #[test]
    fn test_normalize_opt() {
        assert_eq!(normalize_opt(Some("ABC-123")), Some("abc123".to_string()));
        assert_eq!(normalize_opt(Some("  ")), None);
        assert_eq!(normalize_opt(None), None);
    }
}
