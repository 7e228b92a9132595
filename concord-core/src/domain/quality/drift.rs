// concord-core/src/domain/quality/drift.rs

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DriftFinding {
    #[error(
        "Row count drift too high: {deviation:.2}% (threshold: {threshold:.2}%). Prev: {prev}, Curr: {curr}"
    )]
    DeviationExceeded {
        deviation: f64,
        threshold: f64,
        prev: u64,
        curr: u64,
    },
    #[error("No previous run recorded; row count drift not checked")]
    NoHistory,
}

/// Compares the published row count with the previous run's.
pub struct RowCountDrift;

impl RowCountDrift {
    /// `threshold` is relative, e.g. 0.2 for 20%.
    pub fn check(current: u64, previous: Option<u64>, threshold: f64) -> Result<(), DriftFinding> {
        let prev = match previous {
            Some(p) if p > 0 => p,
            // Empty previous publication: any volume is a recovery
            Some(_) => return Ok(()),
            None => return Err(DriftFinding::NoHistory),
        };

        let diff = current.abs_diff(prev);
        let ratio = diff as f64 / prev as f64;

        if ratio > threshold {
            return Err(DriftFinding::DeviationExceeded {
                deviation: ratio * 100.0,
                threshold: threshold * 100.0,
                prev,
                curr: current,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_threshold() {
        assert!(RowCountDrift::check(1040, Some(1000), 0.05).is_ok());
    }

    #[test]
    fn test_growth_and_shrink_exceed() {
        assert!(matches!(
            RowCountDrift::check(1100, Some(1000), 0.05),
            Err(DriftFinding::DeviationExceeded { prev: 1000, curr: 1100, .. })
        ));
        assert!(matches!(
            RowCountDrift::check(900, Some(1000), 0.05),
            Err(DriftFinding::DeviationExceeded { .. })
        ));
    }

    #[test]
    fn test_first_run() {
        assert_eq!(RowCountDrift::check(100, None, 0.05), Err(DriftFinding::NoHistory));
        assert!(RowCountDrift::check(100, Some(0), 0.05).is_ok());
    }
}
