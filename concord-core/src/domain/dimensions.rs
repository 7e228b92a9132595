// concord-core/src/domain/dimensions.rs

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse time-of-day bucket. Together the four buckets cover 00:00-23:59 exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Daypart {
    /// 06:00-11:59
    Morning,
    /// 12:00-17:59
    Afternoon,
    /// 18:00-22:59
    Evening,
    /// 23:00-05:59
    Night,
}

impl Daypart {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            18..=22 => Self::Evening,
            _ => Self::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
            Self::Night => "Night",
        }
    }
}

impl fmt::Display for Daypart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayType {
    Weekday,
    Weekend,
}

impl DayType {
    pub const WEEKEND_DAYS: [Weekday; 2] = [Weekday::Sat, Weekday::Sun];

    pub fn from_weekday(day: Weekday) -> Self {
        if Self::WEEKEND_DAYS.contains(&day) {
            Self::Weekend
        } else {
            Self::Weekday
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekday => "Weekday",
            Self::Weekend => "Weekend",
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DerivedDimensions {
    pub daypart: Option<Daypart>,
    pub day_type: Option<DayType>,
}

/// Pure function of the authoritative timestamp.
///
/// No timestamp, no dimensions: nothing is ever guessed from another clock.
pub fn derive_dimensions(txn_ts: Option<NaiveDateTime>) -> DerivedDimensions {
    match txn_ts {
        Some(ts) => DerivedDimensions {
            daypart: Some(Daypart::from_hour(ts.hour())),
            day_type: Some(DayType::from_weekday(ts.weekday())),
        },
        None => DerivedDimensions::default(),
    }
}
