// concord-core/src/domain/persona/label.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of customer-behaviour labels.
/// Declaration order is the default tie-break priority (highest first).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum PersonaLabel {
    Student,
    OfficeWorker,
    DeliveryWorker,
    Parent,
    SeniorCitizen,
    #[default]
    Unknown,
}

impl PersonaLabel {
    /// Labels a rule may score. `Unknown` is only ever the fallback.
    pub const SCORED: [PersonaLabel; 5] = [
        PersonaLabel::Student,
        PersonaLabel::OfficeWorker,
        PersonaLabel::DeliveryWorker,
        PersonaLabel::Parent,
        PersonaLabel::SeniorCitizen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::OfficeWorker => "OfficeWorker",
            Self::DeliveryWorker => "DeliveryWorker",
            Self::Parent => "Parent",
            Self::SeniorCitizen => "SeniorCitizen",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PersonaLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PersonaLabel {
    type Err = String;

    /// Parses the free-form role values found in interaction feeds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "student" | "estudyante" | "pupil" => Ok(Self::Student),
            "officeworker" | "office" | "employee" | "professional" => Ok(Self::OfficeWorker),
            "deliveryworker" | "delivery" | "rider" | "courier" | "driver" => {
                Ok(Self::DeliveryWorker)
            }
            "parent" | "mother" | "father" | "nanay" | "tatay" => Ok(Self::Parent),
            "seniorcitizen" | "senior" | "elderly" | "retiree" => Ok(Self::SeniorCitizen),
            "unknown" | "regular" => Ok(Self::Unknown),
            _ => Err(format!("Unknown persona role: '{}'", s)),
        }
    }
}
