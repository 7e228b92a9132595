// concord-core/src/domain/persona/rules.rs

use serde::{Deserialize, Serialize};

use crate::domain::dimensions::{DayType, Daypart};
use crate::domain::error::DomainError;
use crate::domain::persona::label::PersonaLabel;

/// One observable condition. A rule fires when all of its signals hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum Signal {
    /// Matches when the transaction time falls in any listed daypart/hour/day type.
    /// Empty lists are not constraints.
    Temporal {
        #[serde(default)]
        dayparts: Vec<Daypart>,
        #[serde(default)]
        hours: Vec<u32>,
        #[serde(default)]
        day_types: Vec<DayType>,
    },
    Categorical {
        #[serde(default)]
        categories: Vec<String>,
        #[serde(default)]
        brands: Vec<String>,
    },
    Demographic {
        #[serde(default)]
        min_age: Option<u8>,
        #[serde(default)]
        max_age: Option<u8>,
        #[serde(default)]
        gender: Option<String>,
    },
    Text { keywords: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRule {
    pub label: PersonaLabel,
    pub weight: f64,
    pub when: Vec<Signal>,
}

/// Content of `personas.yml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaRuleSet {
    pub rules: Vec<ScoringRule>,
    #[serde(default = "default_priority")]
    pub priority: Vec<PersonaLabel>,
}

fn default_priority() -> Vec<PersonaLabel> {
    PersonaLabel::SCORED.to_vec()
}

impl Default for PersonaRuleSet {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            priority: default_priority(),
        }
    }
}

impl PersonaRuleSet {
    pub fn validate(&self) -> Result<(), DomainError> {
        for (idx, rule) in self.rules.iter().enumerate() {
            if rule.label == PersonaLabel::Unknown {
                return Err(DomainError::InvalidConfiguration(format!(
                    "persona rule #{} scores Unknown, which is reserved for the fallback",
                    idx + 1
                )));
            }
            if !rule.weight.is_finite() || rule.weight <= 0.0 {
                return Err(DomainError::InvalidConfiguration(format!(
                    "persona rule #{} ({}) needs a positive weight, got {}",
                    idx + 1,
                    rule.label,
                    rule.weight
                )));
            }
            if rule.when.is_empty() {
                return Err(DomainError::InvalidConfiguration(format!(
                    "persona rule #{} ({}) has no signals",
                    idx + 1,
                    rule.label
                )));
            }
            if !self.priority.contains(&rule.label) {
                return Err(DomainError::InvalidConfiguration(format!(
                    "persona label {} is scored but missing from the priority list",
                    rule.label
                )));
            }
        }
        Ok(())
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn text(keywords: &[&str]) -> Signal {
    Signal::Text {
        keywords: words(keywords),
    }
}

fn categories(list: &[&str]) -> Signal {
    Signal::Categorical {
        categories: words(list),
        brands: vec![],
    }
}

fn ages(min_age: Option<u8>, max_age: Option<u8>) -> Signal {
    Signal::Demographic {
        min_age,
        max_age,
        gender: None,
    }
}

fn rule(label: PersonaLabel, weight: f64, when: Vec<Signal>) -> ScoringRule {
    ScoringRule {
        label,
        weight,
        when,
    }
}

/// Built-in rules. Keyword evidence outweighs indirect signals.
pub fn default_rules() -> Vec<ScoringRule> {
    use PersonaLabel::*;

    vec![
        rule(
            Student,
            3.0,
            vec![
                ages(Some(13), Some(25)),
                Signal::Temporal {
                    dayparts: vec![Daypart::Morning, Daypart::Afternoon],
                    hours: vec![],
                    day_types: vec![],
                },
                categories(&["snacks", "noodles", "beverages"]),
            ],
        ),
        rule(Student, 1.0, vec![ages(Some(13), Some(22))]),
        rule(
            Student,
            5.0,
            vec![text(&[
                "school", "class", "teacher", "exam", "homework", "estudyante", "classmate",
                "baon", "university", "college",
            ])],
        ),
        rule(
            OfficeWorker,
            2.0,
            vec![
                ages(Some(23), Some(55)),
                Signal::Temporal {
                    dayparts: vec![],
                    hours: vec![7, 8, 9],
                    day_types: vec![DayType::Weekday],
                },
                categories(&["beverages", "coffee"]),
            ],
        ),
        rule(
            OfficeWorker,
            5.0,
            vec![text(&["office", "meeting", "boss", "deadline", "opisina", "overtime"])],
        ),
        rule(
            DeliveryWorker,
            2.0,
            vec![Signal::Categorical {
                categories: words(&["energy drinks"]),
                brands: words(&["red bull", "cobra", "sting", "extra joss"]),
            }],
        ),
        rule(
            DeliveryWorker,
            5.0,
            vec![text(&[
                "delivery", "rider", "deliver", "parcel", "booking", "grab", "lalamove", "foodpanda",
            ])],
        ),
        rule(
            Parent,
            2.5,
            vec![categories(&["baby care", "diapers", "milk", "infant formula"])],
        ),
        rule(
            Parent,
            5.0,
            vec![text(&["anak", "baby", "kids", "son", "daughter", "diaper", "gatas"])],
        ),
        rule(SeniorCitizen, 3.0, vec![ages(Some(60), None)]),
        rule(
            SeniorCitizen,
            5.0,
            vec![text(&["senior", "lolo", "lola", "apo", "pension", "retired"])],
        ),
    ]
}
