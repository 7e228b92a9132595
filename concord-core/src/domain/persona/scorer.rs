// concord-core/src/domain/persona/scorer.rs

use std::collections::BTreeMap;

use chrono::Timelike;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::dimensions::{DayType, Daypart};
use crate::domain::error::DomainError;
use crate::domain::model::CanonicalTransaction;
use crate::domain::persona::label::PersonaLabel;
use crate::domain::persona::rules::{PersonaRuleSet, Signal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaSource {
    /// Taken from the interaction's role field.
    Explicit,
    Scored,
    /// Nothing scored above zero.
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaScore {
    pub canonical_id: Option<String>,
    pub label: PersonaLabel,
    pub scores: BTreeMap<PersonaLabel, f64>,
    pub source: PersonaSource,
    pub confidence: f64,
}

/// Runtime form of a signal; keyword lists are compiled once.
enum CompiledSignal {
    Temporal {
        dayparts: Vec<Daypart>,
        hours: Vec<u32>,
        day_types: Vec<DayType>,
    },
    Categorical {
        categories: Vec<String>,
        brands: Vec<String>,
    },
    Demographic {
        min_age: Option<u8>,
        max_age: Option<u8>,
        gender: Option<String>,
    },
    Text(Regex),
}

struct CompiledRule {
    label: PersonaLabel,
    weight: f64,
    signals: Vec<CompiledSignal>,
}

pub struct PersonaScorer {
    rules: Vec<CompiledRule>,
    priority: Vec<PersonaLabel>,
}

impl PersonaScorer {
    pub fn new(rule_set: &PersonaRuleSet) -> Result<Self, DomainError> {
        rule_set.validate()?;

        let mut rules = Vec::with_capacity(rule_set.rules.len());
        for rule in &rule_set.rules {
            let signals = rule
                .when
                .iter()
                .map(compile_signal)
                .collect::<Result<Vec<_>, _>>()?;
            rules.push(CompiledRule {
                label: rule.label,
                weight: rule.weight,
                signals,
            });
        }

        Ok(Self {
            rules,
            priority: rule_set.priority.clone(),
        })
    }

    /// Scores one transaction. Absent signals contribute nothing; never fails.
    pub fn score(&self, txn: &CanonicalTransaction, free_text: Option<&str>) -> PersonaScore {
        let mut scores: BTreeMap<PersonaLabel, f64> =
            self.priority.iter().map(|label| (*label, 0.0)).collect();

        for rule in &self.rules {
            if rule.signals.iter().all(|s| signal_holds(s, txn, free_text)) {
                *scores.entry(rule.label).or_insert(0.0) += rule.weight;
            }
        }

        let explicit = txn.role.as_deref().and_then(|role| match role.parse() {
            Ok(PersonaLabel::Unknown) => None,
            Ok(label) => Some(label),
            Err(e) => {
                debug!(canonical_id = ?txn.canonical_id, "Ignoring role signal: {}", e);
                None
            }
        });

        let (label, source, confidence) = match explicit {
            Some(label) => (label, PersonaSource::Explicit, 1.0),
            None => self.pick(&scores),
        };

        PersonaScore {
            canonical_id: txn.canonical_id.clone(),
            label,
            scores,
            source,
            confidence,
        }
    }

    /// Strictly highest score wins; ties go to the earlier label in `priority`.
    fn pick(&self, scores: &BTreeMap<PersonaLabel, f64>) -> (PersonaLabel, PersonaSource, f64) {
        let mut best: Option<(PersonaLabel, f64)> = None;
        for label in &self.priority {
            let score = scores.get(label).copied().unwrap_or(0.0);
            if score > best.map_or(0.0, |(_, s)| s) {
                best = Some((*label, score));
            }
        }

        match best {
            Some((label, top)) => {
                let total: f64 = scores.values().filter(|s| **s > 0.0).sum();
                (label, PersonaSource::Scored, top / total)
            }
            None => (PersonaLabel::Unknown, PersonaSource::Default, 0.0),
        }
    }

    /// Scores a full batch with each transaction's own free text, in order.
    pub fn score_all(&self, transactions: &[CanonicalTransaction]) -> Vec<PersonaScore> {
        transactions
            .par_iter()
            .map(|txn| self.score(txn, txn.free_text()))
            .collect()
    }
}

fn compile_signal(signal: &Signal) -> Result<CompiledSignal, DomainError> {
    let lower = |list: &[String]| -> Vec<String> {
        list.iter().map(|s| s.trim().to_lowercase()).collect()
    };

    Ok(match signal {
        Signal::Temporal {
            dayparts,
            hours,
            day_types,
        } => CompiledSignal::Temporal {
            dayparts: dayparts.clone(),
            hours: hours.clone(),
            day_types: day_types.clone(),
        },
        Signal::Categorical { categories, brands } => CompiledSignal::Categorical {
            categories: lower(categories),
            brands: lower(brands),
        },
        Signal::Demographic {
            min_age,
            max_age,
            gender,
        } => CompiledSignal::Demographic {
            min_age: *min_age,
            max_age: *max_age,
            gender: gender.as_deref().map(|g| g.trim().to_lowercase()),
        },
        Signal::Text { keywords } => {
            let alternatives: Vec<String> = keywords
                .iter()
                .map(|k| k.trim())
                .filter(|k| !k.is_empty())
                .map(regex::escape)
                .collect();
            if alternatives.is_empty() {
                return Err(DomainError::InvalidConfiguration(
                    "text signal without keywords".to_string(),
                ));
            }
            let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
            let regex = Regex::new(&pattern).map_err(|e| {
                DomainError::InvalidConfiguration(format!("keyword pattern {}: {}", pattern, e))
            })?;
            CompiledSignal::Text(regex)
        }
    })
}

fn signal_holds(signal: &CompiledSignal, txn: &CanonicalTransaction, free_text: Option<&str>) -> bool {
    match signal {
        CompiledSignal::Temporal {
            dayparts,
            hours,
            day_types,
        } => {
            let Some(ts) = txn.txn_ts else {
                return false;
            };
            (dayparts.is_empty() || txn.daypart.is_some_and(|d| dayparts.contains(&d)))
                && (hours.is_empty() || hours.contains(&ts.hour()))
                && (day_types.is_empty() || txn.day_type.is_some_and(|d| day_types.contains(&d)))
        }
        CompiledSignal::Categorical { categories, brands } => {
            let in_list = |value: Option<&String>, list: &[String]| {
                value.is_some_and(|v| list.contains(&v.trim().to_lowercase()))
            };
            in_list(txn.business.category.as_ref(), categories)
                || in_list(txn.business.brand.as_ref(), brands)
        }
        CompiledSignal::Demographic {
            min_age,
            max_age,
            gender,
        } => {
            let age_ok = match (min_age, max_age) {
                (None, None) => true,
                _ => txn.age.is_some_and(|age| {
                    min_age.is_none_or(|min| age >= min) && max_age.is_none_or(|max| age <= max)
                }),
            };
            let gender_ok = gender.as_ref().is_none_or(|wanted| {
                txn.gender
                    .as_deref()
                    .is_some_and(|g| g.trim().eq_ignore_ascii_case(wanted))
            });
            age_ok && gender_ok
        }
        CompiledSignal::Text(regex) => free_text.is_some_and(|text| regex.is_match(text)),
    }
}
