// concord-core/src/domain/project/configuration.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::identity::MappingSet;
use crate::domain::persona::PersonaRuleSet;
use crate::domain::quality::SchemaContract;

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct ProjectConfig {
    #[validate(length(min = 1, message = "project name cannot be empty"))]
    pub name: String,
    pub version: String,

    /// DuckDB database file, relative to the project root. `:memory:` allowed.
    #[serde(default = "default_database")]
    #[validate(length(min = 1))]
    pub database: String,

    #[serde(rename = "config-paths", default = "default_config_paths")]
    pub config_paths: Vec<String>,

    #[serde(rename = "target-path", default = "default_target_path")]
    #[validate(length(min = 1))]
    pub target_path: String,

    #[serde(rename = "clean-targets", default = "default_clean_targets")]
    pub clean_targets: Vec<String>,

    #[validate(nested)]
    pub sources: SourcesConfig,

    #[serde(default)]
    #[validate(nested)]
    pub quality: QualitySettings,

    // Satellite files, hydrated by the loader
    #[serde(skip)]
    pub mappings: MappingSet,
    #[serde(skip)]
    pub contract: SchemaContract,
    #[serde(skip)]
    pub personas: PersonaRuleSet,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct SourcesConfig {
    #[validate(nested)]
    pub raw_events: SourceLocation,
    #[validate(nested)]
    pub interactions: SourceLocation,
    #[serde(default)]
    #[validate(nested)]
    pub overrides: Option<SourceLocation>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct SourceLocation {
    #[validate(length(min = 1, message = "source path cannot be empty"))]
    pub path: String,
}

/// Thresholds for the non-fatal findings of the quality report.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Validate)]
pub struct QualitySettings {
    #[serde(default = "default_duplicate_alert_ratio")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub duplicate_alert_ratio: f64,

    #[serde(default = "default_completeness_alert_below")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub completeness_alert_below: f64,

    /// Relative change of published rows vs. the previous run before a warning.
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub row_count_drift_ratio: Option<f64>,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            duplicate_alert_ratio: default_duplicate_alert_ratio(),
            completeness_alert_below: default_completeness_alert_below(),
            row_count_drift_ratio: None,
        }
    }
}

fn default_database() -> String {
    "concord.duckdb".to_string()
}
fn default_config_paths() -> Vec<String> {
    vec!["config".to_string()]
}
fn default_clean_targets() -> Vec<String> {
    vec!["target".to_string()]
}
fn default_target_path() -> String {
    "target".to_string()
}
fn default_duplicate_alert_ratio() -> f64 {
    0.05
}
fn default_completeness_alert_below() -> f64 {
    80.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    const MINIMAL: &str = r#"
name: store_reconciliation
version: "1.0"
sources:
  raw_events: { path: data/raw_events.csv }
  interactions: { path: data/interactions.csv }
"#;

    #[test]
    fn test_minimal_config_gets_defaults() -> Result<()> {
        let config: ProjectConfig = serde_yaml::from_str(MINIMAL)?;

        assert_eq!(config.database, "concord.duckdb");
        assert_eq!(config.target_path, "target");
        assert_eq!(config.config_paths, vec!["config"]);
        assert!(config.sources.overrides.is_none());
        assert_eq!(config.quality, QualitySettings::default());
        assert!(config.validate().is_ok());
        Ok(())
    }

    #[test]
    fn test_out_of_range_thresholds_rejected() -> Result<()> {
        let yaml = format!("{MINIMAL}quality:\n  duplicate_alert_ratio: 1.5\n");
        let config: ProjectConfig = serde_yaml::from_str(&yaml)?;
        assert!(config.validate().is_err());
        Ok(())
    }

    #[test]
    fn test_empty_source_path_rejected() -> Result<()> {
        let yaml = MINIMAL.replace("data/raw_events.csv", "\"\"");
        let config: ProjectConfig = serde_yaml::from_str(&yaml)?;
        assert!(config.validate().is_err());
        Ok(())
    }
}
