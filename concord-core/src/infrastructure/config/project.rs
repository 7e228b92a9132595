// concord-core/src/infrastructure/config/project.rs

use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::identity::resolver::PartialMappingSet;
use crate::domain::persona::PersonaRuleSet;
use crate::domain::project::configuration::ProjectConfig;
use crate::domain::quality::SchemaContract;
use crate::infrastructure::error::InfrastructureError;

pub const ENV_TARGET_PATH: &str = "CONCORD_TARGET_PATH";
pub const ENV_DATABASE: &str = "CONCORD_DATABASE";

#[instrument(skip(project_dir))]
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    load_project_config_with_env(project_dir, |key| std::env::var(key).ok())
}

/// Same as [`load_project_config`] with an explicit environment lookup.
pub fn load_project_config_with_env<F>(
    project_dir: &Path,
    env: F,
) -> Result<ProjectConfig, InfrastructureError>
where
    F: Fn(&str) -> Option<String>,
{
    // 1. Main file
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project configuration");

    let mut config: ProjectConfig = load_fragment(&config_path)?;

    // 2. Satellites
    if let Some(config_folder) = config.config_paths.first() {
        let config_dir = project_dir.join(config_folder);
        if config_dir.exists() {
            load_satellite_configs(&mut config, &config_dir)?;
        }
    }

    // 3. Environment layering: CONCORD_TARGET_PATH=/tmp/out concord run
    apply_env_overrides(&mut config, env);

    config
        .validate()
        .map_err(|e| InfrastructureError::ConfigError(e.to_string()))?;
    config
        .personas
        .validate()
        .map_err(|e| InfrastructureError::ConfigError(e.to_string()))?;

    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    let candidates = ["concord.yaml", "concord_project_conf.yaml"];
    for filename in candidates {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, candidates
    )))
}

/// Loads one typed YAML document.
fn load_fragment<T: DeserializeOwned>(path: &Path) -> Result<T, InfrastructureError> {
    let content = fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|source| InfrastructureError::Yaml {
        path: path.display().to_string(),
        source,
    })
}

fn load_satellite_configs(
    config: &mut ProjectConfig,
    config_dir: &Path,
) -> Result<(), InfrastructureError> {
    // A. Column mappings, patched over the built-ins
    let mappings_path = config_dir.join("mappings.yml");
    if mappings_path.exists() {
        let patch: PartialMappingSet = load_fragment(&mappings_path)?;
        config.mappings.merge(patch);
        info!("  Column mappings loaded");
    }

    // B. Export contract
    let contract_path = config_dir.join("contract.yml");
    if contract_path.exists() {
        config.contract = load_fragment::<SchemaContract>(&contract_path)?;
        info!(
            columns = config.contract.columns.len(),
            "  Export contract loaded"
        );
    }

    // C. Persona rules replace the built-in set
    let personas_path = config_dir.join("personas.yml");
    if personas_path.exists() {
        config.personas = load_fragment::<PersonaRuleSet>(&personas_path)?;
        info!(rules = config.personas.rules.len(), "  Persona rules loaded");
    }

    Ok(())
}

fn apply_env_overrides<F>(config: &mut ProjectConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = env(ENV_TARGET_PATH) {
        info!(old = ?config.target_path, new = ?val, "Overriding target path via ENV");
        config.target_path = val;
    }
    if let Some(val) = env(ENV_DATABASE) {
        info!(old = ?config.database, new = ?val, "Overriding database via ENV");
        config.database = val;
    }
}
