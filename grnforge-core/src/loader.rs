//! Reading genotypes, environments and engine settings from YAML files.

use crate::{binding, error::GrnforgeError};
use grnforge_schemas::{
    engine_config::EngineConfig,
    environment::Environment,
    file_formats::{EngineConfigFile, EnvironmentFile, GenotypeFile},
    genotype::Genotype,
};
use serde::de::DeserializeOwned;
use std::{fs, path::Path};

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, GrnforgeError> {
    let name = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| GrnforgeError::FileIO(name.clone(), e))?;
    serde_yaml::from_str(&content).map_err(|e| GrnforgeError::YamlParsing(name, e))
}

/// Loads a genotype and prepares its binding sites with [`binding::annotate_genotype`].
pub fn load_genotype(path: impl AsRef<Path>, config: &EngineConfig) -> Result<Genotype, GrnforgeError> {
    let file: GenotypeFile = read_yaml(path.as_ref())?;
    let mut genotype = file.genotype;
    binding::annotate_genotype(&mut genotype, &config.binding);
    Ok(genotype)
}

pub fn load_environments(path: impl AsRef<Path>) -> Result<Vec<Environment>, GrnforgeError> {
    let file: EnvironmentFile = read_yaml(path.as_ref())?;
    if file.environments.is_empty() {
        return Err(GrnforgeError::ConfigError(format!(
            "'{}' defines no environments",
            path.as_ref().display()
        )));
    }
    Ok(file.environments)
}

/// Loads engine settings. Omitted groups and fields take their defaults.
pub fn load_engine_config(path: impl AsRef<Path>) -> Result<EngineConfig, GrnforgeError> {
    let file: EngineConfigFile = read_yaml(path.as_ref())?;
    Ok(file.engine)
}
