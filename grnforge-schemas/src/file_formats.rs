use crate::{engine_config::EngineConfig, environment::Environment, genotype::Genotype};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct GenotypeFile {
    pub schema_version: String,
    pub genotype: Genotype,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnvironmentFile {
    pub schema_version: String,
    pub environments: Vec<Environment>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EngineConfigFile {
    pub schema_version: String,
    #[serde(default)]
    pub engine: EngineConfig,
}
