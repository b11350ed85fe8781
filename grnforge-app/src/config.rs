use anyhow::{Context, Result};
use grnforge_core::{binding, loader};
use grnforge_schemas::{
    engine_config::EngineConfig,
    environment::Environment,
    file_formats::{EngineConfigFile, EnvironmentFile, GenotypeFile},
    genotype::Genotype,
};
use std::{fs, path::Path};

const SCHEMA_VERSION: &str = "1.0";

/// Everything a run reads from disk.
pub struct RunInputs {
    pub genotype: Genotype,
    pub environments: Vec<Environment>,
    pub engine: EngineConfig,
}

impl RunInputs {
    /// Loads the inputs. Without an engine file, every engine setting takes its default.
    pub fn load(genotype_path: &Path, environments_path: &Path, engine_path: Option<&Path>) -> Result<Self> {
        println!("Loading inputs...");

        let engine = match engine_path {
            Some(path) => loader::load_engine_config(path)
                .with_context(|| format!("Failed to load engine settings from {:?}", path))?,
            None => EngineConfig::default(),
        };
        let genotype = loader::load_genotype(genotype_path, &engine)
            .with_context(|| format!("Failed to load genotype from {:?}", genotype_path))?;
        let environments = loader::load_environments(environments_path)
            .with_context(|| format!("Failed to load environments from {:?}", environments_path))?;

        let span = engine.binding.exclusion_span();
        for gene in &genotype.genes {
            let free = binding::max_unhindered_sites(&gene.binding_sites, &genotype.proteins, span);
            log::debug!(
                "Gene '{}': {} sites, at most {} activators and {} repressors bound together",
                gene.name,
                gene.binding_sites.len(),
                free.activator,
                free.repressor
            );
        }
        let sites: usize = genotype.genes.iter().map(|g| g.binding_sites.len()).sum();
        println!(
            "Loaded {} genes encoding {} proteins ({} binding sites) and {} environments.",
            genotype.genes.len(),
            genotype.proteins.len(),
            sites,
            environments.len()
        );
        Ok(Self { genotype, environments, engine })
    }

    /// Writes the inputs, as resolved, into `output_dir` for traceability. The files can be
    /// loaded again as inputs of a later run.
    pub fn save_to(&self, output_dir: &Path) -> Result<()> {
        let resolved = [
            (
                "genotype.yaml",
                serde_yaml::to_string(&GenotypeFile {
                    schema_version: SCHEMA_VERSION.to_string(),
                    genotype: self.genotype.clone(),
                })?,
            ),
            (
                "environments.yaml",
                serde_yaml::to_string(&EnvironmentFile {
                    schema_version: SCHEMA_VERSION.to_string(),
                    environments: self.environments.clone(),
                })?,
            ),
            (
                "engine.yaml",
                serde_yaml::to_string(&EngineConfigFile {
                    schema_version: SCHEMA_VERSION.to_string(),
                    engine: self.engine.clone(),
                })?,
            ),
        ];
        for (name, content) in resolved {
            let path = output_dir.join(name);
            fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))?;
        }
        Ok(())
    }
}
