use crate::{
    error::GrnforgeError,
    logger::TrajectoryLogger,
    simulation::{
        engine::SimulationEngine,
        events::FixedEventKind,
        propensity::PropensityTable,
        reactions::{self, ReactionContext},
        state::CellState,
    },
};
use grnforge_schemas::{engine_config::EngineConfig, environment::Environment, genotype::Genotype};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// A fluent builder for constructing a `SimulationEngine`.
///
/// A genotype, an environment, an engine configuration and a random stream are required.
/// The genotype must already carry its binding sites (see [`crate::binding::annotate_genotype`]).
#[derive(Default)]
pub struct SimulationBuilder<'g> {
    genotype: Option<&'g Genotype>,
    environment: Option<&'g Environment>,
    config: Option<&'g EngineConfig>,
    rng: Option<Xoshiro256PlusPlus>,
    sampling_interval: Option<f64>,
    log_path: Option<String>,
}

impl<'g> SimulationBuilder<'g> {
    /// Creates a new, empty `SimulationBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the genotype whose cell is simulated.
    pub fn with_genotype(mut self, genotype: &'g Genotype) -> Self {
        self.genotype = Some(genotype);
        self
    }

    /// Sets the environment providing the signal schedule and the effector's effect.
    pub fn with_environment(mut self, environment: &'g Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn with_config(mut self, config: &'g EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses `rng` as the run's private random stream.
    pub fn with_rng(mut self, rng: Xoshiro256PlusPlus) -> Self {
        self.rng = Some(rng);
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(Xoshiro256PlusPlus::seed_from_u64(seed))
    }

    /// Records a sample of the cell every `interval` minutes, plus one at each end of the run.
    pub fn with_trajectory_sampling(mut self, interval: f64) -> Self {
        self.sampling_interval = Some(interval);
        self
    }

    /// Also writes recorded samples to the specified CSV file. Has no effect without
    /// trajectory sampling.
    pub fn with_trajectory_logging_to_file(mut self, path: &str) -> Self {
        self.log_path = Some(path.to_string());
        self
    }

    /// Consumes the builder and returns an engine whose cell sits at t = 0 with its
    /// initial events queued.
    ///
    /// # Errors
    ///
    /// Returns a `GrnforgeError` if a required input is missing, the genotype refers to
    /// proteins that do not exist, or a parameter is outside its domain.
    pub fn build(self) -> Result<SimulationEngine<'g>, GrnforgeError> {
        let genotype = self
            .genotype
            .ok_or_else(|| GrnforgeError::ConfigError("no genotype provided".into()))?;
        let environment = self
            .environment
            .ok_or_else(|| GrnforgeError::ConfigError("no environment provided".into()))?;
        let config = self
            .config
            .ok_or_else(|| GrnforgeError::ConfigError("no engine configuration provided".into()))?;
        let rng = self
            .rng
            .ok_or_else(|| GrnforgeError::ConfigError("no random stream provided".into()))?;

        validate_genotype(genotype)?;
        validate_config(config, environment)?;
        if let Some(interval) = self.sampling_interval {
            if !(interval > 0.0) {
                return Err(GrnforgeError::ConfigError(format!(
                    "sampling interval must be positive, got {}",
                    interval
                )));
            }
        }

        let mut state = CellState::new(genotype, environment, config);
        let ctx = ReactionContext { genotype, environment, config };
        reactions::schedule_phase_end(ctx, &mut state)?;
        if config.timing.burn_in_duration > 0.0 {
            state
                .events
                .schedule(FixedEventKind::BurnInEnd, None, config.timing.burn_in_duration)?;
        }
        if let Some(interval) = self.sampling_interval {
            if interval < config.timing.development_time {
                state.events.schedule(FixedEventKind::SamplingPoint, None, interval)?;
            }
        }

        let logger = match (self.log_path, self.sampling_interval) {
            (Some(path), Some(_)) => Some(
                TrajectoryLogger::new(&path).map_err(|e| GrnforgeError::FileIO(path.clone(), e))?,
            ),
            _ => None,
        };

        Ok(SimulationEngine {
            genotype,
            environment,
            config,
            state,
            propensities: PropensityTable::new(genotype),
            rng,
            sampling_interval: self.sampling_interval,
            trajectory: Vec::new(),
            logger,
            gillespie_events: 0,
            fixed_events: 0,
        })
    }
}

fn validate_genotype(genotype: &Genotype) -> Result<(), GrnforgeError> {
    let n_proteins = genotype.proteins.len();
    let check_protein = |id: usize, what: &str| {
        if id < n_proteins {
            Ok(())
        } else {
            Err(GrnforgeError::InvalidGenotype(format!(
                "{} refers to protein {} but only {} proteins exist",
                what, id, n_proteins
            )))
        }
    };
    check_protein(genotype.signal_protein, "signal protein")?;
    check_protein(genotype.effector_protein, "effector protein")?;

    for gene in &genotype.genes {
        check_protein(gene.protein, &format!("gene '{}'", gene.name))?;
        if !(gene.kinetics.protein_decay > 0.0) {
            return Err(GrnforgeError::InvalidGenotype(format!(
                "gene '{}' has non-positive protein decay {}",
                gene.name, gene.kinetics.protein_decay
            )));
        }
        if gene.binding_sites.windows(2).any(|w| w[0].position > w[1].position) {
            return Err(GrnforgeError::InvalidGenotype(format!(
                "binding sites of gene '{}' are not in position order",
                gene.name
            )));
        }
        for (m, site) in gene.binding_sites.iter().enumerate() {
            if site.n_hindered > m || site.n_hindered > gene.max_hindered_sites {
                return Err(GrnforgeError::InvalidGenotype(format!(
                    "binding site at {} of gene '{}' hinders {} sites, outside 0..={}",
                    site.position,
                    gene.name,
                    site.n_hindered,
                    m.min(gene.max_hindered_sites)
                )));
            }
            check_protein(site.tf_id, &format!("a binding site of gene '{}'", gene.name))?;
            if !(site.kd > 0.0) {
                return Err(GrnforgeError::InvalidGenotype(format!(
                    "binding site at {} of gene '{}' has non-positive kd {}",
                    site.position, gene.name, site.kd
                )));
            }
        }
    }
    Ok(())
}

fn validate_config(config: &EngineConfig, environment: &Environment) -> Result<(), GrnforgeError> {
    let timing = &config.timing;
    if !(timing.development_time > 0.0) {
        return Err(GrnforgeError::ConfigError("development time must be positive".into()));
    }
    if timing.burn_in_duration >= timing.development_time {
        return Err(GrnforgeError::ConfigError(format!(
            "burn-in ({}) must end before development does ({})",
            timing.burn_in_duration, timing.development_time
        )));
    }
    if !(config.growth.saturation_level > 0.0) {
        return Err(GrnforgeError::ConfigError("saturation level must be positive".into()));
    }
    if !(config.numerical.time_offset > 0.0) {
        return Err(GrnforgeError::ConfigError("event time offset must be positive".into()));
    }
    for phase in [&environment.phase_a, &environment.phase_b] {
        if phase.duration < 0.0 || !phase.signal_strength.is_finite() || phase.signal_strength < 0.0 {
            return Err(GrnforgeError::ConfigError(format!(
                "environment '{}' has an invalid phase {:?}",
                environment.name, phase
            )));
        }
    }
    Ok(())
}
