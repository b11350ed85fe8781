use crate::simulation::{events::FixedEventKind, state::ChromatinTransition};
use crate::simulation::state::ChromatinState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrnforgeError {
    #[error("Negative time step {dt} at t = {time}")]
    NegativeTimeStep { dt: f64, time: f64 },

    #[error("Total reaction rate {total} is not finite at t = {time}")]
    NonFiniteRate { total: f64, time: f64 },

    #[error("Growth-rate case analysis failed: effector level {start} -> {end} against threshold {threshold}")]
    GrowthCaseUnmatched { start: f64, end: f64, threshold: f64 },

    #[error("Could not find a unique time for {kind:?} near t = {time} after {attempts} attempts")]
    EventCollision {
        kind: FixedEventKind,
        time: f64,
        attempts: usize,
    },

    #[error("No pending {kind:?} event #{occurrence} for gene {gene}")]
    MissingFixedEvent {
        kind: FixedEventKind,
        gene: usize,
        occurrence: usize,
    },

    #[error("{kind:?} event at t = {time} is not attached to a gene")]
    UnattachedEvent { kind: FixedEventKind, time: f64 },

    #[error("Gene {gene}: {transition:?} is not allowed from {from:?}")]
    IllegalTransition {
        gene: usize,
        from: ChromatinState,
        transition: ChromatinTransition,
    },

    #[error("Gene {gene} has no {pool} mRNA left")]
    EmptyMrnaPool { gene: usize, pool: &'static str },

    #[error("Genotype is invalid: {0}")]
    InvalidGenotype(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to parse YAML from '{0}': {1}")]
    YamlParsing(String, #[source] serde_yaml::Error),

    #[error("Failed to process CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),

    #[error("An error occurred during logging: {0}")]
    LoggingError(#[from] anyhow::Error),
}

impl GrnforgeError {
    /// Errors that mean the state of a run can no longer be trusted. The replicate is
    /// discarded and retried by the caller.
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            GrnforgeError::NegativeTimeStep { .. }
                | GrnforgeError::NonFiniteRate { .. }
                | GrnforgeError::GrowthCaseUnmatched { .. }
                | GrnforgeError::EventCollision { .. }
                | GrnforgeError::MissingFixedEvent { .. }
                | GrnforgeError::UnattachedEvent { .. }
                | GrnforgeError::IllegalTransition { .. }
                | GrnforgeError::EmptyMrnaPool { .. }
        )
    }
}
