use crate::{
    error::GrnforgeError,
    simulation::engine::{RunOutcome, RunStatus},
};
use serde::{Deserialize, Serialize};

/// A row of a trajectory CSV written by [`crate::logger::TrajectoryLogger`].
#[derive(Debug, Clone, Deserialize)]
pub struct TrajectoryRecord {
    pub time: f64,
    pub phase: String,
    pub log_cell_size: f64,
    pub instantaneous_growth: f64,
    pub effector_level: f64,
    pub mrna_total: u32,
    pub protein_pool_json: String,
}

impl TrajectoryRecord {
    pub fn protein_pool(&self) -> Result<Vec<f64>, GrnforgeError> {
        serde_json::from_str(&self.protein_pool_json)
            .map_err(|e| GrnforgeError::LoggingError(anyhow::Error::new(e)))
    }
}

pub fn read_trajectory(path: &str) -> Result<Vec<TrajectoryRecord>, GrnforgeError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| GrnforgeError::CsvError(path.to_string(), e))?;
    reader
        .deserialize()
        .collect::<Result<Vec<TrajectoryRecord>, _>>()
        .map_err(|e| GrnforgeError::CsvError(path.to_string(), e))
}

/// Growth statistics over the replicates of one genotype in one environment.
///
/// Unresponsive replicates are valid observations with zero growth. Abnormal replicates
/// are discarded and only counted.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct GrowthSummary {
    pub mean_growth_rate: f64,
    pub std_error: f64,
    pub completed: usize,
    pub unresponsive: usize,
    pub discarded: usize,
}

impl GrowthSummary {
    pub fn from_outcomes<'a, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a RunOutcome>,
    {
        let mut summary = GrowthSummary::default();
        let mut rates = Vec::new();
        for outcome in outcomes {
            match outcome.status {
                RunStatus::Completed => {
                    summary.completed += 1;
                    rates.push(outcome.average_growth_rate);
                }
                RunStatus::Unresponsive => {
                    summary.unresponsive += 1;
                    rates.push(0.0);
                }
                RunStatus::Abnormal { .. } => summary.discarded += 1,
            }
        }

        let n = rates.len();
        if n == 0 {
            return summary;
        }
        let mean = rates.iter().sum::<f64>() / n as f64;
        summary.mean_growth_rate = mean;
        if n > 1 {
            let variance = rates.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            summary.std_error = (variance / n as f64).sqrt();
        }
        summary
    }

    /// Replicates that contribute to the mean.
    pub fn valid_replicates(&self) -> usize {
        self.completed + self.unresponsive
    }
}

/// Mean growth of one genotype in one environment, weighted by how often the
/// environment occurs.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentGrowth {
    pub environment: String,
    pub occurrence: f64,
    pub summary: GrowthSummary,
}

/// Occurrence-weighted mean growth over all environments, with its standard error.
pub fn overall_fitness(per_environment: &[EnvironmentGrowth]) -> (f64, f64) {
    let total_weight: f64 = per_environment.iter().map(|e| e.occurrence).sum();
    if total_weight <= 0.0 {
        return (0.0, 0.0);
    }
    let mut fitness = 0.0;
    let mut variance = 0.0;
    for env in per_environment {
        let w = env.occurrence / total_weight;
        fitness += w * env.summary.mean_growth_rate;
        variance += (w * env.summary.std_error).powi(2);
    }
    (fitness, variance.sqrt())
}
