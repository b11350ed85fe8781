//! Growth-rate integration over the interval between two events.
//!
//! Between events every gene copy's protein relaxes exponentially towards its steady
//! state, so the pooled effector level has a closed form. Growth is a piecewise-linear
//! function of that level: it ramps linearly up to the saturation level and is flat
//! above it. The integral over a window is exact once the time the level crosses the
//! saturation level (if it does) is known.

use super::state::{CellState, ProteinKinetics};
use crate::{error::GrnforgeError, numerical::rtsafe};
use grnforge_schemas::{
    engine_config::{EngineConfig, NumericalParams},
    environment::{EffectorEffect, Environment},
    genotype::Genotype,
};

/// Growth over one window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GrowthStep {
    /// Growth rate at the end of the window.
    pub instantaneous: f64,
    /// Growth integrated over the window.
    pub integrated: f64,
}

/// One gene copy contributing to the effector pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectorCopy {
    pub level: f64,
    pub kinetics: ProteinKinetics,
}

fn pooled_level(copies: &[EffectorCopy], t: f64) -> f64 {
    copies.iter().map(|c| c.kinetics.level_after(c.level, t)).sum()
}

fn pooled_slope(copies: &[EffectorCopy], t: f64) -> f64 {
    copies
        .iter()
        .map(|c| -c.kinetics.decay * (c.level - c.kinetics.steady_state) * (-c.kinetics.decay * t).exp())
        .sum()
}

/// Integral of the pooled level over `[a, b]`.
fn pooled_integral(copies: &[EffectorCopy], a: f64, b: f64) -> f64 {
    copies
        .iter()
        .map(|c| {
            let k = c.kinetics.decay;
            if k <= 0.0 {
                return c.level * (b - a);
            }
            let excess = c.level - c.kinetics.steady_state;
            c.kinetics.steady_state * (b - a) + excess / k * ((-k * a).exp() - (-k * b).exp())
        })
        .sum()
}

/// Time within `[0, dt]` at which the pooled level reaches `threshold`.
pub fn compute_tprime(copies: &[EffectorCopy], threshold: f64, dt: f64, numerical: &NumericalParams) -> f64 {
    rtsafe(
        |t| (pooled_level(copies, t) - threshold, pooled_slope(copies, t)),
        0.0,
        dt,
        numerical.rtsafe_tolerance,
        numerical.rtsafe_max_iterations,
    )
}

/// Integral of `min(level / threshold, 1)` over `[0, dt]`.
pub fn fraction_integral(
    copies: &[EffectorCopy],
    threshold: f64,
    dt: f64,
    numerical: &NumericalParams,
) -> Result<f64, GrnforgeError> {
    let start = pooled_level(copies, 0.0);
    let end = pooled_level(copies, dt);
    if !start.is_finite() || !end.is_finite() || !threshold.is_finite() {
        return Err(GrnforgeError::GrowthCaseUnmatched { start, end, threshold });
    }

    let integral = match (start >= threshold, end >= threshold) {
        (true, true) => dt,
        (false, false) => pooled_integral(copies, 0.0, dt) / threshold,
        (true, false) => {
            let tprime = compute_tprime(copies, threshold, dt, numerical);
            tprime + pooled_integral(copies, tprime, dt) / threshold
        }
        (false, true) => {
            let tprime = compute_tprime(copies, threshold, dt, numerical);
            pooled_integral(copies, 0.0, tprime) / threshold + (dt - tprime)
        }
    };
    Ok(integral)
}

pub struct GrowthIntegrator<'a> {
    genotype: &'a Genotype,
    environment: &'a Environment,
    config: &'a EngineConfig,
}

impl<'a> GrowthIntegrator<'a> {
    pub fn new(genotype: &'a Genotype, environment: &'a Environment, config: &'a EngineConfig) -> Self {
        Self { genotype, environment, config }
    }

    /// Growth-rate cost of translation and extra gene copies, per minute. Only mRNAs past
    /// the translation delay are translated.
    fn cost_rate(&self, state: &CellState) -> f64 {
        let growth = &self.config.growth;
        let translation: f64 = self
            .genotype
            .genes
            .iter()
            .zip(&state.mrna)
            .map(|(g, m)| g.kinetics.translation * m.cytoplasmic as f64)
            .sum();
        growth.translation_cost * translation
            + growth.extra_copy_penalty * self.genotype.extra_gene_copies() as f64
    }

    /// Advances every protein by `dt` and adds the growth over the window to the cell.
    pub fn integrate(&self, state: &mut CellState, dt: f64) -> Result<GrowthStep, GrnforgeError> {
        let growth = &self.config.growth;
        let threshold = growth.saturation_level;
        let copies: Vec<EffectorCopy> = self
            .genotype
            .genes_encoding(self.genotype.effector_protein)
            .map(|g| EffectorCopy { level: state.gene_protein[g], kinetics: state.kinetics[g] })
            .collect();

        let saturated_time = fraction_integral(&copies, threshold, dt, &self.config.numerical)?;
        let end_fraction = (pooled_level(&copies, dt) / threshold).min(1.0);
        let (benefit, end_benefit) = match self.environment.phase(state.signal_phase).effector_effect {
            EffectorEffect::Beneficial => (saturated_time, end_fraction),
            EffectorEffect::Deleterious => (dt - saturated_time, 1.0 - end_fraction),
        };

        let cost = self.cost_rate(state);
        let integrated = growth.growth_rate_scaling * (growth.max_growth_rate * benefit - cost * dt);
        let instantaneous = growth.growth_rate_scaling * (growth.max_growth_rate * end_benefit - cost);
        let step = GrowthStep {
            instantaneous: instantaneous.max(0.0),
            integrated: integrated.max(0.0),
        };

        for (level, kinetics) in state.gene_protein.iter_mut().zip(&state.kinetics) {
            *level = kinetics.level_after(*level, dt);
        }
        state.pool_proteins(self.genotype);

        state.cumulative_growth += step.integrated;
        if state.burn_in_reached {
            state.growth_after_burn_in += step.integrated;
        }
        state.instantaneous_growth = step.instantaneous;
        Ok(step)
    }
}
