use super::{
    events::{FixedEvent, FixedEventKind},
    growth::GrowthIntegrator,
    propensity::PropensityTable,
    reactions::{self, ReactionContext},
    state::{CellState, TrajectorySample},
};
use crate::{error::GrnforgeError, logger::TrajectoryLogger};
use grnforge_schemas::{
    engine_config::EngineConfig,
    environment::{Environment, SignalPhase},
    genotype::{GeneId, Genotype},
};
use rand::Rng;
use rand_distr::Exp1;
use rand_xoshiro::Xoshiro256PlusPlus;

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    /// The development horizon was reached.
    Completed,
    /// Every reaction rate dropped to zero. Growth is reported as zero.
    Unresponsive,
    /// A numerical inconsistency made the state untrustworthy. The replicate should be discarded.
    Abnormal { reason: String },
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// Growth per minute after burn-in. Zero unless the run completed.
    pub average_growth_rate: f64,
    /// Natural log of the final cell size.
    pub integrated_growth: f64,
    pub growth_after_burn_in: f64,
    pub final_time: f64,
    pub gillespie_events: u64,
    pub fixed_events: u64,
    pub trajectory: Vec<TrajectorySample>,
}

/// Simulates one cell of one genotype in one environment, from t = 0 to the development
/// horizon. Built by [`super::builder::SimulationBuilder`].
pub struct SimulationEngine<'g> {
    pub(super) genotype: &'g Genotype,
    pub(super) environment: &'g Environment,
    pub(super) config: &'g EngineConfig,
    pub(super) state: CellState,
    pub(super) propensities: PropensityTable,
    pub(super) rng: Xoshiro256PlusPlus,
    pub(super) sampling_interval: Option<f64>,
    pub(super) trajectory: Vec<TrajectorySample>,
    pub(super) logger: Option<TrajectoryLogger>,
    pub(super) gillespie_events: u64,
    pub(super) fixed_events: u64,
}

impl<'g> SimulationEngine<'g> {
    pub fn state(&self) -> &CellState {
        &self.state
    }

    pub fn propensities(&self) -> &PropensityTable {
        &self.propensities
    }

    /// Runs the cell to the horizon. Numerical inconsistencies do not escape: they are
    /// reported through [`RunStatus::Abnormal`].
    ///
    /// # Errors
    ///
    /// Returns a `GrnforgeError` only when writing the trajectory log fails.
    pub fn run(&mut self) -> Result<RunOutcome, GrnforgeError> {
        let status = match self.simulate() {
            Ok(status) => status,
            Err(e) if e.is_numerical() => {
                log::warn!(
                    "Run in environment '{}' terminated abnormally at t = {:.4}: {}",
                    self.environment.name,
                    self.state.time,
                    e
                );
                RunStatus::Abnormal { reason: e.to_string() }
            }
            Err(e) => return Err(e),
        };

        let average_growth_rate = match status {
            RunStatus::Completed => {
                let timing = &self.config.timing;
                self.state.growth_after_burn_in / (timing.development_time - timing.burn_in_duration.max(0.0))
            }
            _ => 0.0,
        };
        if status == RunStatus::Unresponsive {
            log::debug!("Cell became unresponsive at t = {:.4}", self.state.time);
        }

        Ok(RunOutcome {
            status,
            average_growth_rate,
            integrated_growth: self.state.cumulative_growth,
            growth_after_burn_in: self.state.growth_after_burn_in,
            final_time: self.state.time,
            gillespie_events: self.gillespie_events,
            fixed_events: self.fixed_events,
            trajectory: std::mem::take(&mut self.trajectory),
        })
    }

    fn context(&self) -> ReactionContext<'g> {
        ReactionContext {
            genotype: self.genotype,
            environment: self.environment,
            config: self.config,
        }
    }

    fn recompute_rates(&mut self) {
        self.propensities.calc_all_rates(self.genotype, &self.state, self.config);
    }

    /// Forces one extra recomputation when the total rate is not positive. Returns false
    /// if the cell still has nothing that can happen.
    fn ensure_responsive(&mut self) -> Result<bool, GrnforgeError> {
        let mut subtotal = self.propensities.subtotal();
        if !(subtotal > 0.0) {
            self.recompute_rates();
            subtotal = self.propensities.subtotal();
        }
        if !subtotal.is_finite() {
            return Err(GrnforgeError::NonFiniteRate { total: subtotal, time: self.state.time });
        }
        Ok(subtotal > 0.0)
    }

    /// Waiting time left for `x` units of propensity-time. Negative values within the
    /// rounding tolerance are replaced by a small positive floor.
    fn next_dt(&self, x: f64) -> Result<f64, GrnforgeError> {
        let dt = x / self.propensities.subtotal();
        let numerical = &self.config.numerical;
        if dt >= 0.0 {
            Ok(dt)
        } else if dt > -numerical.rounding_tolerance {
            Ok(numerical.dt_floor)
        } else {
            Err(GrnforgeError::NegativeTimeStep { dt, time: self.state.time })
        }
    }

    fn simulate(&mut self) -> Result<RunStatus, GrnforgeError> {
        let horizon = self.config.timing.development_time;
        let ctx = self.context();
        let growth = GrowthIntegrator::new(self.genotype, self.environment, self.config);

        self.recompute_rates();
        if self.sampling_interval.is_some() {
            self.record_sample()?;
        }

        while self.state.time < horizon {
            if !self.ensure_responsive()? {
                return Ok(RunStatus::Unresponsive);
            }
            let mut x: f64 = self.rng.sample(Exp1);
            let mut dt = self.next_dt(x)?;

            while let Some((kind, event)) = self.state.events.pop_earliest((self.state.time + dt).min(horizon)) {
                let elapsed = event.time - self.state.time;
                if elapsed < 0.0 {
                    return Err(GrnforgeError::NegativeTimeStep { dt: elapsed, time: self.state.time });
                }
                x -= elapsed * self.propensities.subtotal();
                growth.integrate(&mut self.state, elapsed)?;
                self.state.time = event.time;
                self.do_fixed_event(ctx, kind, event)?;
                self.fixed_events += 1;

                self.recompute_rates();
                if !self.ensure_responsive()? {
                    return Ok(RunStatus::Unresponsive);
                }
                dt = self.next_dt(x)?;
            }

            if self.state.time + dt < horizon {
                growth.integrate(&mut self.state, dt)?;
                self.state.time += dt;
                if let Some((channel, gene)) =
                    reactions::do_gillespie_event(ctx, &mut self.state, &self.propensities, &mut self.rng)?
                {
                    log::trace!("t = {:.5}: {:?} on gene {}", self.state.time, channel, gene);
                    self.gillespie_events += 1;
                }
                self.recompute_rates();
            } else {
                let remaining = horizon - self.state.time;
                growth.integrate(&mut self.state, remaining)?;
                self.state.time = horizon;
            }
        }

        if self.sampling_interval.is_some() {
            self.record_sample()?;
        }
        Ok(RunStatus::Completed)
    }

    fn do_fixed_event(&mut self, ctx: ReactionContext, kind: FixedEventKind, event: FixedEvent) -> Result<(), GrnforgeError> {
        match kind {
            FixedEventKind::TranscriptionEnd => {
                let gene = attached_gene(kind, &event)?;
                reactions::end_transcription(&mut self.state, gene)
            }
            FixedEventKind::TranslationInitEnd => {
                let gene = attached_gene(kind, &event)?;
                reactions::end_translation_init(ctx, &mut self.state, gene)
            }
            FixedEventKind::SignalAStart => reactions::start_signal_phase(ctx, &mut self.state, SignalPhase::A),
            FixedEventKind::SignalBStart => reactions::start_signal_phase(ctx, &mut self.state, SignalPhase::B),
            FixedEventKind::BurnInEnd => {
                self.state.burn_in_reached = true;
                Ok(())
            }
            FixedEventKind::SamplingPoint => {
                self.record_sample()?;
                if let Some(interval) = self.sampling_interval {
                    let next = event.time + interval;
                    if next < self.config.timing.development_time {
                        self.state.events.schedule(FixedEventKind::SamplingPoint, None, next)?;
                    }
                }
                Ok(())
            }
        }
    }

    fn record_sample(&mut self) -> Result<(), GrnforgeError> {
        let sample = self.state.sample(self.genotype);
        if let Some(logger) = &mut self.logger {
            logger.log_sample(&sample)?;
        }
        self.trajectory.push(sample);
        Ok(())
    }
}

fn attached_gene(kind: FixedEventKind, event: &FixedEvent) -> Result<GeneId, GrnforgeError> {
    event
        .subject
        .ok_or(GrnforgeError::UnattachedEvent { kind, time: event.time })
}
