use crate::config::RunInputs;
use crate::plotting;
use anyhow::{Context, Result};
use grnforge_core::{
    analysis::{self, EnvironmentGrowth, GrowthSummary},
    simulation::{
        builder::SimulationBuilder,
        engine::{RunOutcome, RunStatus},
    },
};
use grnforge_schemas::environment::Environment;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Serialize;
use std::{fs, path::Path};

/// How many replicates to run and how to seed them.
#[derive(Debug, Clone)]
pub struct ReplicatePlan {
    pub replicates: usize,
    pub max_retries: usize,
    pub seed: u64,
    pub trajectory_interval: Option<f64>,
}

#[derive(Debug, Serialize)]
struct FitnessReport<'a> {
    generated_at: String,
    seed: u64,
    replicates_per_environment: usize,
    environments: &'a [EnvironmentGrowth],
    fitness: f64,
    fitness_std_error: f64,
}

/// Hands out independent random streams, one per replicate attempt.
struct StreamSource {
    master: Xoshiro256PlusPlus,
}

impl StreamSource {
    fn new(seed: u64) -> Self {
        Self { master: Xoshiro256PlusPlus::seed_from_u64(seed) }
    }

    fn next_stream(&mut self) -> Xoshiro256PlusPlus {
        let stream = self.master.clone();
        self.master.jump();
        stream
    }
}

/// Runs every environment, optionally records trajectories, and writes the fitness report.
pub fn run_and_report(inputs: &RunInputs, plan: &ReplicatePlan, output_dir: &Path) -> Result<()> {
    println!("\n--- [Workflow] Simulating {} replicates per environment ---", plan.replicates);
    let mut streams = StreamSource::new(plan.seed);

    let mut per_environment = Vec::with_capacity(inputs.environments.len());
    for environment in &inputs.environments {
        let growth = run_environment(inputs, environment, plan, &mut streams)?;
        print_summary(&growth);
        per_environment.push(growth);
    }

    if let Some(interval) = plan.trajectory_interval {
        println!("\n--- [Workflow] Recording trajectories ---");
        for environment in &inputs.environments {
            record_trajectory(inputs, environment, interval, &mut streams, output_dir)?;
        }
    }

    let (fitness, fitness_std_error) = analysis::overall_fitness(&per_environment);
    println!("\nOverall fitness: {:.6} ± {:.6}", fitness, fitness_std_error);

    let report = FitnessReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        seed: plan.seed,
        replicates_per_environment: plan.replicates,
        environments: &per_environment,
        fitness,
        fitness_std_error,
    };
    let report_path = output_dir.join("fitness.json");
    fs::write(&report_path, serde_json::to_string_pretty(&report)?)
        .with_context(|| format!("Failed to write {:?}", report_path))?;
    Ok(())
}

/// Runs all replicates in one environment. Abnormal runs are retried on a fresh stream
/// up to `max_retries` times, then discarded.
fn run_environment(
    inputs: &RunInputs,
    environment: &Environment,
    plan: &ReplicatePlan,
    streams: &mut StreamSource,
) -> Result<EnvironmentGrowth> {
    println!("Environment '{}'...", environment.name);
    let mut outcomes = Vec::with_capacity(plan.replicates);
    for replicate in 0..plan.replicates {
        let mut attempt = 0;
        let outcome = loop {
            let outcome = run_once(inputs, environment, streams.next_stream())?;
            if matches!(outcome.status, RunStatus::Abnormal { .. }) && attempt < plan.max_retries {
                attempt += 1;
                log::warn!("Replicate {} in '{}' retried (attempt {})", replicate, environment.name, attempt);
                continue;
            }
            break outcome;
        };
        outcomes.push(outcome);
    }

    Ok(EnvironmentGrowth {
        environment: environment.name.clone(),
        occurrence: environment.occurrence,
        summary: GrowthSummary::from_outcomes(&outcomes),
    })
}

fn run_once(inputs: &RunInputs, environment: &Environment, stream: Xoshiro256PlusPlus) -> Result<RunOutcome> {
    let mut engine = SimulationBuilder::new()
        .with_genotype(&inputs.genotype)
        .with_environment(environment)
        .with_config(&inputs.engine)
        .with_rng(stream)
        .build()?;
    Ok(engine.run()?)
}

fn record_trajectory(
    inputs: &RunInputs,
    environment: &Environment,
    interval: f64,
    streams: &mut StreamSource,
    output_dir: &Path,
) -> Result<()> {
    let label = file_label(&environment.name);
    let log_path = output_dir.join(format!("{}_trajectory.csv", label));
    let log_path = log_path.to_string_lossy().into_owned();

    let mut engine = SimulationBuilder::new()
        .with_genotype(&inputs.genotype)
        .with_environment(environment)
        .with_config(&inputs.engine)
        .with_rng(streams.next_stream())
        .with_trajectory_sampling(interval)
        .with_trajectory_logging_to_file(&log_path)
        .build()?;
    let outcome = engine.run()?;
    println!(
        "Trajectory '{}': {:?}, {} samples, ln(size) = {:.4}",
        environment.name,
        outcome.status,
        outcome.trajectory.len(),
        outcome.integrated_growth
    );

    let protein_names: Vec<String> = inputs.genotype.proteins.iter().map(|p| p.name.clone()).collect();
    plotting::generate_trajectory_plots(&output_dir.to_string_lossy(), &log_path, &label, &protein_names)
}

fn print_summary(growth: &EnvironmentGrowth) {
    let s = &growth.summary;
    println!(
        "  mean growth {:.6} ± {:.6} (completed {}, unresponsive {}, discarded {})",
        s.mean_growth_rate, s.std_error, s.completed, s.unresponsive, s.discarded
    );
}

fn file_label(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
