use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

mod config;
mod plotting;
mod workflow;

/// Estimates the fitness of a gene regulatory network by simulating single cells.
#[derive(Parser, Debug)]
#[command(name = "grnforge", version)]
struct Cli {
    /// Genotype YAML file
    #[arg(long, default_value = "data/genotype.yaml")]
    genotype: PathBuf,

    /// Environments YAML file
    #[arg(long, default_value = "data/environments.yaml")]
    environments: PathBuf,

    /// Engine settings YAML file; defaults are used when omitted
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Replicates per environment
    #[arg(short, long, default_value_t = 100)]
    replicates: usize,

    /// Seed of the master random stream
    #[arg(long, default_value_t = 2024)]
    seed: u64,

    /// Attempts per replicate after an abnormal termination
    #[arg(long, default_value_t = 5)]
    max_retries: usize,

    /// Also record, save and plot one trajectory per environment, sampled at this interval (min)
    #[arg(long)]
    trajectory_interval: Option<f64>,

    #[arg(long, default_value = "./data/runs")]
    output_root: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    println!("--- GRNforge Fitness Estimation ---");

    let inputs = config::RunInputs::load(&cli.genotype, &cli.environments, cli.engine.as_deref())?;

    let output_dir = cli
        .output_root
        .join(format!("run_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S")));
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;
    inputs.save_to(&output_dir)?;

    let plan = workflow::ReplicatePlan {
        replicates: cli.replicates,
        max_retries: cli.max_retries,
        seed: cli.seed,
        trajectory_interval: cli.trajectory_interval,
    };
    workflow::run_and_report(&inputs, &plan, &output_dir)?;

    println!("\nFitness estimation complete. Results are in '{}'", output_dir.display());
    Ok(())
}
