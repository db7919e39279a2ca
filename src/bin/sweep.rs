//! Parameter sweep runner
//!
//! Runs every combination of the swept parameters for a number of
//! iterations in parallel and writes `parameters.jsonl` and
//! `unit_raw.jsonl` to the output directory.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use housing_segregation::core::error::Result;
use housing_segregation::experiment::{run_experiment, ExperimentConfig, JsonlSink};

#[derive(Parser, Debug)]
#[command(name = "sweep")]
#[command(about = "Run a parameter sweep and export landlord records as JSON Lines")]
struct Args {
    /// Experiment config in TOML; missing fields use the reference sweep
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(long, short = 'o', default_value = "data/popdyn")]
    output: PathBuf,

    /// Override the number of iterations
    #[arg(long)]
    iterations: Option<u32>,

    /// Override the master seed
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads (defaults to all cores)
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "housing_segregation=info".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => ExperimentConfig::load(path)?,
        None => ExperimentConfig::default(),
    };
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }

    let runs = config.samples().len() * config.iterations as usize;
    println!(
        "Running {} samples x {} iterations = {} runs of {} steps",
        config.samples().len(),
        config.iterations,
        runs,
        config.base.steps
    );

    let start = Instant::now();
    let sink = JsonlSink::create(&args.output)?;
    let parameters = run_experiment(&config, |row, output| sink.write_run(row, output))?;
    let dir = sink.finish(&parameters)?;

    println!(
        "Finished {} runs in {:.1}s, results in {}",
        parameters.len(),
        start.elapsed().as_secs_f64(),
        dir.display()
    );
    Ok(())
}
