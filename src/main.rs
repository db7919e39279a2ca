//! Housing Segregation - single run
//!
//! Runs one simulation from a TOML config (or defaults), prints a summary
//! and optionally writes the full landlord record table as JSON.

use std::path::PathBuf;

use clap::Parser;
use housing_segregation::core::error::Result;
use housing_segregation::core::ModelConfig;
use housing_segregation::simulation::{simulate, RelocationOrder};

/// Run a single residential segregation simulation
#[derive(Parser, Debug)]
#[command(name = "housing_sim")]
#[command(about = "Simulate households and landlords on a toroidal city grid")]
struct Args {
    /// Model config in TOML; missing fields use defaults
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the number of steps
    #[arg(long)]
    steps: Option<u64>,

    /// Shuffle the relocation order every step instead of using id order
    #[arg(long)]
    shuffled: bool,

    /// Write the run output as JSON to this file
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
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
        Some(path) => ModelConfig::load(path)?,
        None => ModelConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(steps) = args.steps {
        config.steps = steps;
    }
    if args.shuffled {
        config.relocation_order = RelocationOrder::Shuffled;
    }

    println!("Housing Segregation Simulation");
    println!("==============================");
    println!(
        "City: {}x{} units, density {}, vision {}",
        config.size, config.size, config.density, config.vision
    );
    println!(
        "r = {}, a = {}, d = {}, turnover = {}, seed = {}",
        config.r_correlation, config.a_preferences, config.d_decay, config.turnover, config.seed
    );
    println!();

    let output = simulate(config)?;
    println!("{}", output.summary());

    if let Some(path) = args.output {
        std::fs::write(&path, output.to_json()?)?;
        println!("\nFull output written to {}", path.display());
    }
    Ok(())
}
