use std::path::PathBuf;

use clap::Parser;
use dialogtree_runner::{RunConfig, SeededDialogue, load_scenarios, run_pool};
use flexi_logger::Logger;

#[derive(Parser, Debug)]
#[command(name = "scripted_run")]
struct Args {
    /// Scenario list (JSON or YAML)
    #[arg(
        short = 's',
        long,
        default_value = "crates/dialogtree-runner/examples/sample.scenarios.yaml"
    )]
    scenarios: PathBuf,

    /// Run config YAML; the bundled default when omitted
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Seed of the offline dialogue model
    #[arg(long, default_value_t = 2024)]
    seed: u64,

    /// Overrides `workers` from the config
    #[arg(short = 'w', long)]
    workers: Option<usize>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _logger = Logger::try_with_env_or_str("info")?
        .format(flexi_logger::colored_default_format)
        .start()?;

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => RunConfig::from_yaml_path(path)?,
        None => RunConfig::from_default_yaml()?,
    };
    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    let scenarios = load_scenarios(&args.scenarios)?;
    let reports = run_pool(&config, &scenarios, |_| SeededDialogue::new(args.seed))?;

    for report in &reports {
        match &report.result {
            Ok(outcome) => {
                println!(
                    "{}: {:?} after {} iterations, {} terminal leaves",
                    report.id, outcome.stop_reason, outcome.iterations, outcome.terminal_count
                );
                for pair in outcome.best.iter().skip(1) {
                    println!("  [{}] {}", pair.strategy, pair.responder);
                    if let Some(reply) = &pair.counterpart {
                        println!("      > {reply}");
                    }
                }
            }
            Err(err) => println!("{}: failed: {err}", report.id),
        }
    }
    Ok(())
}
