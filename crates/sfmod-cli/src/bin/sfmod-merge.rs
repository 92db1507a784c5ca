use anyhow::Context;
use clap::{ArgAction, Parser};
use sfmod_data::merge::merge;
use std::path::PathBuf;

/// Combine game-data files by set union.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Output file; if it already exists it is backed up and merged in
    output: PathBuf,

    /// Input files combined into the output
    inputs: Vec<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    sfmod_cli::init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let report = merge(&cli.output, &cli.inputs)
        .with_context(|| format!("could not merge into {}", cli.output.display()))?;
    tracing::info!(
        output = %cli.output.display(),
        machines = report.data.machines.len(),
        parts = report.data.parts.len(),
        recipes = report.data.recipes.len(),
        "merged"
    );
    Ok(())
}
