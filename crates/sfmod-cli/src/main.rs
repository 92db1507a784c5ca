use anyhow::Context;
use clap::{ArgAction, Parser};
use sfmod_core::extractor::Extractor;
use sfmod_core::game_data::GameData;
use sfmod_data::output::{read_game_data, write_mod_outputs, write_modeler};
use sfmod_data::string_table::load_dump_string_tables;
use sfmod_data::{DumpSource, ExtractConfig};
use std::path::PathBuf;

/// Extract recipes, machines, and parts from dumped game and mod content.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Extractor configuration (.ron, .toml or .json)
    config: PathBuf,

    /// Root of the dumped content, overriding `game_path`
    #[arg(long)]
    game_path: Option<PathBuf>,

    /// Directory for per-mod output, overriding `output_dir`
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Base-game dataset, overriding `baseline`
    #[arg(short, long)]
    baseline: Option<PathBuf>,

    /// Skip icon decoding and writing
    #[arg(long)]
    no_icons: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    sfmod_cli::init_logging(cli.verbose);

    if let Err(e) = extract(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn extract(cli: Cli) -> anyhow::Result<()> {
    let mut config = ExtractConfig::load(&cli.config)
        .with_context(|| format!("could not load config {}", cli.config.display()))?;
    if let Some(game_path) = cli.game_path {
        config.game_path = game_path;
    }
    if let Some(output) = cli.output {
        config.output_dir = output;
    }
    if cli.baseline.is_some() {
        config.baseline = cli.baseline;
    }
    if cli.no_icons {
        config.save_icons = false;
    }
    config.validate()?;

    let source = DumpSource::new(&config.game_path);
    let strings = load_dump_string_tables(&source).context("could not load string tables")?;
    let baseline = match &config.baseline {
        Some(path) => read_game_data(path).with_context(|| format!("could not read baseline {}", path.display()))?,
        None => GameData::new(),
    };

    let mut extractor = Extractor::new(Box::new(source), config.extract_options()).with_string_tables(strings);
    extractor.run().context("extraction aborted")?;
    let outputs = extractor.project(&baseline);

    let written = write_mod_outputs(&config.output_dir, &outputs, config.save_icons)?;
    tracing::info!(files = written.len(), output = %config.output_dir.display(), "wrote mod outputs");

    if config.write_to_modeler_after_extracting {
        let modeler = config.modeler_path.as_deref().context("modeler_path is not set")?;
        let file = write_modeler(modeler, &baseline, &outputs, config.save_icons)?;
        tracing::info!(file = %file.display(), "updated modeler data");
    }
    Ok(())
}
