use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::error;

use childcare_demand::config::PipelineConfig;
use childcare_demand::pipeline::{self, Stage};
use childcare_demand::report;

/// Clean childcare facility data and classify zip-code demand.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the source tables (overrides the config file).
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Directory receiving the output tables (overrides the config file).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Stage to run; repeat for several. Defaults to all.
    #[arg(short, long, value_enum)]
    stage: Vec<Stage>,

    /// Do not print the console report.
    #[arg(short, long)]
    quiet: bool,
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = cli.input_dir {
        config.input_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    let stages = if cli.stage.is_empty() {
        Stage::ALL.to_vec()
    } else {
        cli.stage
    };

    let summary = pipeline::execute(&config, &stages)?;
    if !cli.quiet {
        println!("{}", report::run_report(&summary, config.preview_rows));
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("childcare_demand=info"),
    )
    .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
