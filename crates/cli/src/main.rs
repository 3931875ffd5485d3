use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tally_core::Granularity;
use tracing_subscriber::EnvFilter;

mod config;
mod pipeline;

use config::{load_config, Overrides, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "tally",
    version,
    about = "Categorize a bank statement CSV and export grouped totals"
)]
struct Cli {
    /// Statement CSV with date, description and amount columns
    input: PathBuf,

    /// Directory for the exported CSV reports (default: ./tally-report)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Rule file (.json or .toml) with manual and keyword rules
    #[arg(long, short)]
    rules: Option<PathBuf>,

    /// Aggregation period: M (monthly) or Y (yearly)
    #[arg(long, short)]
    period: Option<Granularity>,

    /// Field delimiter of the input CSV (default: ,)
    #[arg(long, short)]
    delimiter: Option<char>,

    /// Config file (defaults to ./tally.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let settings = Settings::resolve(
        config,
        Overrides {
            output: cli.output,
            rules: cli.rules,
            period: cli.period,
            delimiter: cli.delimiter,
        },
    );

    let outcome = pipeline::run(&cli.input, &settings)?;
    pipeline::print_report(&outcome, &settings);
    Ok(())
}
