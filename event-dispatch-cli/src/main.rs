//! Event Dispatch CLI Application
//!
//! Command-line harness for the event-dispatch library. It adds:
//! - A guided demo of subscribing, firing and unsubscribing
//! - Configurable churn scenarios run in parallel
//! - Report generation (TXT/JSON)

use anyhow::{bail, Result};
use clap::Parser;
use rayon::prelude::*;
use std::path::PathBuf;

mod churn;
mod config;
mod demo;
mod report;

use config::{AppConfig, OutputFormat};

/// Event Dispatch - exercise and measure typed multicast signals
#[derive(Parser, Debug)]
#[command(name = "event-dispatch-cli")]
#[command(about = "Run churn scenarios against the event dispatcher", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run the guided walkthrough instead of scenarios
    #[arg(long)]
    demo: bool,

    /// Only run the named scenario(s) (can be repeated)
    #[arg(short, long, value_name = "NAME")]
    scenario: Vec<String>,

    /// Report format (overrides the config file)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file for the report (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Event Dispatch CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using event-dispatch library v{}", event_dispatch::VERSION);

    if args.demo {
        demo::run_demo()?;
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => {
            log::debug!("No config file given, using built-in scenarios");
            AppConfig::default()
        }
    };

    run_scenarios(&config, &args)
}

fn run_scenarios(config: &AppConfig, args: &Args) -> Result<()> {
    let selected: Vec<_> = config
        .scenarios
        .iter()
        .filter(|s| args.scenario.is_empty() || args.scenario.contains(&s.name))
        .collect();

    if selected.is_empty() {
        bail!("No scenarios to run (filter: {:?})", args.scenario);
    }

    let results: Vec<_> = selected
        .par_iter()
        .map(|scenario| churn::run_scenario(scenario, &config.dispatcher))
        .collect::<Result<_>>()?;

    let run = report::RunReport::new(results);
    let format = args.format.unwrap_or(config.output.format);
    let rendered = report::render(&run, format)?;
    let output = args.output.as_deref().or(config.output.path.as_deref());
    report::write_report(&rendered, output)?;

    if !run.all_consistent() {
        bail!("Delivered call counts did not match the live subscriber counts");
    }
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
