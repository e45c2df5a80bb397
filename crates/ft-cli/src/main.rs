use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ft_cli::commands::{classify, dates, delete, report, run};
use ft_cli::{Cli, Commands, Config};
use ft_store::UsageStore;

/// Load config and open the usage store.
fn open_store(config_path: Option<&Path>) -> Result<(UsageStore, Config)> {
    let config = load_config(config_path)?;
    let store = UsageStore::new(&config.data_dir);
    Ok((store, config))
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match &cli.command {
        Some(Commands::Run) => {
            let config = load_config(cli.config.as_deref())?;
            run::run(&config)?;
        }
        Some(Commands::Report {
            day: _,
            last_day,
            week,
            last_week,
            date,
            json,
        }) => {
            let (store, _config) = open_store(cli.config.as_deref())?;
            let period = if *last_day {
                report::Period::LastDay
            } else if *week {
                report::Period::Week
            } else if *last_week {
                report::Period::LastWeek
            } else {
                report::Period::Day
            };
            report::run(&store, period, *date, *json)?;
        }
        Some(Commands::Dates { json }) => {
            let (store, _config) = open_store(cli.config.as_deref())?;
            dates::run(&store, *json)?;
        }
        Some(Commands::Delete { date }) => {
            let (store, _config) = open_store(cli.config.as_deref())?;
            delete::run(&store, *date)?;
        }
        Some(Commands::Classify {
            process,
            title,
            json,
        }) => {
            // Classification is pure; no config or store needed
            classify::run(process, title, *json)?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
