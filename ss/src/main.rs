use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use stepstore::cli::Cli;
use stepstore::config::Config;
use stepstore::{FileStore, StepStore};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("stepstore starting");

    match cli.command {
        stepstore::cli::Command::List => {
            let store = FileStore::open(&config.store_path)?;
            let slugs = store.list()?;
            if slugs.is_empty() {
                println!("No cached runs found");
            } else {
                for slug in slugs {
                    println!("{}", slug);
                }
            }
        }
        stepstore::cli::Command::Show { task, full } => {
            let store = FileStore::open(&config.store_path)?;
            let map = store.load(&task)?;
            if map.is_empty() {
                println!("No cached outputs for: {}", task);
            } else {
                let mut step_ids: Vec<&String> = map.keys().collect();
                step_ids.sort();
                for step_id in step_ids {
                    let output = &map[step_id];
                    if full {
                        println!("{}", step_id.cyan());
                        println!("{}", output);
                        println!();
                    } else {
                        println!("{} {} chars", step_id.cyan(), output.len().to_string().yellow());
                    }
                }
            }
        }
        stepstore::cli::Command::Delete { task } => {
            let store = FileStore::open(&config.store_path)?;
            store.delete(&task)?;
            println!("{} Deleted cache for: {}", "✓".green(), task);
        }
    }

    Ok(())
}
