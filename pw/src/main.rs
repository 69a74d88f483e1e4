//! PlanWeaver - plan-synthesis workflow coordinator
//!
//! CLI entry point: the host process drives the coordinator through
//! `pw plan` calls and uses `pw parse` / `pw verify` when executing a
//! finished plan.

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use eyre::{Context, Result};
use tracing::info;

use planweaver::cli::{Cli, Command, OutputFormat};
use planweaver::config::Config;
use planweaver::coordinator::{Coordinator, CoordinatorCall};
use planweaver::verify::{PlanParser, VerifyOptions, due_instructions};

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Plan { input } => cmd_plan(config, input),
        Command::Parse { plan, format } => cmd_parse(&plan, format),
        Command::Verify {
            plan,
            completed,
            interface_review,
            layout_review,
        } => cmd_verify(&plan, &completed, interface_review, layout_review),
    }
}

/// Handle one coordinator call: JSON call on stdin (or a file), JSON
/// response on stdout
fn cmd_plan(config: Config, input: Option<PathBuf>) -> Result<()> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(&path).context(format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("Failed to read stdin")?;
            buf
        }
    };

    let call: CoordinatorCall = serde_json::from_str(&raw).context("Failed to parse coordinator call")?;
    info!(task = %call.task, mode = ?call.mode, step = call.step, "Handling coordinator call");

    let mut coordinator = Coordinator::from_config(config)?;
    let response = coordinator.handle(&call)?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Parse a finished plan document
fn cmd_parse(plan: &PathBuf, format: OutputFormat) -> Result<()> {
    let doc = std::fs::read_to_string(plan).context(format!("Failed to read {}", plan.display()))?;

    let parser = PlanParser::new()?;
    let parsed = parser.parse(&doc);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
        OutputFormat::Text => {
            if parsed.could_not_parse() {
                println!("Could not parse plan: no step markers or section headers found");
                return Ok(());
            }
            println!("Parsed {} steps (strategy: {})", parsed.steps.len(), parsed.strategy.unwrap_or("none"));
            for step in &parsed.steps {
                println!("  {}. {}", step.index, step.title);
            }
        }
    }

    Ok(())
}

/// Emit checkpoint instructions due for the completed step set
fn cmd_verify(plan: &PathBuf, completed: &[usize], interface_review: bool, layout_review: bool) -> Result<()> {
    let doc = std::fs::read_to_string(plan).context(format!("Failed to read {}", plan.display()))?;

    let parser = PlanParser::new()?;
    let parsed = parser.parse(&doc);

    if parsed.could_not_parse() {
        println!("Could not parse plan: no step markers or section headers found");
        return Ok(());
    }

    let options = VerifyOptions {
        interface_review,
        layout_review,
    };
    let due = due_instructions(parsed.steps.len(), completed, &options);

    if due.is_empty() {
        println!("No checkpoints due ({} of {} steps completed)", completed.len(), parsed.steps.len());
        return Ok(());
    }

    for instruction in due {
        println!("Checkpoint at step {} ({:?}):", instruction.step, instruction.kind);
        println!("  {}", instruction.instruction);
        for addon in &instruction.addons {
            println!("  + {}", addon);
        }
        println!();
    }

    Ok(())
}
