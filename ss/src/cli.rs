//! CLI argument parsing for stepstore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ss")]
#[command(author, version, about = "Step-output accumulator cache", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List task slugs with cached step outputs
    List,

    /// Show cached step outputs for a task
    Show {
        /// Task name or slug
        #[arg(required = true)]
        task: String,

        /// Print full outputs instead of lengths
        #[arg(short, long)]
        full: bool,
    },

    /// Delete the cache for a task
    Delete {
        /// Task name or slug
        #[arg(required = true)]
        task: String,
    },
}
