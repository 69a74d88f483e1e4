//! CLI argument parsing for planweaver

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pw")]
#[command(author, version, about = "Multi-phase plan-synthesis workflow coordinator", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Handle one coordinator call (JSON in, JSON out)
    Plan {
        /// Read the call from a file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Parse a finished plan document into steps
    Parse {
        /// Plan document path
        #[arg(required = true)]
        plan: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Emit verification instructions for completed steps
    Verify {
        /// Plan document path
        #[arg(required = true)]
        plan: PathBuf,

        /// Completed step indices, comma-separated (e.g. 1,2,3)
        #[arg(short = 's', long, value_delimiter = ',')]
        completed: Vec<usize>,

        /// Also review interface contracts at each checkpoint
        #[arg(long)]
        interface_review: bool,

        /// Also review layout/visual structure at each checkpoint
        #[arg(long)]
        layout_review: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}
