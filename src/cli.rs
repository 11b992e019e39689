use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codegate", version, about = "Code quality gate orchestrator for JS/TS projects")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true, env = "CODEGATE_PLAIN")]
    pub plain: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze the project and emit the gate report
    Check {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Analyze only these files (repeatable; relative to the root)
        #[arg(long = "file", value_name = "PATH")]
        files: Vec<PathBuf>,

        /// Include passing files in the report
        #[arg(long)]
        full: bool,

        /// Worker bound for the per-file pass (default: one per CPU)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Report output path (default: codegate-report.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Config file (default: codegate.toml under the root)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write a commented starter codegate.toml
    Init {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}
