use anyhow::{bail, Result};
use clap::Parser;
use codegate::cli::{Cli, Commands};
use codegate::config::{self, Config};
use codegate::core::Status;
use codegate::pipeline::{self, RunOptions};
use codegate::report::summary;
use colored::Colorize;
use std::path::Path;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if cli.plain {
        colored::control::set_override(false);
    }

    match dispatch(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            std::process::exit(2);
        }
    }
}

fn dispatch(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Check {
            path,
            files,
            full,
            jobs,
            output,
            config,
        } => {
            let cfg = Config::load(&path, config.as_deref())?;
            let options = RunOptions {
                project_root: path,
                files: (!files.is_empty()).then_some(files),
                full_report: full,
                jobs,
                output,
            };
            let outcome = pipeline::run(&cfg, &options)?;
            print!("{}", summary::render(&outcome.report));
            log::info!("report written to {}", outcome.report_path.display());
            Ok(match outcome.report.summary.status {
                Status::Pass => 0,
                Status::Fail => 1,
            })
        }
        Commands::Init { path, force } => {
            init_config(&path, force)?;
            Ok(0)
        }
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    let target = path.join(config::CONFIG_FILE);
    if target.exists() && !force {
        bail!("{} already exists; pass --force to overwrite", target.display());
    }
    std::fs::write(&target, config::default_config_template())?;
    println!("wrote {}", target.display());
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
