//! Pipeline orchestration.
//!
//! One run: resolve the file list, preflight the compiler versions,
//! then drive the bounded per-file analyzer pass concurrently with the
//! repo-scope tool invocations, join everything, merge, and project
//! the report and console summary. Per-file faults degrade locally;
//! tool-infrastructure faults abort the run before the report is
//! written.

use crate::analyzers::{self, Heuristic};
use crate::concurrency::Limiter;
use crate::config::Config;
use crate::core::report::Report;
use crate::core::tools::ExternalToolOutput;
use crate::core::{FileTask, PerFileResult};
use crate::io::{walker::FileWalker, ContentCache};
use crate::tools::{compiler, deadcode, duplicate, lint};
use crate::{merge, report};
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub struct RunOptions {
    pub project_root: PathBuf,
    /// Explicit file list; `None` discovers the full tree.
    pub files: Option<Vec<PathBuf>>,
    pub full_report: bool,
    pub jobs: Option<usize>,
    pub output: Option<PathBuf>,
}

pub struct RunOutcome {
    pub report: Report,
    pub report_path: PathBuf,
}

pub fn run(config: &Config, options: &RunOptions) -> Result<RunOutcome> {
    let started = Instant::now();
    let root = std::fs::canonicalize(&options.project_root)
        .with_context(|| format!("project root {} not found", options.project_root.display()))?;

    let tasks = resolve_tasks(config, options, &root)?;
    log::info!("analyzing {} files under {}", tasks.len(), root.display());

    let timeout = Duration::from_secs(config.tools.timeout_secs);

    // Environment preflight runs before any tool work.
    compiler::check_version_parity(&config.tools.compiler, &root, timeout)?;

    let cache = ContentCache::new();
    let jobs = options.jobs.unwrap_or_else(|| config.jobs());
    let limiter = Limiter::new(jobs)?;
    let heuristics = analyzers::default_analyzers(config.analysis.max_file_lines);

    let (per_file, mut pass_warnings, tool_output) =
        run_analysis_phase(config, &root, &tasks, &cache, &limiter, &heuristics, timeout)?;

    let mut outcome = merge::merge(per_file, &tool_output, &cache, &limiter, &root);
    pass_warnings.append(&mut outcome.warnings);
    outcome.warnings = pass_warnings;

    let full = options.full_report || config.report.full;
    let report = report::build(
        &outcome,
        full,
        Utc::now(),
        started.elapsed().as_millis() as u64,
    );

    let report_path = options
        .output
        .clone()
        .unwrap_or_else(|| config.report_path(&root));
    report::write(&report, &report_path)?;

    Ok(RunOutcome {
        report,
        report_path,
    })
}

fn resolve_tasks(config: &Config, options: &RunOptions, root: &Path) -> Result<Vec<FileTask>> {
    let files = match &options.files {
        Some(explicit) => {
            let absolute: Vec<PathBuf> = explicit
                .iter()
                .map(|p| {
                    if p.is_absolute() {
                        p.clone()
                    } else {
                        root.join(p)
                    }
                })
                .collect();
            crate::io::walker::existing_files(absolute)
        }
        None => FileWalker::new(root.to_path_buf())
            .with_extensions(config.analysis.extensions.clone())
            .with_exclude_patterns(config.analysis.exclude.clone())
            .walk()?,
    };

    Ok(files
        .into_iter()
        .map(|path| FileTask::new(root, path))
        .collect())
}

type AnalysisPhase = (Vec<PerFileResult>, Vec<String>, ExternalToolOutput);

/// Per-file pass and repo-scope tool invocations, all concurrent; the
/// scope joins every piece before merge begins.
fn run_analysis_phase(
    config: &Config,
    root: &Path,
    tasks: &[FileTask],
    cache: &ContentCache,
    limiter: &Limiter,
    heuristics: &[Box<dyn Heuristic>],
    timeout: Duration,
) -> Result<AnalysisPhase> {
    let target_files: Vec<PathBuf> = tasks.iter().map(|t| t.path.clone()).collect();

    std::thread::scope(|scope| {
        let lint_batch = scope.spawn(|| {
            lint::run_batch(&config.tools.lint, root, &target_files, timeout)
        });
        let lint_gate = scope.spawn(|| {
            let extensions = if config.analysis.extensions.is_empty() {
                crate::io::walker::default_extensions()
            } else {
                config.analysis.extensions.clone()
            };
            lint::run_repo_gate(&config.tools.lint, root, &extensions, timeout)
        });
        let compiler_gates: Vec<_> = config
            .tools
            .compiler
            .configs
            .iter()
            .map(|name| {
                scope.spawn(move || {
                    compiler::run_gate(&config.tools.compiler, root, name, timeout)
                })
            })
            .collect();
        let dead_code = scope.spawn(|| deadcode::run(&config.tools.dead_code, root, timeout));
        let duplicates = scope.spawn(|| duplicate::run(&config.tools.duplicate, root, timeout));

        let (per_file, warnings) = analyze_files(tasks, cache, limiter, heuristics);

        let tool_output = ExternalToolOutput {
            lint: join(lint_batch)??,
            lint_gate: join(lint_gate)??,
            compiler: compiler_gates
                .into_iter()
                .map(|h| Ok(join(h)??))
                .collect::<Result<Vec<_>>>()?,
            dead_code: join(dead_code)??,
            duplicate: join(duplicates)??,
        };

        Ok((per_file, warnings, tool_output))
    })
}

fn join<T>(handle: std::thread::ScopedJoinHandle<'_, T>) -> Result<T> {
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("tool thread panicked"))
}

/// The bounded per-file analyzer pass. Results preserve task order;
/// any per-file fault degrades that file, never the run.
pub fn analyze_files(
    tasks: &[FileTask],
    cache: &ContentCache,
    limiter: &Limiter,
    heuristics: &[Box<dyn Heuristic>],
) -> (Vec<PerFileResult>, Vec<String>) {
    let scanned = limiter.run(tasks, |task| {
        let mut result = PerFileResult::new(task.clone());
        let mut warnings = Vec::new();
        match cache.read(&task.path) {
            Ok(content) => {
                for heuristic in heuristics {
                    let (verdict, warning) = analyzers::run_heuristic(heuristic.as_ref(), &content);
                    *result.categories.get_mut(heuristic.category()) = verdict;
                    if let Some(warning) = warning {
                        warnings.push(format!("{}: {warning}", task.rel_path));
                    }
                }
            }
            Err(e) => {
                warnings.push(format!(
                    "{}: unreadable ({e}); heuristic categories degraded to pass",
                    task.rel_path
                ));
                for heuristic in heuristics {
                    *result.categories.get_mut(heuristic.category()) =
                        crate::core::CategoryVerdict::passed();
                }
            }
        }
        Ok((result, warnings))
    });

    let mut results = Vec::with_capacity(tasks.len());
    let mut all_warnings = Vec::new();
    for (task, item) in tasks.iter().zip(scanned) {
        match item {
            Ok((result, mut warnings)) => {
                results.push(result);
                all_warnings.append(&mut warnings);
            }
            Err(e) => {
                // run_heuristic already isolates panics per category;
                // this only fires if the whole worker item failed.
                all_warnings.push(format!("{}: analysis degraded ({e})", task.rel_path));
                results.push(PerFileResult::new(task.clone()));
            }
        }
    }
    (results, all_warnings)
}
