//! Console summary: a short human projection of the same result set
//! the report is built from. No independent logic.

use crate::core::report::Report;
use crate::core::Status;
use colored::Colorize;
use std::fmt::Write;

pub fn render(report: &Report) -> String {
    let mut out = String::new();

    let status = match report.summary.status {
        Status::Pass => "PASS".green().bold(),
        Status::Fail => "FAIL".red().bold(),
    };
    let _ = writeln!(
        out,
        "{} {} ({} files analyzed, {} failing)",
        "codegate:".bold(),
        status,
        report.summary.files_analyzed,
        report.summary.failing_files
    );

    for (category, count) in &report.summary.category_counts {
        let _ = writeln!(out, "  {category:<16} {count}");
    }

    if let Some(repo) = &report.repo {
        let _ = writeln!(out, "  {}", "repo-wide gates:".bold());
        if let Some(lint) = &repo.lint {
            let _ = writeln!(
                out,
                "    lint: {} errors, {} warnings outside analyzed files",
                lint.errors, lint.warnings
            );
        }
        for gate in &repo.compiler {
            let _ = writeln!(
                out,
                "    compiler [{}]: {} errors, {} unknown",
                gate.config, gate.errors, gate.unknown
            );
        }
        if !repo.unused_files.is_empty() {
            let _ = writeln!(out, "    unused files: {}", repo.unused_files.len());
        }
        if !repo.unlisted_dependencies.is_empty() {
            let _ = writeln!(
                out,
                "    unlisted dependencies: {}",
                repo.unlisted_dependencies.join(", ")
            );
        }
        if !repo.duplicate_groups.is_empty() {
            let _ = writeln!(
                out,
                "    largest duplicate groups: {}",
                repo.duplicate_groups.len()
            );
        }
    }

    for warning in &report.summary.warnings {
        let _ = writeln!(out, "  {} {warning}", "warning:".yellow());
    }

    out
}
