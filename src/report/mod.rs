//! Report synthesis.
//!
//! Projects the merged result set into the emitted artifact. Status is
//! `pass` exactly when no per-file category failed and every repo-wide
//! gate is clean; a passing report carries no results, no repo block
//! and no execution plan. Building twice from the same merged input
//! (with the same timestamp/duration) yields byte-identical output.

pub mod summary;

use crate::core::report::{
    DuplicateGroup, ExecutionPlan, FileEntry, Issue, RepoBlock, RepoCompilerGate, RepoLintGate,
    Report, ReportSummary,
};
use crate::core::{Category, PerFileResult, Status, Violation};
use crate::merge::MergeOutcome;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::Path;

pub fn build(
    outcome: &MergeOutcome,
    full: bool,
    generated_at: DateTime<Utc>,
    duration_ms: u64,
) -> Report {
    let repo_block = build_repo_block(outcome);
    let failing_files = outcome.files.iter().filter(|f| f.has_failures()).count();
    let gates_clean = repo_block.is_none();
    let status = if failing_files == 0 && gates_clean {
        Status::Pass
    } else {
        Status::Fail
    };

    let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();
    for file in &outcome.files {
        for (category, verdict) in file.categories.iter() {
            let count = verdict.violations().len();
            if count > 0 {
                *category_counts.entry(category.as_str().to_string()).or_default() += count;
            }
        }
    }

    let results = match status {
        Status::Pass => Vec::new(),
        Status::Fail => outcome
            .files
            .iter()
            .filter(|f| full || f.has_failures())
            .map(build_file_entry)
            .collect(),
    };

    let execution_plan = match status {
        Status::Pass => None,
        Status::Fail => Some(ExecutionPlan {
            instruction:
                "Apply every fix listed in this report; no further confirmation is required."
                    .to_string(),
            strategy: "fix-all-then-verify".to_string(),
            steps: vec![
                "Apply all listed fixes across the repository in one pass.".to_string(),
                "Re-run the full verification pipeline and confirm a passing report with no regressions."
                    .to_string(),
            ],
        }),
    };

    Report {
        summary: ReportSummary {
            status,
            files_analyzed: outcome.files.len(),
            failing_files,
            category_counts,
            warnings: outcome.warnings.clone(),
            generated_at,
            duration_ms,
        },
        results,
        repo: match status {
            Status::Pass => None,
            Status::Fail => repo_block,
        },
        execution_plan,
    }
}

fn build_repo_block(outcome: &MergeOutcome) -> Option<RepoBlock> {
    let repo = &outcome.repo;
    let block = RepoBlock {
        lint: (repo.lint_errors > 0).then_some(RepoLintGate {
            errors: repo.lint_errors,
            warnings: repo.lint_warnings,
        }),
        compiler: repo
            .compiler
            .iter()
            .filter(|c| c.errors > 0 || c.unknown > 0)
            .map(|c| RepoCompilerGate {
                config: c.config.clone(),
                errors: c.errors,
                unknown: c.unknown,
            })
            .collect(),
        unused_files: repo.unused_files.clone(),
        unlisted_dependencies: repo.unlisted_dependencies.clone(),
        duplicate_groups: repo
            .duplicate_groups
            .iter()
            .map(|g| DuplicateGroup {
                files: g.files.clone(),
                lines: g.lines,
                tokens: g.tokens,
                suggested_location: g.suggested_location.clone(),
            })
            .collect(),
    };
    if block.is_empty() {
        None
    } else {
        Some(block)
    }
}

fn build_file_entry(result: &PerFileResult) -> FileEntry {
    let mut issues = Vec::new();
    for (category, verdict) in result.categories.iter() {
        for violation in verdict.violations() {
            issues.push(to_issue(category, violation));
        }
    }
    FileEntry {
        rel_path: result.task.rel_path.clone(),
        issues,
    }
}

fn to_issue(category: Category, violation: &Violation) -> Issue {
    let (kind, rule) = match category {
        Category::Lint => (
            "lint".to_string(),
            violation.rule.clone(),
        ),
        Category::Compiler => ("type-error".to_string(), violation.rule.clone()),
        _ => (
            violation
                .rule
                .clone()
                .unwrap_or_else(|| default_kind(category).to_string()),
            None,
        ),
    };

    let mut issue = Issue::new(category, kind, violation.message.clone());
    issue.line = Some(violation.line);
    issue.column = violation.column;
    issue.guidance = violation.advice.clone();
    issue.rule = rule;
    issue.symbol = violation.symbol.clone();
    issue.other_file = violation.other_file.clone();
    issue
}

fn default_kind(category: Category) -> &'static str {
    match category {
        Category::Size => "file-too-long",
        Category::Comments => "disallowed-comment",
        Category::Console => "console-call",
        Category::Lint => "lint",
        Category::Compiler => "type-error",
        Category::Fallback => "fallback-data",
        Category::Framework => "framework-misuse",
        Category::Annotations => "missing-return-type",
        Category::DeadCode => "dead-code",
        Category::Duplicate => "duplicate-block",
    }
}

pub fn to_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Persist the report, replacing any previous one wholesale.
pub fn write(report: &Report, path: &Path) -> Result<()> {
    let json = to_json(report)?;
    crate::io::write_atomic(path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CategoryVerdict, FileTask};
    use crate::merge::RepoGates;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn task(rel: &str) -> FileTask {
        FileTask::new(Path::new("/repo"), PathBuf::from(format!("/repo/{rel}")))
    }

    fn passing_file(rel: &str) -> PerFileResult {
        let mut result = PerFileResult::new(task(rel));
        result.categories.console = CategoryVerdict::passed();
        result.categories.lint = CategoryVerdict::passed();
        result
    }

    fn failing_file(rel: &str) -> PerFileResult {
        let mut result = PerFileResult::new(task(rel));
        result.categories.console = CategoryVerdict::Checked(vec![Violation::new(
            10,
            "console.error call",
        )
        .with_column(3)
        .with_rule("no-console-error")
        .with_advice("route output through the project logger")]);
        result
    }

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap()
    }

    fn outcome(files: Vec<PerFileResult>) -> MergeOutcome {
        MergeOutcome {
            files,
            repo: RepoGates::default(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn all_clean_yields_empty_pass_report() {
        let report = build(&outcome(vec![passing_file("src/a.ts")]), false, stamp(), 5);
        assert_eq!(report.summary.status, Status::Pass);
        assert!(report.results.is_empty());
        assert!(report.repo.is_none());
        assert!(report.execution_plan.is_none());
    }

    #[test]
    fn failing_file_produces_minimized_results() {
        let report = build(
            &outcome(vec![passing_file("src/a.ts"), failing_file("src/b.ts")]),
            false,
            stamp(),
            5,
        );
        assert_eq!(report.summary.status, Status::Fail);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].rel_path, "src/b.ts");
        assert_eq!(report.results[0].issues.len(), 1);

        let issue = &report.results[0].issues[0];
        assert_eq!(issue.source, Category::Console);
        assert_eq!(issue.kind, "no-console-error");
        assert_eq!(issue.line, Some(10));
        assert!(issue.guidance.as_deref().unwrap().contains("logger"));
    }

    #[test]
    fn full_mode_includes_passing_files() {
        let report = build(
            &outcome(vec![passing_file("src/a.ts"), failing_file("src/b.ts")]),
            true,
            stamp(),
            5,
        );
        assert_eq!(report.results.len(), 2);
        assert!(report.results[0].issues.is_empty());
    }

    #[test]
    fn repo_gate_failure_fails_an_otherwise_clean_run() {
        let mut merged = outcome(vec![passing_file("src/a.ts")]);
        merged.repo = RepoGates {
            lint_errors: 4,
            lint_warnings: 1,
            ..Default::default()
        };
        let report = build(&merged, false, stamp(), 5);
        assert_eq!(report.summary.status, Status::Fail);
        assert!(report.results.is_empty());
        let repo = report.repo.unwrap();
        assert_eq!(repo.lint.unwrap().errors, 4);
    }

    #[test]
    fn execution_plan_has_exactly_two_ordered_steps() {
        let report = build(&outcome(vec![failing_file("src/b.ts")]), false, stamp(), 5);
        let plan = report.execution_plan.unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert!(plan.steps[0].to_lowercase().contains("apply"));
        assert!(plan.steps[1].to_lowercase().contains("re-run"));
    }

    #[test]
    fn building_twice_is_byte_identical() {
        let merged = outcome(vec![passing_file("src/a.ts"), failing_file("src/b.ts")]);
        let a = to_json(&build(&merged, false, stamp(), 5)).unwrap();
        let b = to_json(&build(&merged, false, stamp(), 5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn warnings_do_not_fail_the_run() {
        let mut merged = outcome(vec![passing_file("src/a.ts")]);
        merged.warnings.push("no lint configuration found; lint step skipped".to_string());
        let report = build(&merged, false, stamp(), 5);
        assert_eq!(report.summary.status, Status::Pass);
        assert_eq!(report.summary.warnings.len(), 1);
    }
}
