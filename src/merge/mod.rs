//! Result merge: reconciles external-tool output with the per-file
//! analyzer results into one authoritative result set.
//!
//! Two reconciliation algorithms live here. Dead-code reconciliation
//! re-scans each implicated file for occurrences of every candidate
//! symbol to distinguish "fully unused" from "used internally but
//! needlessly exported". Duplicate reconciliation fans each clone pair
//! out into two mirrored per-file segments and a repo-level priority
//! list. Both are pure over (tool output, file contents): re-running
//! the merge against the same inputs yields the same classification.

use crate::concurrency::Limiter;
use crate::core::tools::{
    ClonePair, DeadCodeFileFindings, ExternalToolOutput, LintOutcome, LintSeverity,
};
use crate::core::{CategoryVerdict, PerFileResult, Violation};
use crate::io::ContentCache;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// How many of the largest duplicate groups the repo block lists.
const TOP_GROUPS: usize = 10;

#[derive(Clone, Debug, Default)]
pub struct RepoGates {
    /// Repo-wide lint findings outside the analyzed file set.
    pub lint_errors: usize,
    pub lint_warnings: usize,
    /// Per-config compiler findings outside the analyzed file set,
    /// including file-less global diagnostics and unknown lines.
    pub compiler: Vec<RepoCompilerFindings>,
    pub unused_files: Vec<String>,
    pub unlisted_dependencies: Vec<String>,
    pub duplicate_groups: Vec<DuplicateGroupFinding>,
}

#[derive(Clone, Debug)]
pub struct RepoCompilerFindings {
    pub config: String,
    pub errors: usize,
    pub unknown: usize,
}

#[derive(Clone, Debug)]
pub struct DuplicateGroupFinding {
    pub files: Vec<String>,
    pub lines: usize,
    pub tokens: usize,
    pub suggested_location: String,
}

#[derive(Debug)]
pub struct MergeOutcome {
    pub files: Vec<PerFileResult>,
    pub repo: RepoGates,
    pub warnings: Vec<String>,
}

/// Merge tool output into the per-file results produced by the
/// analyzer pass. Single-threaded over the result set; only the
/// dead-code occurrence scan fans back out through the limiter.
pub fn merge(
    mut files: Vec<PerFileResult>,
    tools: &ExternalToolOutput,
    cache: &ContentCache,
    limiter: &Limiter,
    project_root: &Path,
) -> MergeOutcome {
    let mut warnings = Vec::new();
    let mut repo = RepoGates::default();

    let analyzed: HashSet<PathBuf> = files.iter().map(|r| r.task.path.clone()).collect();

    merge_lint(&mut files, &tools.lint, &mut warnings);
    merge_lint_gate(&analyzed, &tools.lint_gate, &mut repo, &mut warnings);
    merge_compiler(&mut files, &analyzed, tools, &mut repo);
    merge_dead_code(
        &mut files,
        &analyzed,
        tools,
        cache,
        limiter,
        project_root,
        &mut repo,
        &mut warnings,
    );
    merge_duplicates(&mut files, tools, project_root, &mut repo);

    MergeOutcome {
        files,
        repo,
        warnings,
    }
}

fn merge_lint(files: &mut [PerFileResult], lint: &LintOutcome, warnings: &mut Vec<String>) {
    match lint {
        LintOutcome::Skipped { warning } => warnings.push(warning.clone()),
        LintOutcome::Ran(output) => {
            for result in files.iter_mut() {
                let violations = output
                    .by_file
                    .get(&result.task.path)
                    .map(|messages| {
                        messages
                            .iter()
                            .map(|m| {
                                let mut v = Violation::new(m.line, m.message.clone())
                                    .with_column(m.column);
                                if let Some(rule) = &m.rule {
                                    v = v.with_rule(rule.clone());
                                }
                                if m.fixable {
                                    v = v.with_advice("auto-fixable: run the lint engine in fix mode");
                                }
                                if m.severity == LintSeverity::Warning {
                                    v.message = format!("warning: {}", v.message);
                                }
                                v
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                result.categories.lint = CategoryVerdict::Checked(violations);
            }
        }
    }
}

fn merge_lint_gate(
    analyzed: &HashSet<PathBuf>,
    gate: &LintOutcome,
    repo: &mut RepoGates,
    warnings: &mut Vec<String>,
) {
    match gate {
        LintOutcome::Skipped { warning } => warnings.push(warning.clone()),
        LintOutcome::Ran(output) => {
            // Findings already attributed to an analyzed file stay in
            // that file's detail; the gate reports only the remainder.
            for (path, messages) in &output.by_file {
                if analyzed.contains(path) {
                    continue;
                }
                for message in messages {
                    match message.severity {
                        LintSeverity::Error => repo.lint_errors += 1,
                        LintSeverity::Warning => repo.lint_warnings += 1,
                    }
                }
            }
        }
    }
}

fn merge_compiler(
    files: &mut [PerFileResult],
    analyzed: &HashSet<PathBuf>,
    tools: &ExternalToolOutput,
    repo: &mut RepoGates,
) {
    if tools.compiler.is_empty() {
        return;
    }

    let mut per_file: HashMap<PathBuf, Vec<Violation>> = HashMap::new();
    for output in &tools.compiler {
        let mut outside = 0usize;
        for diagnostic in &output.diagnostics {
            match diagnostic.file.as_ref().filter(|f| analyzed.contains(*f)) {
                Some(file) => {
                    per_file.entry(file.clone()).or_default().push(
                        Violation::new(diagnostic.line, diagnostic.message.clone())
                            .with_column(diagnostic.column)
                            .with_rule(diagnostic.code.clone())
                            .with_advice("fix the type error; the gate compiles with no emit"),
                    );
                }
                None => outside += 1,
            }
        }
        if outside > 0 || output.unknown_lines > 0 {
            repo.compiler.push(RepoCompilerFindings {
                config: output.config.clone(),
                errors: outside,
                unknown: output.unknown_lines,
            });
        }
    }

    for result in files.iter_mut() {
        let mut violations = per_file.remove(&result.task.path).unwrap_or_default();
        violations.sort_by_key(|v| (v.line, v.column));
        result.categories.compiler = CategoryVerdict::Checked(violations);
    }
}

#[allow(clippy::too_many_arguments)]
fn merge_dead_code(
    files: &mut [PerFileResult],
    analyzed: &HashSet<PathBuf>,
    tools: &ExternalToolOutput,
    cache: &ContentCache,
    limiter: &Limiter,
    project_root: &Path,
    repo: &mut RepoGates,
    warnings: &mut Vec<String>,
) {
    let dead = &tools.dead_code;

    // The occurrence re-scan needs the implicated files' text; it runs
    // as its own bounded pass.
    let implicated: Vec<PathBuf> = files
        .iter()
        .map(|r| r.task.path.clone())
        .filter(|p| dead.by_file.contains_key(p))
        .collect();

    let scans = limiter.run(&implicated, |path| {
        let content = cache.read(path)?;
        Ok(reconcile_file(&content, &dead.by_file[path]))
    });

    let mut by_path: HashMap<PathBuf, Vec<Violation>> = HashMap::new();
    for (path, scan) in implicated.into_iter().zip(scans) {
        match scan {
            Ok(violations) => {
                by_path.insert(path, violations);
            }
            Err(e) => {
                warnings.push(format!(
                    "dead-code reconciliation degraded for {}: {e}",
                    path.display()
                ));
            }
        }
    }

    for result in files.iter_mut() {
        let violations = by_path.remove(&result.task.path).unwrap_or_default();
        result.categories.dead_code = CategoryVerdict::Checked(violations);
    }

    let mut unused: Vec<String> = dead
        .unused_files
        .iter()
        .map(|p| rel_path(project_root, p))
        .collect();
    unused.sort();
    repo.unused_files = unused;

    let mut unlisted: BTreeSet<String> = BTreeSet::new();
    for (path, findings) in &dead.by_file {
        // Per-file detail already covers analyzed files; the repo block
        // aggregates only what no file entry reports.
        let covered = analyzed.contains(path);
        for dependency in &findings.unlisted_dependencies {
            if !covered {
                unlisted.insert(dependency.clone());
            }
        }
    }
    repo.unlisted_dependencies = unlisted.into_iter().collect();
}

/// Classify one file's dead-code candidates against its own text.
///
/// A candidate symbol occurring two or more times in its own file is
/// still used internally: the export is the dead part, not the
/// declaration. A single occurrence (the declaration itself) means the
/// symbol is fully unused.
pub fn reconcile_file(content: &str, findings: &DeadCodeFileFindings) -> Vec<Violation> {
    let mut violations = Vec::new();

    for symbol in &findings.symbols {
        let occurrences = count_occurrences(content, &symbol.name);
        let line = first_occurrence_line(content, &symbol.name);
        let kind = symbol.kind.as_str();
        if occurrences >= 2 {
            violations.push(
                Violation::new(
                    line,
                    format!("{kind} '{}' is only used within this file", symbol.name),
                )
                .with_rule("unused-exported")
                .with_symbol(symbol.name.clone())
                .with_advice("remove the export keyword; keep the declaration"),
            );
        } else {
            violations.push(
                Violation::new(line, format!("{kind} '{}' is never used", symbol.name))
                    .with_rule("fully-unused")
                    .with_symbol(symbol.name.clone())
                    .with_advice("delete the declaration"),
            );
        }
    }

    for specifier in &findings.unresolved_imports {
        violations.push(
            Violation::new(
                first_occurrence_line(content, specifier),
                format!("unresolved import '{specifier}'"),
            )
            .with_rule("unresolved-import")
            .with_advice("fix or remove the import specifier"),
        );
    }

    for dependency in &findings.unlisted_dependencies {
        violations.push(
            Violation::new(
                first_occurrence_line(content, dependency),
                format!("dependency '{dependency}' is imported but not declared"),
            )
            .with_rule("unlisted-dependency")
            .with_advice("declare the dependency in the package manifest"),
        );
    }

    violations.sort_by(|a, b| a.line.cmp(&b.line).then(a.message.cmp(&b.message)));
    violations
}

fn merge_duplicates(
    files: &mut [PerFileResult],
    tools: &ExternalToolOutput,
    project_root: &Path,
    repo: &mut RepoGates,
) {
    let mut per_file: HashMap<PathBuf, Vec<Violation>> = HashMap::new();

    for pair in &tools.duplicate.pairs {
        for (own, other) in [(&pair.first, &pair.second), (&pair.second, &pair.first)] {
            let other_rel = rel_path(project_root, &other.file);
            per_file.entry(own.file.clone()).or_default().push(
                Violation::new(
                    own.start_line,
                    format!(
                        "lines {}-{} duplicate {}:{}-{} ({} tokens)",
                        own.start_line,
                        own.end_line,
                        other_rel,
                        other.start_line,
                        other.end_line,
                        pair.tokens
                    ),
                )
                .with_rule("duplicate-block")
                .with_other_file(other_rel)
                .with_advice("extract the shared block into one common module"),
            );
        }
    }

    for result in files.iter_mut() {
        let mut violations = per_file.remove(&result.task.path).unwrap_or_default();
        violations.sort_by(|a, b| a.line.cmp(&b.line).then(a.message.cmp(&b.message)));
        result.categories.duplicate = CategoryVerdict::Checked(violations);
    }

    repo.duplicate_groups = top_groups(&tools.duplicate.pairs, project_root);

    if let Some(percentage) = tools.duplicate.overall_percentage {
        log::info!("duplicate detector reports {percentage:.2}% overall duplication");
    }
}

/// The largest clone pairs, each with a suggested consolidation
/// location: the lowest common directory of the two files.
fn top_groups(pairs: &[ClonePair], project_root: &Path) -> Vec<DuplicateGroupFinding> {
    let mut sorted: Vec<&ClonePair> = pairs.iter().collect();
    sorted.sort_by(|a, b| {
        b.tokens
            .cmp(&a.tokens)
            .then(b.lines.cmp(&a.lines))
            .then(a.first.file.cmp(&b.first.file))
            .then(a.second.file.cmp(&b.second.file))
    });

    sorted
        .into_iter()
        .take(TOP_GROUPS)
        .map(|pair| {
            let first = rel_path(project_root, &pair.first.file);
            let second = rel_path(project_root, &pair.second.file);
            let location = lowest_common_dir(&first, &second);
            DuplicateGroupFinding {
                files: vec![first, second],
                lines: pair.lines,
                tokens: pair.tokens,
                suggested_location: location,
            }
        })
        .collect()
}

fn lowest_common_dir(a: &str, b: &str) -> String {
    let a_dirs: Vec<&str> = a.split('/').collect();
    let b_dirs: Vec<&str> = b.split('/').collect();
    // the last segment is the file name on both sides
    let common: Vec<&str> = a_dirs[..a_dirs.len().saturating_sub(1)]
        .iter()
        .zip(&b_dirs[..b_dirs.len().saturating_sub(1)])
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| *x)
        .collect();
    if common.is_empty() {
        ".".to_string()
    } else {
        common.join("/")
    }
}

fn rel_path(project_root: &Path, path: &Path) -> String {
    pathdiff::diff_paths(path, project_root)
        .unwrap_or_else(|| path.to_path_buf())
        .to_string_lossy()
        .replace('\\', "/")
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Word-boundary occurrence count of `name` in `content`.
pub fn count_occurrences(content: &str, name: &str) -> usize {
    if name.is_empty() {
        return 0;
    }
    let mut count = 0;
    let mut from = 0;
    while let Some(pos) = content[from..].find(name) {
        let at = from + pos;
        let before_ok = content[..at].chars().next_back().map_or(true, |c| !is_ident_char(c));
        let end = at + name.len();
        let after_ok = content[end..].chars().next().map_or(true, |c| !is_ident_char(c));
        if before_ok && after_ok {
            count += 1;
        }
        from = end;
    }
    count
}

fn first_occurrence_line(content: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 1;
    }
    for (idx, line) in content.lines().enumerate() {
        if count_occurrences(line, needle) > 0 {
            return idx + 1;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tools::{DeadSymbol, DeadSymbolKind};
    use indoc::indoc;

    #[test]
    fn occurrence_count_respects_identifier_boundaries() {
        let content = "export function helper() {}\nconst x = helper();\nconst helperSuite = 1;\n";
        assert_eq!(count_occurrences(content, "helper"), 2);
        assert_eq!(count_occurrences(content, "helperSuite"), 1);
        assert_eq!(count_occurrences(content, "missing"), 0);
    }

    #[test]
    fn occurrence_count_handles_dollar_names() {
        let content = "const $root = find();\nuse($root);\n";
        assert_eq!(count_occurrences(content, "$root"), 2);
        assert_eq!(count_occurrences(content, "root"), 0);
    }

    #[test]
    fn symbol_used_twice_is_unused_exported() {
        let content = indoc! {r#"
            export function buildIndex(rows: Row[]) {
              return rows.map(toEntry);
            }
            const index = buildIndex(load());
        "#};
        let findings = DeadCodeFileFindings {
            symbols: vec![DeadSymbol {
                name: "buildIndex".to_string(),
                kind: DeadSymbolKind::Export,
            }],
            ..Default::default()
        };
        let violations = reconcile_file(content, &findings);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule.as_deref(), Some("unused-exported"));
        assert_eq!(violations[0].line, 1);
    }

    #[test]
    fn symbol_seen_once_is_fully_unused() {
        let content = "export const LEGACY_LIMIT = 10;\n";
        let findings = DeadCodeFileFindings {
            symbols: vec![DeadSymbol {
                name: "LEGACY_LIMIT".to_string(),
                kind: DeadSymbolKind::Export,
            }],
            ..Default::default()
        };
        let violations = reconcile_file(content, &findings);
        assert_eq!(violations[0].rule.as_deref(), Some("fully-unused"));
        assert!(violations[0].advice.as_deref().unwrap().contains("delete"));
    }

    #[test]
    fn unresolved_and_unlisted_are_reported_with_lines() {
        let content = indoc! {r#"
            import { gone } from "./missing-module";
            import _ from "left-pad";
        "#};
        let findings = DeadCodeFileFindings {
            unresolved_imports: vec!["./missing-module".to_string()],
            unlisted_dependencies: vec!["left-pad".to_string()],
            ..Default::default()
        };
        let violations = reconcile_file(content, &findings);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].line, 1);
        assert_eq!(violations[1].line, 2);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let content = "export function once() {}\n";
        let findings = DeadCodeFileFindings {
            symbols: vec![DeadSymbol {
                name: "once".to_string(),
                kind: DeadSymbolKind::Export,
            }],
            ..Default::default()
        };
        let first = reconcile_file(content, &findings);
        let second = reconcile_file(content, &findings);
        assert_eq!(first, second);
    }

    #[test]
    fn lowest_common_dir_of_siblings_and_cousins() {
        assert_eq!(
            lowest_common_dir("src/orders/export.ts", "src/billing/export.ts"),
            "src"
        );
        assert_eq!(
            lowest_common_dir("src/orders/a.ts", "src/orders/b.ts"),
            "src/orders"
        );
        assert_eq!(lowest_common_dir("a.ts", "b.ts"), ".");
    }
}
