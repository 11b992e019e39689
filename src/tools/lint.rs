//! Lint engine step (ESLint-compatible JSON output).
//!
//! The batch run covers all target files in one process call when the
//! argument budget allows, and falls back to fixed-size sub-batches
//! otherwise; sub-batch outputs are merged by absolute path and any
//! sub-batch hard failure fails the whole step. A project with no
//! discoverable lint configuration skips the step with a warning
//! instead of failing it.

use super::{chunk_paths, resolve_binary, run_tool, ProcessOutput, ToolError};
use crate::config::LintSettings;
use crate::core::tools::{LintMessage, LintOutcome, LintOutput, LintSeverity};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const TOOL: &str = "lint engine";

/// Standard config filenames, flat config first.
const CONFIG_FILES: &[&str] = &[
    "eslint.config.js",
    "eslint.config.mjs",
    "eslint.config.cjs",
    "eslint.config.ts",
    ".eslintrc.js",
    ".eslintrc.cjs",
    ".eslintrc.json",
    ".eslintrc.yaml",
    ".eslintrc.yml",
    ".eslintrc",
];

/// Raw tool schema. Stays inside this module; everything downstream
/// sees [`LintOutput`] only.
#[derive(Debug, Deserialize)]
struct RawFileReport {
    #[serde(rename = "filePath")]
    file_path: String,
    #[serde(default)]
    messages: Vec<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "ruleId")]
    rule_id: Option<String>,
    severity: u8,
    message: String,
    #[serde(default)]
    line: usize,
    #[serde(default)]
    column: usize,
    #[serde(default)]
    fix: Option<serde_json::Value>,
}

fn adapt(raw: Vec<RawFileReport>) -> LintOutput {
    let mut output = LintOutput::default();
    for file in raw {
        let messages = file
            .messages
            .into_iter()
            .map(|m| LintMessage {
                rule: m.rule_id,
                severity: if m.severity >= 2 {
                    LintSeverity::Error
                } else {
                    LintSeverity::Warning
                },
                message: m.message,
                line: m.line.max(1),
                column: m.column.max(1),
                fixable: m.fix.is_some(),
            })
            .collect();
        output.by_file.insert(PathBuf::from(file.file_path), messages);
    }
    output
}

pub fn discover_config(project_root: &Path) -> Option<PathBuf> {
    for name in CONFIG_FILES {
        let candidate = project_root.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    let manifest = project_root.join("package.json");
    if let Ok(raw) = std::fs::read_to_string(&manifest) {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(&raw) {
            if json.get("eslintConfig").is_some() {
                return Some(manifest);
            }
        }
    }
    None
}

/// Two-tier exit handling: parse stdout regardless of exit code; only
/// an unparsable stdout is a hard failure.
fn interpret(out: ProcessOutput) -> Result<LintOutput, ToolError> {
    match serde_json::from_str::<Vec<RawFileReport>>(out.stdout.trim()) {
        Ok(raw) => Ok(adapt(raw)),
        Err(e) => Err(ToolError::Unparsable {
            tool: TOOL,
            code: out.code,
            detail: format!("{e}; stderr: {}", truncate(&out.stderr)),
        }),
    }
}

fn truncate(text: &str) -> String {
    const LIMIT: usize = 400;
    match text.char_indices().nth(LIMIT) {
        Some((at, _)) => format!("{}…", &text[..at]),
        None => text.to_string(),
    }
}

fn base_args(settings: &LintSettings) -> Vec<String> {
    vec![
        "--format".to_string(),
        "json".to_string(),
        "--cache".to_string(),
        "--cache-location".to_string(),
        settings.cache_dir.clone(),
    ]
}

/// Batched lint run over the target files.
pub fn run_batch(
    settings: &LintSettings,
    project_root: &Path,
    files: &[PathBuf],
    timeout: Duration,
) -> Result<LintOutcome, ToolError> {
    if discover_config(project_root).is_none() {
        return Ok(LintOutcome::Skipped {
            warning: "no lint configuration found; lint step skipped".to_string(),
        });
    }
    if files.is_empty() {
        return Ok(LintOutcome::Ran(LintOutput::default()));
    }

    let program = resolve_binary(TOOL, &settings.binary, project_root)?;
    let mut merged = LintOutput::default();
    for chunk in chunk_paths(files) {
        let mut args = base_args(settings);
        args.extend(chunk.iter().map(|p| p.to_string_lossy().to_string()));
        let out = run_tool(TOOL, &program, &args, project_root, timeout)?;
        merged.merge(interpret(out)?);
    }
    Ok(LintOutcome::Ran(merged))
}

/// Repo-wide lint gate over the whole tree, not just analyzed files.
/// The directory invocation carries the extensions filter that the
/// per-file batch expresses through its explicit path list.
pub fn run_repo_gate(
    settings: &LintSettings,
    project_root: &Path,
    extensions: &[String],
    timeout: Duration,
) -> Result<LintOutcome, ToolError> {
    if discover_config(project_root).is_none() {
        return Ok(LintOutcome::Skipped {
            warning: "no lint configuration found; repo lint gate skipped".to_string(),
        });
    }
    let program = resolve_binary(TOOL, &settings.binary, project_root)?;
    let mut args = base_args(settings);
    if !extensions.is_empty() {
        args.push("--ext".to_string());
        args.push(
            extensions
                .iter()
                .map(|e| format!(".{e}"))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    args.push(".".to_string());
    let out = run_tool(TOOL, &program, &args, project_root, timeout)?;
    Ok(LintOutcome::Ran(interpret(out)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const SAMPLE: &str = indoc! {r#"
        [
          {
            "filePath": "/repo/src/app.ts",
            "messages": [
              {
                "ruleId": "no-unused-vars",
                "severity": 2,
                "message": "'x' is defined but never used.",
                "line": 3,
                "column": 7,
                "fix": { "range": [10, 12], "text": "" }
              },
              {
                "ruleId": "prefer-const",
                "severity": 1,
                "message": "'y' is never reassigned.",
                "line": 8,
                "column": 3
              }
            ]
          },
          { "filePath": "/repo/src/clean.ts", "messages": [] }
        ]
    "#};

    #[test]
    fn adapter_projects_severity_and_fixability() {
        let out = interpret(ProcessOutput {
            code: Some(1),
            stdout: SAMPLE.to_string(),
            stderr: String::new(),
        })
        .unwrap();

        let messages = &out.by_file[Path::new("/repo/src/app.ts")];
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].severity, LintSeverity::Error);
        assert!(messages[0].fixable);
        assert_eq!(messages[1].severity, LintSeverity::Warning);
        assert!(!messages[1].fixable);
        assert_eq!(out.error_count(), 1);
    }

    #[test]
    fn nonzero_exit_with_valid_output_is_not_a_failure() {
        let result = interpret(ProcessOutput {
            code: Some(2),
            stdout: "[]".to_string(),
            stderr: String::new(),
        });
        assert!(result.is_ok());
    }

    #[test]
    fn unparsable_output_is_a_hard_failure() {
        let err = interpret(ProcessOutput {
            code: Some(2),
            stdout: "segfault".to_string(),
            stderr: "oom".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, ToolError::Unparsable { code: Some(2), .. }));
    }

    #[test]
    fn config_discovery_finds_flat_and_legacy_files() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(discover_config(dir.path()).is_none());

        std::fs::write(dir.path().join(".eslintrc.json"), "{}").unwrap();
        assert!(discover_config(dir.path()).is_some());
    }

    #[test]
    fn config_discovery_reads_package_json_key() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{ "name": "x", "eslintConfig": { "rules": {} } }"#,
        )
        .unwrap();
        assert!(discover_config(dir.path()).is_some());
    }

    #[test]
    fn missing_config_skips_with_warning() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = LintSettings::default();
        let outcome = run_batch(
            &settings,
            dir.path(),
            &[PathBuf::from("a.ts")],
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(matches!(outcome, LintOutcome::Skipped { .. }));
    }
}
