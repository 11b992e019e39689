//! Dead-code detector step (knip-compatible JSON report).
//!
//! The detector's verdicts are candidates, not conclusions: it cannot
//! always tell "exported but unused" from "used internally but
//! needlessly exported". The merge phase re-scans implicated files to
//! refine the classification; this module only parses and adapts.

use super::{resolve_binary, run_tool, ProcessOutput, ToolError};
use crate::config::DeadCodeSettings;
use crate::core::tools::{DeadCodeFileFindings, DeadCodeOutput, DeadSymbol, DeadSymbolKind};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const TOOL: &str = "dead-code detector";

/// Raw tool schema; confined to this module.
#[derive(Debug, Deserialize)]
struct RawReport {
    #[serde(default)]
    files: Vec<String>,
    #[serde(default)]
    issues: Vec<RawFileIssues>,
}

#[derive(Debug, Deserialize)]
struct RawFileIssues {
    file: String,
    #[serde(default)]
    exports: Vec<RawName>,
    #[serde(default)]
    types: Vec<RawName>,
    #[serde(default, rename = "enumMembers")]
    enum_members: HashMap<String, Vec<RawName>>,
    #[serde(default, rename = "classMembers")]
    class_members: HashMap<String, Vec<RawName>>,
    #[serde(default)]
    unresolved: Vec<RawName>,
    #[serde(default)]
    unlisted: Vec<RawName>,
}

/// Entries appear as plain strings in older report versions and as
/// objects in newer ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawName {
    Plain(String),
    Entry { name: String },
}

impl RawName {
    fn into_name(self) -> String {
        match self {
            RawName::Plain(name) => name,
            RawName::Entry { name } => name,
        }
    }
}

fn adapt(raw: RawReport, project_root: &Path) -> DeadCodeOutput {
    let mut output = DeadCodeOutput {
        unused_files: raw
            .files
            .into_iter()
            .map(|f| absolutize(project_root, &f))
            .collect(),
        ..Default::default()
    };

    for issue in raw.issues {
        let mut findings = DeadCodeFileFindings::default();
        findings.symbols.extend(
            issue
                .exports
                .into_iter()
                .map(|n| symbol(n, DeadSymbolKind::Export)),
        );
        findings.symbols.extend(
            issue
                .types
                .into_iter()
                .map(|n| symbol(n, DeadSymbolKind::Type)),
        );
        for (_, members) in issue.enum_members {
            findings
                .symbols
                .extend(members.into_iter().map(|n| symbol(n, DeadSymbolKind::EnumMember)));
        }
        for (_, members) in issue.class_members {
            findings
                .symbols
                .extend(members.into_iter().map(|n| symbol(n, DeadSymbolKind::ClassMember)));
        }
        findings.unresolved_imports =
            issue.unresolved.into_iter().map(RawName::into_name).collect();
        findings.unlisted_dependencies =
            issue.unlisted.into_iter().map(RawName::into_name).collect();

        output
            .by_file
            .insert(absolutize(project_root, &issue.file), findings);
    }

    output
}

fn symbol(name: RawName, kind: DeadSymbolKind) -> DeadSymbol {
    DeadSymbol {
        name: name.into_name(),
        kind,
    }
}

fn absolutize(project_root: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

/// Two-tier exit handling: the detector exits non-zero whenever it has
/// findings, so stdout is parsed regardless of exit code.
fn interpret(out: ProcessOutput, project_root: &Path) -> Result<DeadCodeOutput, ToolError> {
    match serde_json::from_str::<RawReport>(out.stdout.trim()) {
        Ok(raw) => Ok(adapt(raw, project_root)),
        Err(e) => Err(ToolError::Unparsable {
            tool: TOOL,
            code: out.code,
            detail: format!("{e}; stderr: {}", out.stderr.trim()),
        }),
    }
}

pub fn run(
    settings: &DeadCodeSettings,
    project_root: &Path,
    timeout: Duration,
) -> Result<DeadCodeOutput, ToolError> {
    let program = resolve_binary(TOOL, &settings.binary, project_root)?;
    let args = vec!["--reporter".to_string(), "json".to_string()];
    let out = run_tool(TOOL, &program, &args, project_root, timeout)?;
    interpret(out, project_root)
}
