//! The emitted report artifact.
//!
//! The report is the machine-actionable contract with downstream
//! automation: `summary.status` is `pass` exactly when `results` is
//! empty and no repo block is present.

use super::{Category, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub source: Category,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// For duplicate segments: the partner file's relative path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_file: Option<String>,
}

impl Issue {
    pub fn new(source: Category, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source,
            kind: kind.into(),
            line: None,
            column: None,
            message: message.into(),
            guidance: None,
            rule: None,
            symbol: None,
            other_file: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FileEntry {
    #[serde(rename = "relPath")]
    pub rel_path: String,
    pub issues: Vec<Issue>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RepoLintGate {
    pub errors: usize,
    pub warnings: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RepoCompilerGate {
    pub config: String,
    pub errors: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub unknown: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DuplicateGroup {
    pub files: Vec<String>,
    pub lines: usize,
    pub tokens: usize,
    #[serde(rename = "suggestedLocation")]
    pub suggested_location: String,
}

/// Repo-level findings that failed and are not already covered by a
/// per-file entry.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RepoBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lint: Option<RepoLintGate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compiler: Vec<RepoCompilerGate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", rename = "unusedFiles")]
    pub unused_files: Vec<String>,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        rename = "unlistedDependencies"
    )]
    pub unlisted_dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", rename = "duplicateGroups")]
    pub duplicate_groups: Vec<DuplicateGroup>,
}

impl RepoBlock {
    pub fn is_empty(&self) -> bool {
        self.lint.is_none()
            && self.compiler.is_empty()
            && self.unused_files.is_empty()
            && self.unlisted_dependencies.is_empty()
            && self.duplicate_groups.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReportSummary {
    pub status: Status,
    #[serde(rename = "filesAnalyzed")]
    pub files_analyzed: usize,
    #[serde(rename = "failingFiles")]
    pub failing_files: usize,
    /// Failing-violation counts per category, across all files.
    #[serde(rename = "categoryCounts")]
    pub category_counts: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(rename = "generatedAt")]
    pub generated_at: DateTime<Utc>,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExecutionPlan {
    pub instruction: String,
    pub strategy: String,
    pub steps: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub summary: ReportSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<FileEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<RepoBlock>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "executionPlan")]
    pub execution_plan: Option<ExecutionPlan>,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}
