//! Shared shapes for external tool output.
//!
//! Each tool module parses its own native format into its own raw types
//! and projects them into these shapes through a single adapter. Nothing
//! downstream of the adapters sees a tool's native schema.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LintSeverity {
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LintMessage {
    pub rule: Option<String>,
    pub severity: LintSeverity,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub fixable: bool,
}

/// Parsed lint-engine output, keyed by absolute file path.
#[derive(Clone, Debug, Default)]
pub struct LintOutput {
    pub by_file: HashMap<PathBuf, Vec<LintMessage>>,
}

impl LintOutput {
    pub fn merge(&mut self, other: LintOutput) {
        for (path, mut messages) in other.by_file {
            self.by_file.entry(path).or_default().append(&mut messages);
        }
    }

    pub fn error_count(&self) -> usize {
        self.by_file
            .values()
            .flatten()
            .filter(|m| m.severity == LintSeverity::Error)
            .count()
    }
}

/// Result of one lint-engine step. A project without discoverable lint
/// configuration degrades to `Skipped` with a recorded warning.
#[derive(Clone, Debug)]
pub enum LintOutcome {
    Ran(LintOutput),
    Skipped { warning: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilerDiagnostic {
    /// `None` for global diagnostics that carry no file position.
    pub file: Option<PathBuf>,
    pub line: usize,
    pub column: usize,
    pub code: String,
    pub message: String,
}

/// Parsed compiler diagnostics for one configuration.
#[derive(Clone, Debug)]
pub struct CompilerOutput {
    pub config: String,
    pub diagnostics: Vec<CompilerDiagnostic>,
    /// Lines that looked like diagnostics but matched no supported
    /// format. Counted, never discarded, so a format drift cannot turn
    /// into a false pass.
    pub unknown_lines: usize,
}

impl CompilerOutput {
    pub fn clean(config: impl Into<String>) -> Self {
        Self {
            config: config.into(),
            diagnostics: Vec::new(),
            unknown_lines: 0,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && self.unknown_lines == 0
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DeadSymbolKind {
    Export,
    Type,
    EnumMember,
    ClassMember,
}

impl DeadSymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeadSymbolKind::Export => "export",
            DeadSymbolKind::Type => "type",
            DeadSymbolKind::EnumMember => "enum-member",
            DeadSymbolKind::ClassMember => "class-member",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeadSymbol {
    pub name: String,
    pub kind: DeadSymbolKind,
}

/// Dead-code findings for one file, straight from the detector and not
/// yet reconciled against the file's own text.
#[derive(Clone, Debug, Default)]
pub struct DeadCodeFileFindings {
    pub symbols: Vec<DeadSymbol>,
    pub unresolved_imports: Vec<String>,
    pub unlisted_dependencies: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct DeadCodeOutput {
    pub by_file: HashMap<PathBuf, DeadCodeFileFindings>,
    /// Files the detector considers wholly unused.
    pub unused_files: Vec<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloneSpan {
    pub file: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClonePair {
    pub first: CloneSpan,
    pub second: CloneSpan,
    pub tokens: usize,
    pub lines: usize,
}

#[derive(Clone, Debug, Default)]
pub struct DuplicateOutput {
    pub pairs: Vec<ClonePair>,
    pub overall_percentage: Option<f64>,
}

/// Joined output of all repo-scope tool invocations, ready for merge.
#[derive(Clone, Debug)]
pub struct ExternalToolOutput {
    pub lint: LintOutcome,
    pub lint_gate: LintOutcome,
    pub compiler: Vec<CompilerOutput>,
    pub dead_code: DeadCodeOutput,
    pub duplicate: DuplicateOutput,
}
