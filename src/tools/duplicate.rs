//! Duplicate-code detector step (jscpd-compatible JSON report).
//!
//! The detector writes its JSON report to an output directory rather
//! than stdout; the step reads it back after the run. A non-zero exit
//! (the detector gates on its own thresholds) is fine as long as the
//! report file is present and parsable.

use super::{resolve_binary, run_tool, ToolError};
use crate::config::DuplicateSettings;
use crate::core::tools::{ClonePair, CloneSpan, DuplicateOutput};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const TOOL: &str = "duplicate detector";

const REPORT_DIR: &str = ".codegate/duplicate";
const REPORT_FILE: &str = "jscpd-report.json";

/// Raw tool schema; confined to this module.
#[derive(Debug, Deserialize)]
struct RawReport {
    #[serde(default)]
    duplicates: Vec<RawClone>,
    statistics: Option<RawStatistics>,
}

#[derive(Debug, Deserialize)]
struct RawClone {
    #[serde(default)]
    lines: usize,
    #[serde(default)]
    tokens: usize,
    #[serde(rename = "firstFile")]
    first_file: RawSpan,
    #[serde(rename = "secondFile")]
    second_file: RawSpan,
}

#[derive(Debug, Deserialize)]
struct RawSpan {
    name: String,
    #[serde(default)]
    start: usize,
    #[serde(default)]
    end: usize,
}

#[derive(Debug, Deserialize)]
struct RawStatistics {
    total: Option<RawTotal>,
}

#[derive(Debug, Deserialize)]
struct RawTotal {
    percentage: Option<f64>,
}

fn adapt(raw: RawReport, project_root: &Path) -> DuplicateOutput {
    DuplicateOutput {
        pairs: raw
            .duplicates
            .into_iter()
            .map(|c| ClonePair {
                first: span(&c.first_file, project_root),
                second: span(&c.second_file, project_root),
                tokens: c.tokens,
                lines: c.lines,
            })
            .collect(),
        overall_percentage: raw
            .statistics
            .and_then(|s| s.total)
            .and_then(|t| t.percentage),
    }
}

fn span(raw: &RawSpan, project_root: &Path) -> CloneSpan {
    let path = Path::new(&raw.name);
    let file = if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    };
    CloneSpan {
        file,
        start_line: raw.start.max(1),
        end_line: raw.end.max(raw.start.max(1)),
    }
}

pub fn parse_report(raw: &str, project_root: &Path) -> Result<DuplicateOutput, ToolError> {
    serde_json::from_str::<RawReport>(raw.trim())
        .map(|r| adapt(r, project_root))
        .map_err(|e| ToolError::Unparsable {
            tool: TOOL,
            code: None,
            detail: e.to_string(),
        })
}

pub fn run(
    settings: &DuplicateSettings,
    project_root: &Path,
    timeout: Duration,
) -> Result<DuplicateOutput, ToolError> {
    let program = resolve_binary(TOOL, &settings.binary, project_root)?;
    let report_dir = project_root.join(REPORT_DIR);
    let args = vec![
        "--min-tokens".to_string(),
        settings.min_tokens.to_string(),
        "--reporters".to_string(),
        "json".to_string(),
        "--silent".to_string(),
        "--output".to_string(),
        report_dir.to_string_lossy().to_string(),
        ".".to_string(),
    ];

    let out = run_tool(TOOL, &program, &args, project_root, timeout)?;

    let report_path = report_dir.join(REPORT_FILE);
    let raw = std::fs::read_to_string(&report_path).map_err(|e| ToolError::Unparsable {
        tool: TOOL,
        code: out.code,
        detail: format!(
            "report file {} unreadable ({e}); stderr: {}",
            report_path.display(),
            out.stderr.trim()
        ),
    })?;
    parse_report(&raw, project_root)
}
