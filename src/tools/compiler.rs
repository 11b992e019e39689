//! Compiler diagnostics step (tsc-style no-emit runs).
//!
//! Before any gate runs, the project's local compiler binary and the
//! orchestrator's one are version-probed; a mismatch aborts the whole
//! run with remediation text rather than emit diagnostics from the
//! wrong compiler. Diagnostic output is matched against the two
//! supported line formats plus the file-less global form; any other
//! line that still looks like a diagnostic is counted as unknown, so
//! a format drift can never produce a false pass.

use super::{resolve_binary, run_tool, ProcessOutput, ToolError};
use crate::config::CompilerSettings;
use crate::core::tools::{CompilerDiagnostic, CompilerOutput};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;

const TOOL: &str = "compiler";

/// `src/app.ts(12,5): error TS2322: message`
static PAREN_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<file>.+?)\((?P<line>\d+),(?P<col>\d+)\):\s+error\s+TS(?P<code>\d+):\s+(?P<msg>.*)$")
        .unwrap()
});

/// `src/app.ts:12:5 - error TS2322: message`
static COLON_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<file>.+?):(?P<line>\d+):(?P<col>\d+)\s+-\s+error\s+TS(?P<code>\d+):\s+(?P<msg>.*)$")
        .unwrap()
});

/// `error TS18003: message` (no file position)
static GLOBAL_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^error\s+TS(?P<code>\d+):\s+(?P<msg>.*)$").unwrap());

static DIAGNOSTIC_LIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\berror\s+TS\d+\b").unwrap());

pub fn parse_diagnostics(config: &str, stdout: &str, project_root: &Path) -> CompilerOutput {
    let mut output = CompilerOutput::clean(config);

    for raw_line in stdout.lines() {
        let line = raw_line.trim_end();
        if line.trim().is_empty() {
            continue;
        }

        if let Some(c) = PAREN_FORMAT.captures(line).or_else(|| COLON_FORMAT.captures(line)) {
            output.diagnostics.push(CompilerDiagnostic {
                file: Some(absolutize(project_root, &c["file"])),
                line: c["line"].parse().unwrap_or(1),
                column: c["col"].parse().unwrap_or(1),
                code: format!("TS{}", &c["code"]),
                message: c["msg"].to_string(),
            });
        } else if let Some(c) = GLOBAL_FORMAT.captures(line) {
            output.diagnostics.push(CompilerDiagnostic {
                file: None,
                line: 0,
                column: 0,
                code: format!("TS{}", &c["code"]),
                message: c["msg"].to_string(),
            });
        } else if DIAGNOSTIC_LIKE.is_match(line) {
            output.unknown_lines += 1;
        }
    }

    output
}

fn absolutize(project_root: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

/// Two-tier exit handling for one no-emit gate: exit zero is clean; a
/// non-zero exit is fine as long as stdout carries parsable
/// diagnostics, and hard-fails otherwise.
fn interpret(
    config: &str,
    out: ProcessOutput,
    project_root: &Path,
) -> Result<CompilerOutput, ToolError> {
    if out.success() {
        return Ok(CompilerOutput::clean(config));
    }
    let parsed = parse_diagnostics(config, &out.stdout, project_root);
    if parsed.is_clean() {
        return Err(ToolError::Unparsable {
            tool: TOOL,
            code: out.code,
            detail: format!(
                "non-zero exit with no recognizable diagnostics; stderr: {}",
                out.stderr.trim()
            ),
        });
    }
    Ok(parsed)
}

/// Run one repo-wide no-emit gate against a named configuration.
pub fn run_gate(
    settings: &CompilerSettings,
    project_root: &Path,
    config_name: &str,
    timeout: Duration,
) -> Result<CompilerOutput, ToolError> {
    let program = resolve_binary(TOOL, &settings.binary, project_root)?;
    let args = vec![
        "--noEmit".to_string(),
        "--pretty".to_string(),
        "false".to_string(),
        "-p".to_string(),
        config_name.to_string(),
    ];
    let out = run_tool(TOOL, &program, &args, project_root, timeout)?;
    interpret(config_name, out, project_root)
}

/// Version-parity preflight.
///
/// Compares the compiler the orchestrated project would use
/// (`node_modules/.bin`) against the one the orchestrator resolves
/// from its own environment. When only one of the two exists the same
/// binary serves both roles and parity holds trivially.
pub fn check_version_parity(
    settings: &CompilerSettings,
    project_root: &Path,
    timeout: Duration,
) -> Result<(), ToolError> {
    let project_bin = project_root
        .join("node_modules")
        .join(".bin")
        .join(&settings.binary);
    if !project_bin.is_file() {
        return Ok(());
    }
    let Ok(orchestrator_bin) = which::which(&settings.binary) else {
        return Ok(());
    };
    if orchestrator_bin == project_bin {
        return Ok(());
    }

    let project = probe_version(&project_bin, project_root, timeout)?;
    let orchestrator = probe_version(&orchestrator_bin, project_root, timeout)?;
    if project != orchestrator {
        return Err(ToolError::VersionMismatch {
            project,
            orchestrator,
        });
    }
    Ok(())
}

static VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+\.\d+\.[\w.-]+)").unwrap());

fn probe_version(program: &Path, cwd: &Path, timeout: Duration) -> Result<String, ToolError> {
    let out = run_tool(TOOL, program, &["--version".to_string()], cwd, timeout)?;
    VERSION
        .captures(&out.stdout)
        .map(|c| c[1].to_string())
        .ok_or_else(|| ToolError::Unparsable {
            tool: TOOL,
            code: out.code,
            detail: format!("unrecognized version output: {}", out.stdout.trim()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn parses_both_positional_formats() {
        let stdout = indoc! {r#"
            src/app.ts(12,5): error TS2322: Type 'string' is not assignable to type 'number'.
            src/lib/util.ts:40:13 - error TS2345: Argument of type 'X' is not assignable.
        "#};
        let out = parse_diagnostics("tsconfig.json", stdout, Path::new("/repo"));
        assert_eq!(out.diagnostics.len(), 2);
        assert_eq!(out.unknown_lines, 0);

        assert_eq!(
            out.diagnostics[0].file.as_deref(),
            Some(Path::new("/repo/src/app.ts"))
        );
        assert_eq!(out.diagnostics[0].line, 12);
        assert_eq!(out.diagnostics[0].column, 5);
        assert_eq!(out.diagnostics[0].code, "TS2322");

        assert_eq!(
            out.diagnostics[1].file.as_deref(),
            Some(Path::new("/repo/src/lib/util.ts"))
        );
        assert_eq!(out.diagnostics[1].code, "TS2345");
    }

    #[test]
    fn parses_global_diagnostics_without_file() {
        let out = parse_diagnostics(
            "tsconfig.json",
            "error TS18003: No inputs were found in config file.\n",
            Path::new("/repo"),
        );
        assert_eq!(out.diagnostics.len(), 1);
        assert!(out.diagnostics[0].file.is_none());
        assert_eq!(out.diagnostics[0].code, "TS18003");
    }

    #[test]
    fn unmatched_diagnostic_lines_are_counted_not_dropped() {
        let stdout = indoc! {r#"
            ??? error TS9999 in some future format
            Found 1 error.
        "#};
        let out = parse_diagnostics("tsconfig.json", stdout, Path::new("/repo"));
        assert!(out.diagnostics.is_empty());
        assert_eq!(out.unknown_lines, 1);
        assert!(!out.is_clean());
    }

    #[test]
    fn zero_exit_is_clean() {
        let out = interpret(
            "tsconfig.json",
            ProcessOutput {
                code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            },
            Path::new("/repo"),
        )
        .unwrap();
        assert!(out.is_clean());
    }

    #[test]
    fn nonzero_exit_with_diagnostics_succeeds() {
        let out = interpret(
            "tsconfig.json",
            ProcessOutput {
                code: Some(2),
                stdout: "src/a.ts(1,1): error TS1005: ';' expected.\n".to_string(),
                stderr: String::new(),
            },
            Path::new("/repo"),
        )
        .unwrap();
        assert_eq!(out.diagnostics.len(), 1);
    }

    #[test]
    fn nonzero_exit_without_diagnostics_is_infrastructure_failure() {
        let err = interpret(
            "tsconfig.json",
            ProcessOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: "cannot find module".to_string(),
            },
            Path::new("/repo"),
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::Unparsable { .. }));
    }
}
