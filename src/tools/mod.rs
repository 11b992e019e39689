//! External tool invocation.
//!
//! Each delegated tool (lint engine, compiler, dead-code detector,
//! duplicate detector) is run as a subprocess with captured output and
//! a hard timeout. Failure handling is two-tier: a non-zero exit first
//! goes through the tool's normal output parser (most tools exit
//! non-zero when they merely found violations); only when that parse
//! also fails does the step become a hard, run-blocking failure.

pub mod compiler;
pub mod deadcode;
pub mod duplicate;
pub mod lint;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Run-blocking tool failures. Tool-reported violations are data, not
/// errors, and never appear here.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{tool} binary not found ({detail}); install it or set its path in codegate.toml")]
    NotFound { tool: &'static str, detail: String },

    #[error("{tool} could not be executed: {detail}")]
    Spawn { tool: &'static str, detail: String },

    #[error("{tool} timed out after {seconds}s and was killed")]
    Timeout { tool: &'static str, seconds: u64 },

    #[error("{tool} output was not parsable (exit code {code:?}): {detail}")]
    Unparsable {
        tool: &'static str,
        code: Option<i32>,
        detail: String,
    },

    #[error(
        "compiler version mismatch: project resolves {project}, orchestrator resolves {orchestrator}; \
         align the two (update the project's compiler dependency or the orchestrator toolchain) and re-run"
    )]
    VersionMismatch {
        project: String,
        orchestrator: String,
    },
}

#[derive(Debug)]
pub struct ProcessOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Execute one tool invocation with captured output and a hard
/// deadline. On timeout the child is killed and the step fails as
/// tool infrastructure; there is no automatic retry.
pub fn run_tool(
    tool: &'static str,
    program: &Path,
    args: &[String],
    cwd: &Path,
    timeout: Duration,
) -> Result<ProcessOutput, ToolError> {
    log::debug!("running {tool}: {} {}", program.display(), args.join(" "));

    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ToolError::Spawn {
            tool,
            detail: e.to_string(),
        })?;

    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ToolError::Timeout {
                        tool,
                        seconds: timeout.as_secs(),
                    });
                }
                std::thread::sleep(Duration::from_millis(25));
            }
            Err(e) => {
                return Err(ToolError::Spawn {
                    tool,
                    detail: e.to_string(),
                })
            }
        }
    };

    let stdout = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();

    Ok(ProcessOutput {
        code: status.code(),
        stdout,
        stderr,
    })
}

fn spawn_reader<R: Read + Send + 'static>(
    source: Option<R>,
) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut reader) = source {
            let _ = reader.read_to_string(&mut buf);
        }
        buf
    })
}

/// Resolve a tool binary: explicit paths win, then the project-local
/// `node_modules/.bin`, then the environment `PATH`.
pub fn resolve_binary(
    tool: &'static str,
    configured: &str,
    project_root: &Path,
) -> Result<PathBuf, ToolError> {
    let as_path = Path::new(configured);
    if as_path.components().count() > 1 {
        let absolute = if as_path.is_absolute() {
            as_path.to_path_buf()
        } else {
            project_root.join(as_path)
        };
        if absolute.is_file() {
            return Ok(absolute);
        }
        return Err(ToolError::NotFound {
            tool,
            detail: format!("configured path {} does not exist", absolute.display()),
        });
    }

    let local = project_root.join("node_modules").join(".bin").join(configured);
    if local.is_file() {
        return Ok(local);
    }

    which::which(configured).map_err(|e| ToolError::NotFound {
        tool,
        detail: e.to_string(),
    })
}

/// Fixed sub-batch size used when one process call would exceed the
/// platform argument-length budget.
pub const SUB_BATCH_SIZE: usize = 60;

fn arg_budget() -> usize {
    if cfg!(windows) {
        // cmd.exe line limit, minus headroom for the program and flags
        6 * 1024
    } else {
        100 * 1024
    }
}

/// Split target paths for one logical invocation: a single batch when
/// the combined argument length fits the budget, fixed-size sub-batches
/// otherwise. Callers must merge sub-batch outputs and fail the whole
/// step if any sub-batch hard-fails; files are never silently dropped.
pub fn chunk_paths(paths: &[PathBuf]) -> Vec<&[PathBuf]> {
    let total: usize = paths
        .iter()
        .map(|p| p.as_os_str().len() + 1)
        .sum();
    if total <= arg_budget() {
        vec![paths]
    } else {
        paths.chunks(SUB_BATCH_SIZE).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_keeps_single_batch_under_budget() {
        let paths: Vec<PathBuf> = (0..10).map(|i| PathBuf::from(format!("src/f{i}.ts"))).collect();
        let chunks = chunk_paths(&paths);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 10);
    }

    #[test]
    fn chunking_splits_into_fixed_sub_batches_over_budget() {
        let long = "x".repeat(2048);
        let paths: Vec<PathBuf> = (0..130)
            .map(|i| PathBuf::from(format!("/repo/{long}/file{i}.ts")))
            .collect();
        let chunks = chunk_paths(&paths);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), SUB_BATCH_SIZE);
        assert_eq!(chunks[1].len(), SUB_BATCH_SIZE);
        assert_eq!(chunks[2].len(), 10);
        let total: usize = chunks.iter().map(|c| c.len()).sum();
        assert_eq!(total, 130);
    }

    #[cfg(unix)]
    mod process {
        use super::super::*;

        fn sh() -> PathBuf {
            PathBuf::from("/bin/sh")
        }

        #[test]
        fn captures_stdout_and_exit_code() {
            let out = run_tool(
                "probe",
                &sh(),
                &["-c".into(), "echo hello; exit 3".into()],
                Path::new("."),
                Duration::from_secs(5),
            )
            .unwrap();
            assert_eq!(out.code, Some(3));
            assert_eq!(out.stdout.trim(), "hello");
            assert!(!out.success());
        }

        #[test]
        fn timeout_kills_the_child() {
            let err = run_tool(
                "probe",
                &sh(),
                &["-c".into(), "sleep 30".into()],
                Path::new("."),
                Duration::from_millis(200),
            )
            .unwrap_err();
            assert!(matches!(err, ToolError::Timeout { .. }));
        }

        #[test]
        fn missing_binary_is_a_spawn_failure() {
            let err = run_tool(
                "probe",
                Path::new("/definitely/not/a/binary"),
                &[],
                Path::new("."),
                Duration::from_secs(1),
            )
            .unwrap_err();
            assert!(matches!(err, ToolError::Spawn { .. }));
        }
    }
}
