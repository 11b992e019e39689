pub mod walker;

use anyhow::{Context, Result};
use dashmap::DashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared read-only file content cache, scoped to one pipeline run.
///
/// Keys are absolute paths; each key is written once and then only
/// read, so every analyzer and the merge-time reconciliation scan see
/// the same snapshot of a file. Injected explicitly everywhere it is
/// needed and dropped when the run ends.
#[derive(Default)]
pub struct ContentCache {
    entries: DashMap<PathBuf, Arc<str>>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self, path: &Path) -> Result<Arc<str>> {
        if let Some(hit) = self.entries.get(path) {
            return Ok(Arc::clone(hit.value()));
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let entry = self
            .entries
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::from(content));
        Ok(Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("failed to create {}", path.display()))
}

/// Replace `path` wholesale: write to a sibling temp file, then rename
/// over the target so a concurrent reader never observes a partial
/// report.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "out".to_string());
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    fs::write(&tmp, contents).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace {}", path.display()))
}
