//! Reviewable-path discovery.
//!
//! The pipeline treats its file list as an external input: either the
//! caller supplies explicit paths, or this walker discovers the full
//! tree honoring the reviewable-path rules (extension allow-list,
//! exclusion globs, gitignore).

use anyhow::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

pub struct FileWalker {
    root: PathBuf,
    extensions: Vec<String>,
    exclude_patterns: Vec<String>,
}

impl FileWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            extensions: default_extensions(),
            exclude_patterns: Vec::new(),
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        if !extensions.is_empty() {
            self.extensions = extensions;
        }
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .build();

        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && self.should_review(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    fn should_review(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().map(|e| e.to_string_lossy().to_string()) else {
            return false;
        };
        if !self.extensions.iter().any(|allowed| *allowed == ext) {
            return false;
        }

        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        let rel_str = rel.to_string_lossy().replace('\\', "/");
        if rel_str.split('/').any(|seg| EXCLUDED_DIRS.contains(&seg)) {
            return false;
        }

        for pattern in &self.exclude_patterns {
            if glob::Pattern::new(pattern)
                .map(|p| p.matches(&rel_str))
                .unwrap_or(false)
            {
                return false;
            }
        }

        true
    }
}

/// Directory segments that are never reviewable (generated, vendored,
/// or third-party output).
const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    "coverage",
    ".next",
    "out",
    "vendor",
    "generated",
];

pub fn default_extensions() -> Vec<String> {
    ["ts", "tsx", "js", "jsx", "mts", "cts", "mjs", "cjs"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// The file-existence filter applied to externally supplied lists.
pub fn existing_files(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.into_iter().filter(|p| p.is_file()).collect()
}
