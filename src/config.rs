//! Run configuration, loaded from `codegate.toml` at the project root.
//!
//! Every field has a default; a project without a config file gets the
//! stock gate. The config is loaded once per run and passed down
//! explicitly.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "codegate.toml";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub tools: ToolsConfig,
    pub report: ReportConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Worker bound for the per-file pass; 0 means one per CPU.
    pub jobs: usize,
    pub max_file_lines: usize,
    /// Extension allow-list for discovery.
    pub extensions: Vec<String>,
    /// Exclusion globs applied on top of the built-in generated/vendor
    /// rules, relative to the project root.
    pub exclude: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            jobs: 0,
            max_file_lines: 400,
            extensions: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub timeout_secs: u64,
    pub lint: LintSettings,
    pub compiler: CompilerSettings,
    pub dead_code: DeadCodeSettings,
    pub duplicate: DuplicateSettings,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            lint: LintSettings::default(),
            compiler: CompilerSettings::default(),
            dead_code: DeadCodeSettings::default(),
            duplicate: DuplicateSettings::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LintSettings {
    pub binary: String,
    /// Persistent cache handed to the lint engine so unchanged files
    /// are skipped across runs.
    pub cache_dir: String,
}

impl Default for LintSettings {
    fn default() -> Self {
        Self {
            binary: "eslint".to_string(),
            cache_dir: ".codegate/lint-cache".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerSettings {
    pub binary: String,
    /// Configurations gated repo-wide; each runs its own no-emit pass.
    pub configs: Vec<String>,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            binary: "tsc".to_string(),
            configs: vec!["tsconfig.json".to_string()],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadCodeSettings {
    pub binary: String,
}

impl Default for DeadCodeSettings {
    fn default() -> Self {
        Self {
            binary: "knip".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateSettings {
    pub binary: String,
    /// Minimum clone size, in tokens, before a pair is reported.
    pub min_tokens: usize,
}

impl Default for DuplicateSettings {
    fn default() -> Self {
        Self {
            binary: "jscpd".to_string(),
            min_tokens: 70,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub path: String,
    /// Include passing files in the report's result list.
    pub full: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: "codegate-report.json".to_string(),
            full: false,
        }
    }
}

impl Config {
    /// Load from an explicit path, or from `codegate.toml` under the
    /// project root; missing file means defaults.
    pub fn load(project_root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let default = project_root.join(CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config in {}", path.display()))
    }

    pub fn jobs(&self) -> usize {
        if self.analysis.jobs == 0 {
            num_cpus::get()
        } else {
            self.analysis.jobs
        }
    }

    pub fn report_path(&self, project_root: &Path) -> PathBuf {
        let path = Path::new(&self.report.path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            project_root.join(path)
        }
    }
}

/// Commented starter config written by `codegate init`.
pub fn default_config_template() -> &'static str {
    r#"# codegate configuration

[analysis]
# 0 = one worker per CPU
jobs = 0
max_file_lines = 400
# extensions = ["ts", "tsx"]
# exclude = ["**/*.generated.ts"]

[tools]
timeout_secs = 300

[tools.lint]
binary = "eslint"
cache_dir = ".codegate/lint-cache"

[tools.compiler]
binary = "tsc"
configs = ["tsconfig.json"]

[tools.dead_code]
binary = "knip"

[tools.duplicate]
binary = "jscpd"
min_tokens = 70

[report]
path = "codegate-report.json"
full = false
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_config_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path(), None).unwrap();
        assert_eq!(config.analysis.max_file_lines, 400);
        assert_eq!(config.tools.lint.binary, "eslint");
        assert_eq!(config.tools.compiler.configs, vec!["tsconfig.json"]);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[analysis]\nmax_file_lines = 250\n",
        )
        .unwrap();
        let config = Config::load(dir.path(), None).unwrap();
        assert_eq!(config.analysis.max_file_lines, 250);
        assert_eq!(config.tools.duplicate.min_tokens, 70);
    }

    #[test]
    fn template_round_trips_through_the_parser() {
        let config: Config = toml::from_str(default_config_template()).unwrap();
        assert_eq!(config.tools.dead_code.binary, "knip");
        assert!(!config.report.full);
    }

    #[test]
    fn invalid_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "analysis = 3\n").unwrap();
        assert!(Config::load(dir.path(), None).is_err());
    }
}
