use super::Heuristic;
use crate::core::{Category, Violation};
use once_cell::sync::Lazy;
use regex::Regex;

/// Flags every `console.*` call; output belongs to the project logger.
pub struct ConsoleScan;

static CONSOLE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bconsole\s*\.\s*(log|info|warn|error|debug|trace|table|dir|group|groupEnd|time|timeEnd|count|assert)\s*\(",
    )
    .unwrap()
});

impl ConsoleScan {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleScan {
    fn default() -> Self {
        Self::new()
    }
}

impl Heuristic for ConsoleScan {
    fn category(&self) -> Category {
        Category::Console
    }

    fn analyze(&self, content: &str) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            for m in CONSOLE_CALL.captures_iter(line) {
                let whole = m.get(0).unwrap();
                let method = m.get(1).unwrap().as_str();
                violations.push(
                    Violation::new(idx + 1, format!("console.{method} call"))
                        .with_column(whole.start() + 1)
                        .with_rule(format!("no-console-{method}"))
                        .with_advice("route output through the project logger"),
                );
            }
        }
        violations
    }
}
