use super::Heuristic;
use crate::core::{Category, Violation};
use once_cell::sync::Lazy;
use regex::Regex;

/// Framework-usage heuristic: inside files that import a UI framework,
/// direct DOM access bypasses the framework's rendering model and is
/// flagged. Files without a framework import are left alone.
pub struct FrameworkScan;

static FRAMEWORK_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"from\s+['"](react|react-dom|vue|svelte|preact|solid-js)['"]"#).unwrap()
});

static DOM_ACCESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(document|window)\s*\.\s*(getElementById|getElementsBy\w+|querySelector(All)?|createElement|addEventListener|removeEventListener)\b",
    )
    .unwrap()
});

static INNER_HTML: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.innerHTML\s*=").unwrap());

impl FrameworkScan {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FrameworkScan {
    fn default() -> Self {
        Self::new()
    }
}

impl Heuristic for FrameworkScan {
    fn category(&self) -> Category {
        Category::Framework
    }

    fn analyze(&self, content: &str) -> Vec<Violation> {
        if !FRAMEWORK_IMPORT.is_match(content) {
            return Vec::new();
        }

        let mut violations = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if let Some(m) = DOM_ACCESS.find(line) {
                violations.push(
                    Violation::new(idx + 1, format!("direct DOM access: {}", m.as_str()))
                        .with_column(m.start() + 1)
                        .with_rule("no-direct-dom")
                        .with_advice("use the framework's refs/effects instead of raw DOM calls"),
                );
            } else if let Some(m) = INNER_HTML.find(line) {
                violations.push(
                    Violation::new(idx + 1, "innerHTML assignment bypasses the framework renderer")
                        .with_column(m.start() + 1)
                        .with_rule("no-inner-html")
                        .with_advice("render through the framework; never write markup directly"),
                );
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn dom_access_in_framework_file_is_flagged() {
        let scan = FrameworkScan::new();
        let content = indoc! {r#"
            import { useEffect } from 'react';

            export function Widget() {
              const el = document.getElementById('root');
              return el;
            }
        "#};
        let violations = scan.analyze(content);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].line, 4);
        assert!(violations[0].message.contains("document"));
    }

    #[test]
    fn non_framework_file_is_ignored() {
        let scan = FrameworkScan::new();
        let content = "const el = document.querySelector('.x');\n";
        assert!(scan.analyze(content).is_empty());
    }

    #[test]
    fn inner_html_is_flagged() {
        let scan = FrameworkScan::new();
        let content = indoc! {r#"
            import React from 'react';
            node.innerHTML = markup;
        "#};
        let violations = scan.analyze(content);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule.as_deref(), Some("no-inner-html"));
    }
}
