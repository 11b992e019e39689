use super::Heuristic;
use crate::core::{Category, Violation};
use once_cell::sync::Lazy;
use regex::Regex;

/// Comment-policy scan: source is expected to be self-documenting, so
/// every comment line is a violation unless it is a recognized tool
/// directive.
///
/// This is simple state tracking over lines (enter a span on `/*`,
/// stay until `*/`, classify every enclosed line), not a grammar
/// parse. Comment tokens inside string or template literals are an
/// accepted false-positive class.
pub struct CommentPolicy;

/// Tool directives that are allowed to remain in source.
static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(eslint-(disable|enable)|@ts-(check|nocheck|ignore|expect-error)|prettier-ignore|biome-ignore|istanbul ignore|c8 ignore|/\s*<reference)",
    )
    .unwrap()
});

impl CommentPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CommentPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl Heuristic for CommentPolicy {
    fn category(&self) -> Category {
        Category::Comments
    }

    fn analyze(&self, content: &str) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut in_block = false;
        let mut block_allowed = false;

        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;

            if in_block {
                match line.find("*/") {
                    Some(end) => {
                        if !block_allowed && !is_blank_decoration(&line[..end]) {
                            violations.push(block_violation(line_no));
                        }
                        in_block = false;
                    }
                    None => {
                        if !block_allowed && !is_blank_decoration(line) {
                            violations.push(block_violation(line_no));
                        }
                    }
                }
                continue;
            }

            if let Some(start) = find_block_open(line) {
                let after = &line[start + 2..];
                let (span, closed) = match after.find("*/") {
                    Some(end) => (&after[..end], true),
                    None => (after, false),
                };
                let allowed = is_directive(span);
                if closed {
                    if !allowed {
                        violations.push(block_violation(line_no).with_column(start + 1));
                    }
                } else {
                    in_block = true;
                    block_allowed = allowed;
                    if !allowed {
                        violations.push(block_violation(line_no).with_column(start + 1));
                    }
                }
                continue;
            }

            if let Some(start) = find_line_comment(line) {
                let text = &line[start + 2..];
                if !is_directive(text) {
                    violations.push(
                        Violation::new(line_no, "line comment is not allowed")
                            .with_column(start + 1)
                            .with_advice(ADVICE),
                    );
                }
            }
        }

        violations
    }
}

const ADVICE: &str = "make the code self-documenting and remove the comment";

fn block_violation(line: usize) -> Violation {
    Violation::new(line, "block comment is not allowed").with_advice(ADVICE)
}

fn is_directive(text: &str) -> bool {
    let trimmed = text.trim_start_matches(['*', '!', ' ', '\t']);
    DIRECTIVE.is_match(trimmed.trim())
}

fn is_blank_decoration(text: &str) -> bool {
    text.trim().trim_matches('*').trim().is_empty()
}

/// Position of a `//` comment opener, skipping `://` so bare URLs in
/// code do not trip the scan.
fn find_line_comment(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while let Some(pos) = line[i..].find("//") {
        let at = i + pos;
        if at == 0 || bytes[at - 1] != b':' {
            return Some(at);
        }
        i = at + 2;
    }
    None
}

fn find_block_open(line: &str) -> Option<usize> {
    line.find("/*")
}
