use super::Heuristic;
use crate::core::{Category, Violation};

/// Flags files that exceed the configured line budget.
pub struct SizeCheck {
    max_lines: usize,
}

impl SizeCheck {
    pub fn new(max_lines: usize) -> Self {
        Self { max_lines }
    }
}

impl Heuristic for SizeCheck {
    fn category(&self) -> Category {
        Category::Size
    }

    fn analyze(&self, content: &str) -> Vec<Violation> {
        let lines = content.lines().count();
        if lines <= self.max_lines {
            return Vec::new();
        }
        vec![Violation::new(
            1,
            format!("file has {lines} lines (limit {})", self.max_lines),
        )
        .with_advice("split the file along responsibility boundaries")]
    }
}
