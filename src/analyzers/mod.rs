//! Per-file heuristic analyzers.
//!
//! Every analyzer is a pure content scan behind the [`Heuristic`]
//! trait: no I/O, no shared state, a violation list out. These are
//! deliberately line/regex heuristics, not parsers; matches inside
//! string and template literals are a known, accepted limitation of
//! the approach. A future per-language parser can slot in behind the
//! same trait without touching the orchestration.

pub mod annotations;
pub mod comments;
pub mod console;
pub mod fallback;
pub mod framework;
pub mod size;

use crate::core::{Category, CategoryVerdict, Violation};
use std::panic::AssertUnwindSafe;

pub trait Heuristic: Send + Sync {
    fn category(&self) -> Category;
    fn analyze(&self, content: &str) -> Vec<Violation>;
}

/// The standard analyzer set, in report order.
pub fn default_analyzers(max_file_lines: usize) -> Vec<Box<dyn Heuristic>> {
    vec![
        Box::new(size::SizeCheck::new(max_file_lines)),
        Box::new(comments::CommentPolicy::new()),
        Box::new(console::ConsoleScan::new()),
        Box::new(fallback::FallbackScan::new()),
        Box::new(framework::FrameworkScan::new()),
        Box::new(annotations::ReturnTypeScan::new()),
    ]
}

/// Run one heuristic behind the degrade-on-fault boundary.
///
/// A panic inside a heuristic converts to an empty-violation pass for
/// that category plus a recorded warning; it never aborts the file's
/// other categories.
pub fn run_heuristic(
    heuristic: &dyn Heuristic,
    content: &str,
) -> (CategoryVerdict, Option<String>) {
    match std::panic::catch_unwind(AssertUnwindSafe(|| heuristic.analyze(content))) {
        Ok(violations) => (CategoryVerdict::Checked(violations), None),
        Err(_) => {
            let warning = format!(
                "{} analyzer failed internally; category degraded to pass",
                heuristic.category()
            );
            log::warn!("{warning}");
            (CategoryVerdict::passed(), Some(warning))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Status;

    struct Exploding;

    impl Heuristic for Exploding {
        fn category(&self) -> Category {
            Category::Console
        }

        fn analyze(&self, _content: &str) -> Vec<Violation> {
            panic!("internal heuristic bug");
        }
    }

    #[test]
    fn panicking_heuristic_degrades_to_pass() {
        let (verdict, warning) = run_heuristic(&Exploding, "anything");
        assert_eq!(verdict.status(), Some(Status::Pass));
        assert!(verdict.violations().is_empty());
        assert!(warning.unwrap().contains("degraded"));
    }

    #[test]
    fn default_set_covers_six_categories() {
        let analyzers = default_analyzers(600);
        let mut categories: Vec<Category> = analyzers.iter().map(|a| a.category()).collect();
        categories.sort();
        categories.dedup();
        assert_eq!(categories.len(), 6);
    }
}
