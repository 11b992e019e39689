pub mod report;
pub mod tools;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One file scheduled for analysis: its absolute path plus the
/// repo-relative identity used in every report artifact.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileTask {
    pub path: PathBuf,
    pub rel_path: String,
}

impl FileTask {
    pub fn new(root: &Path, path: PathBuf) -> Self {
        let rel_path = pathdiff::diff_paths(&path, root)
            .unwrap_or_else(|| path.clone())
            .to_string_lossy()
            .replace('\\', "/");
        Self { path, rel_path }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
}

/// A single finding within one category of one file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violation {
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// For duplicate segments: the partner file's relative path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_file: Option<String>,
}

impl Violation {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            message: message.into(),
            advice: None,
            rule: None,
            symbol: None,
            other_file: None,
        }
    }

    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    pub fn with_advice(mut self, advice: impl Into<String>) -> Self {
        self.advice = Some(advice.into());
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn with_other_file(mut self, other_file: impl Into<String>) -> Self {
        self.other_file = Some(other_file.into());
        self
    }
}

/// Verdict for one category of one file.
///
/// `Absent` means the category was never evaluated for this file (tool
/// skipped, category not applicable). A checked category derives its
/// status from its violation list, so status and data cannot diverge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CategoryVerdict {
    #[default]
    Absent,
    Checked(Vec<Violation>),
}

impl CategoryVerdict {
    pub fn passed() -> Self {
        CategoryVerdict::Checked(Vec::new())
    }

    pub fn status(&self) -> Option<Status> {
        match self {
            CategoryVerdict::Absent => None,
            CategoryVerdict::Checked(violations) => Some(if violations.is_empty() {
                Status::Pass
            } else {
                Status::Fail
            }),
        }
    }

    pub fn is_fail(&self) -> bool {
        self.status() == Some(Status::Fail)
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            CategoryVerdict::Absent => &[],
            CategoryVerdict::Checked(violations) => violations,
        }
    }

    /// Append violations, promoting `Absent` to `Checked`.
    pub fn record(&mut self, mut violations: Vec<Violation>) {
        match self {
            CategoryVerdict::Absent => *self = CategoryVerdict::Checked(violations),
            CategoryVerdict::Checked(existing) => existing.append(&mut violations),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Size,
    Comments,
    Console,
    Lint,
    Compiler,
    Fallback,
    Framework,
    Annotations,
    DeadCode,
    Duplicate,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Size,
        Category::Comments,
        Category::Console,
        Category::Lint,
        Category::Compiler,
        Category::Fallback,
        Category::Framework,
        Category::Annotations,
        Category::DeadCode,
        Category::Duplicate,
    ];

    pub fn as_str(&self) -> &'static str {
        static NAMES: &[(Category, &str)] = &[
            (Category::Size, "size"),
            (Category::Comments, "comments"),
            (Category::Console, "console"),
            (Category::Lint, "lint"),
            (Category::Compiler, "compiler"),
            (Category::Fallback, "fallback-data"),
            (Category::Framework, "framework-usage"),
            (Category::Annotations, "return-types"),
            (Category::DeadCode, "dead-code"),
            (Category::Duplicate, "duplicate-code"),
        ];

        NAMES
            .iter()
            .find(|(c, _)| c == self)
            .map(|(_, s)| *s)
            .unwrap_or("unknown")
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Category::ALL
            .iter()
            .find(|c| c.as_str() == name)
            .copied()
            .ok_or_else(|| serde::de::Error::custom(format!("unknown category: {name}")))
    }
}

/// Per-category verdicts for one file. Named fields keep the handling
/// exhaustive: adding a category is a compile error everywhere it is
/// not handled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Categories {
    pub size: CategoryVerdict,
    pub comments: CategoryVerdict,
    pub console: CategoryVerdict,
    pub lint: CategoryVerdict,
    pub compiler: CategoryVerdict,
    pub fallback: CategoryVerdict,
    pub framework: CategoryVerdict,
    pub annotations: CategoryVerdict,
    pub dead_code: CategoryVerdict,
    pub duplicate: CategoryVerdict,
}

impl Categories {
    pub fn get(&self, category: Category) -> &CategoryVerdict {
        match category {
            Category::Size => &self.size,
            Category::Comments => &self.comments,
            Category::Console => &self.console,
            Category::Lint => &self.lint,
            Category::Compiler => &self.compiler,
            Category::Fallback => &self.fallback,
            Category::Framework => &self.framework,
            Category::Annotations => &self.annotations,
            Category::DeadCode => &self.dead_code,
            Category::Duplicate => &self.duplicate,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut CategoryVerdict {
        match category {
            Category::Size => &mut self.size,
            Category::Comments => &mut self.comments,
            Category::Console => &mut self.console,
            Category::Lint => &mut self.lint,
            Category::Compiler => &mut self.compiler,
            Category::Fallback => &mut self.fallback,
            Category::Framework => &mut self.framework,
            Category::Annotations => &mut self.annotations,
            Category::DeadCode => &mut self.dead_code,
            Category::Duplicate => &mut self.duplicate,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &CategoryVerdict)> + '_ {
        Category::ALL.iter().map(move |c| (*c, self.get(*c)))
    }
}

/// The complete verdict for one analyzed file.
///
/// Owned exclusively by the worker analyzing the file, then handed to
/// the single-threaded merge phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PerFileResult {
    pub task: FileTask,
    pub categories: Categories,
}

impl PerFileResult {
    pub fn new(task: FileTask) -> Self {
        Self {
            task,
            categories: Categories::default(),
        }
    }

    pub fn failing_categories(&self) -> Vec<Category> {
        self.categories
            .iter()
            .filter(|(_, verdict)| verdict.is_fail())
            .map(|(category, _)| category)
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.categories.iter().any(|(_, verdict)| verdict.is_fail())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn verdict_status_derives_from_violations() {
        assert_eq!(CategoryVerdict::Absent.status(), None);
        assert_eq!(CategoryVerdict::passed().status(), Some(Status::Pass));
        let failed = CategoryVerdict::Checked(vec![Violation::new(3, "boom")]);
        assert_eq!(failed.status(), Some(Status::Fail));
        assert!(failed.is_fail());
    }

    #[test]
    fn record_promotes_absent() {
        let mut verdict = CategoryVerdict::Absent;
        verdict.record(vec![Violation::new(1, "x")]);
        assert_eq!(verdict.violations().len(), 1);
        verdict.record(vec![Violation::new(2, "y")]);
        assert_eq!(verdict.violations().len(), 2);
    }

    #[test]
    fn file_task_rel_path_is_forward_slashed() {
        let root = PathBuf::from("/repo");
        let task = FileTask::new(&root, PathBuf::from("/repo/src/app.ts"));
        assert_eq!(task.rel_path, "src/app.ts");
    }

    #[test]
    fn failing_categories_reflect_verdicts() {
        let task = FileTask::new(Path::new("/r"), PathBuf::from("/r/a.ts"));
        let mut result = PerFileResult::new(task);
        assert!(!result.has_failures());

        result.categories.console = CategoryVerdict::Checked(vec![Violation::new(10, "console")]);
        result.categories.size = CategoryVerdict::passed();
        assert_eq!(result.failing_categories(), vec![Category::Console]);
    }

    #[test]
    fn all_categories_have_distinct_names() {
        let mut names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Category::ALL.len());
    }
}
