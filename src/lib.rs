pub mod analyzers;
pub mod cli;
pub mod concurrency;
pub mod config;
pub mod core;
pub mod io;
pub mod merge;
pub mod pipeline;
pub mod report;
pub mod tools;

pub use crate::core::{
    Categories, Category, CategoryVerdict, FileTask, PerFileResult, Status, Violation,
};

pub use crate::concurrency::Limiter;
pub use crate::config::Config;
pub use crate::core::report::{Report, ReportSummary};
pub use crate::io::ContentCache;
pub use crate::merge::MergeOutcome;
pub use crate::tools::ToolError;
