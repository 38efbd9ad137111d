//! Utility modules
//!
//! Error types and the per-document processing report.

pub mod error;
pub mod report;

// Re-export commonly used items
pub use error::{FilterError, FilterResult};
pub use report::{ProcessReport, ProcessWarning, WarningKind};
