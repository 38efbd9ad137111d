//! Reporting for degraded processing outcomes.
//!
//! The engine never fails outright: unresolved references stay in the
//! output as literal source text and are recorded here so the outer build
//! can surface them.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    UnresolvedReference,
    DuplicateLabel,
    MalformedEnvironment,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::UnresolvedReference => "unresolved-reference",
            WarningKind::DuplicateLabel => "duplicate-label",
            WarningKind::MalformedEnvironment => "malformed-environment",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessWarning {
    pub kind: WarningKind,
    pub label: Option<String>,
    pub message: String,
}

impl ProcessWarning {
    pub fn new(kind: WarningKind, label: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            label,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ProcessWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref label) = self.label {
            write!(f, "[{}] {}: {}", self.kind.as_str(), label, self.message)
        } else {
            write!(f, "[{}] {}", self.kind.as_str(), self.message)
        }
    }
}

/// Summary of one document run: element counts plus accumulated warnings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessReport {
    pub figures: u32,
    pub tables: u32,
    pub listings: u32,
    pub labels: usize,
    pub warnings: Vec<ProcessWarning>,
}

impl ProcessReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
