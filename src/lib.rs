//! crossdoc turns a parsed academic document tree into a numbered,
//! cross-referenced, renderer-ready tree.
//!
//! The input is the JSON tree a LaTeX-aware document parser emits:
//! headings, figures, tables and raw LaTeX fragments the parser chose not
//! to interpret. [`process_document`] runs the fixed transform pipeline
//! over that tree and returns a [`ProcessReport`] describing what was
//! numbered and which references could not be resolved.
//!
//! ```no_run
//! use crossdoc::{process_json, ProcessOptions};
//!
//! let input = std::fs::read_to_string("paper.json").unwrap();
//! let (output, report) = process_json(&input, ProcessOptions::default()).unwrap();
//! for warning in &report.warnings {
//!     eprintln!("{}", warning);
//! }
//! std::fs::write("paper.out.json", output).unwrap();
//! ```

pub mod engine;
pub mod utils;

pub use crossdoc_ast as ast;

pub use engine::{
    AssignedNumber, DocumentContext, ProcessOptions, RegistryEntry, RenderTarget,
};
pub use utils::error::{FilterError, FilterResult};
pub use utils::report::{ProcessReport, ProcessWarning, WarningKind};

use ast::Document;

/// Run the full pipeline over a document in place and report on it.
pub fn process_document(document: &mut Document, options: ProcessOptions) -> ProcessReport {
    let mut ctx = DocumentContext::new(options);
    engine::run_passes(document, &mut ctx);
    ctx.into_report()
}

/// Process a JSON-serialized document tree, returning the transformed
/// tree as JSON along with the report.
pub fn process_json(input: &str, options: ProcessOptions) -> FilterResult<(String, ProcessReport)> {
    let mut document: Document = serde_json::from_str(input)?;
    let report = process_document(&mut document, options);
    let output = serde_json::to_string(&document)?;
    Ok((output, report))
}
