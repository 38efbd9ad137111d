//! The document post-processing engine.
//!
//! Transforms run as a fixed pipeline over the document tree:
//!
//! 1. raw fragment interpretation (appendix marker, listing environments)
//! 2. numbering scan (sections, figures, tables, label registry)
//! 3. cross-reference resolution
//! 4. empty internal link filling
//! 5. figure lightbox decoration (HTML targets only)
//! 6. table caption annotation
//!
//! Later passes depend on registry state built by earlier ones, so the
//! order is not configurable.

pub mod context;
pub mod decorate;
pub mod numbering;
pub mod raw;
pub mod refs;
pub mod scan;

pub use context::{
    AssignedNumber, DocumentContext, ProcessOptions, RegistryEntry, RenderTarget,
};

use crossdoc_ast::Document;

/// Run the full pipeline over a document, mutating it in place.
pub fn run_passes(document: &mut Document, ctx: &mut DocumentContext) {
    raw::interpret(document, ctx);
    numbering::scan(document, ctx);
    refs::resolve(document, ctx);
    refs::fill_links(document, ctx);
    decorate::figures(document, ctx);
    decorate::tables(document, ctx);
}
