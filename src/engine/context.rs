//! Core state for one document run.
//!
//! All numbering decisions depend on document order, so the context is an
//! explicit mutable object threaded through every pass. It is created
//! fresh per document and discarded afterwards; batch builds process
//! independent documents without any shared state.

use std::fmt;

use fxhash::FxHashSet;
use indexmap::IndexMap;

use crate::utils::report::{ProcessReport, ProcessWarning, WarningKind};

/// Render target for the document. Only HTML-family targets get figure
/// lightbox decoration; everything else is left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderTarget {
    #[default]
    Html,
    Other,
}

impl RenderTarget {
    pub fn is_html(&self) -> bool {
        matches!(self, RenderTarget::Html)
    }
}

/// Options for document post-processing.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Render target; gates figure decoration.
    pub target: RenderTarget,

    /// Caption word for figures ("Figure 3")
    pub figure_title: String,

    /// Caption word for tables ("Table 3: ...")
    pub table_title: String,

    /// Caption word for sections ("Section 2.1")
    pub section_title: String,

    /// Caption word for code listings ("Listing 1: ...")
    pub listing_title: String,

    /// Lightbox gallery key shared by all decorated figures
    pub lightbox_group: String,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            target: RenderTarget::Html,
            figure_title: "Figure".to_string(),
            table_title: "Table".to_string(),
            section_title: "Section".to_string(),
            listing_title: "Listing".to_string(),
            lightbox_group: "figures".to_string(),
        }
    }
}

impl ProcessOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for a non-HTML render target (skips figure decoration)
    pub fn plain() -> Self {
        Self {
            target: RenderTarget::Other,
            ..Self::default()
        }
    }
}

/// A number assigned to a document element.
///
/// Figures, tables and listings get bare integers; sections get dotted
/// strings, letter-prefixed inside appendices ("2.1", "A.3").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignedNumber {
    Numeric(u32),
    Sectional(String),
}

impl AssignedNumber {
    pub fn is_sectional(&self) -> bool {
        matches!(self, AssignedNumber::Sectional(_))
    }
}

impl fmt::Display for AssignedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignedNumber::Numeric(n) => write!(f, "{}", n),
            AssignedNumber::Sectional(s) => f.write_str(s),
        }
    }
}

/// A registered cross-reference target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub number: AssignedNumber,
    /// Final anchor id of the element; may differ from the label when the
    /// engine had to disambiguate a collision.
    pub identifier: String,
}

/// Mutable per-document state shared by all passes.
#[derive(Debug)]
pub struct DocumentContext {
    pub options: ProcessOptions,

    // Section numbering state: one counter per heading depth 1..=6.
    section_counters: [u32; 6],
    /// Set once the `\appendix` marker has been seen.
    pub in_appendix: bool,
    appendix_count: u32,
    /// Letter of the appendix currently being scanned, if any.
    pub current_appendix_letter: Option<char>,

    // Independent element counters; never reset by appendix entry.
    figure_count: u32,
    table_count: u32,
    listing_count: u32,

    registry: IndexMap<String, RegistryEntry>,
    issued_ids: FxHashSet<String>,
    warnings: Vec<ProcessWarning>,
}

impl DocumentContext {
    pub fn new(options: ProcessOptions) -> Self {
        Self {
            options,
            section_counters: [0; 6],
            in_appendix: false,
            appendix_count: 0,
            current_appendix_letter: None,
            figure_count: 0,
            table_count: 0,
            listing_count: 0,
            registry: IndexMap::new(),
            issued_ids: FxHashSet::default(),
            warnings: Vec::new(),
        }
    }

    // --- Label registry -----------------------------------------------

    /// Register a label. A label never overwrites an existing entry:
    /// identical re-registration is a no-op (reprocessing an already
    /// processed tree must be stable), a conflicting one is recorded as a
    /// duplicate-label warning and ignored.
    pub fn register(&mut self, label: impl Into<String>, entry: RegistryEntry) {
        let label = label.into();
        match self.registry.get(&label) {
            None => {
                self.registry.insert(label, entry);
            }
            Some(existing) if *existing == entry => {}
            Some(existing) => {
                let message = format!(
                    "label already registered as {} (#{}), ignoring re-registration",
                    existing.number, existing.identifier
                );
                self.warn(WarningKind::DuplicateLabel, Some(label), message);
            }
        }
    }

    pub fn lookup(&self, label: &str) -> Option<&RegistryEntry> {
        self.registry.get(label)
    }

    pub fn registry_len(&self) -> usize {
        self.registry.len()
    }

    /// Claim an identifier for an engine-created element, appending `-2`,
    /// `-3`, … until it no longer collides with one already issued.
    pub fn unique_identifier(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut suffix = 2u32;
        while self.issued_ids.contains(&candidate) {
            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        self.issued_ids.insert(candidate.clone());
        candidate
    }

    // --- Element counters ---------------------------------------------

    pub fn next_figure(&mut self) -> u32 {
        self.figure_count += 1;
        self.figure_count
    }

    pub fn next_table(&mut self) -> u32 {
        self.table_count += 1;
        self.table_count
    }

    pub fn next_listing(&mut self) -> u32 {
        self.listing_count += 1;
        self.listing_count
    }

    // --- Section numbering --------------------------------------------

    /// Assign the next appendix letter (A, B, C, …) for a top-level
    /// heading encountered after the appendix marker, resetting all
    /// deeper-level counters.
    pub fn next_appendix_letter(&mut self) -> char {
        let letter = (b'A' + (self.appendix_count % 26) as u8) as char;
        self.appendix_count += 1;
        self.reset_counters_below(1);
        letter
    }

    /// Record the appendix letter currently in effect during the scan
    /// pass and reset counters at levels 2..=6.
    pub fn set_current_appendix_letter(&mut self, letter: char) {
        self.current_appendix_letter = Some(letter);
        self.reset_counters_below(1);
    }

    /// Advance the counter at `level`, reset all deeper counters, and
    /// build the dotted section number down to that level, prefixed with
    /// the current appendix letter where one is in effect.
    pub fn enter_section(&mut self, level: u8) -> String {
        let idx = (level.clamp(1, 6) - 1) as usize;
        self.section_counters[idx] += 1;
        self.reset_counters_below(level);

        let mut parts: Vec<String> = Vec::with_capacity(idx + 1);
        if let Some(letter) = self.current_appendix_letter {
            if level > 1 {
                parts.push(letter.to_string());
                parts.extend(self.section_counters[1..=idx].iter().map(u32::to_string));
                return parts.join(".");
            }
        }
        parts.extend(self.section_counters[..=idx].iter().map(u32::to_string));
        parts.join(".")
    }

    fn reset_counters_below(&mut self, level: u8) {
        let idx = level.clamp(1, 6) as usize;
        for counter in self.section_counters[idx..].iter_mut() {
            *counter = 0;
        }
    }

    // --- Diagnostics ---------------------------------------------------

    pub fn warn(&mut self, kind: WarningKind, label: Option<String>, message: impl Into<String>) {
        self.warnings.push(ProcessWarning::new(kind, label, message));
    }

    pub fn into_report(self) -> ProcessReport {
        ProcessReport {
            figures: self.figure_count,
            tables: self.table_count,
            listings: self.listing_count,
            labels: self.registry.len(),
            warnings: self.warnings,
        }
    }
}
