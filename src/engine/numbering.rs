//! Numbering scan (pass 2).
//!
//! Visits every heading, figure and table in document order. Headings get
//! hierarchical dotted numbers (letter-prefixed inside appendices), a
//! `data-number` attribute and a leading number span; figures and tables
//! advance their own global counters. Every numbered element with a
//! non-empty identifier lands in the label registry.

use crossdoc_ast::{Attr, Block, Document, Inline, TableRow};

use super::context::{AssignedNumber, DocumentContext, RegistryEntry};

pub fn scan(document: &mut Document, ctx: &mut DocumentContext) {
    scan_blocks(&mut document.blocks, ctx);
}

fn scan_blocks(blocks: &mut [Block], ctx: &mut DocumentContext) {
    for block in blocks.iter_mut() {
        match block {
            Block::Heading {
                level,
                attr,
                content,
            } => scan_heading(*level, attr, content, ctx),
            Block::Figure { attr, blocks, .. } => {
                if !attr.identifier.is_empty() {
                    let number = ctx.next_figure();
                    ctx.register(
                        attr.identifier.clone(),
                        RegistryEntry {
                            number: AssignedNumber::Numeric(number),
                            identifier: attr.identifier.clone(),
                        },
                    );
                }
                scan_blocks(blocks, ctx);
            }
            Block::Table { attr, rows, .. } => {
                if !attr.identifier.is_empty() {
                    register_table(attr.identifier.clone(), ctx);
                }
                scan_rows(rows, ctx);
            }
            Block::Div { attr, blocks } => {
                let holds_table = blocks.iter().any(|b| matches!(b, Block::Table { .. }));
                if !attr.identifier.is_empty() && holds_table {
                    // The container claims the table number; its direct
                    // table children must not be counted twice.
                    register_table(attr.identifier.clone(), ctx);
                    for child in blocks.iter_mut() {
                        match child {
                            Block::Table { rows, .. } => scan_rows(rows, ctx),
                            other => scan_blocks(std::slice::from_mut(other), ctx),
                        }
                    }
                } else {
                    scan_blocks(blocks, ctx);
                }
            }
            Block::BlockQuote(blocks) => scan_blocks(blocks, ctx),
            Block::BulletList(items) | Block::OrderedList(items) => {
                for item in items.iter_mut() {
                    scan_blocks(item, ctx);
                }
            }
            _ => {}
        }
    }
}

fn scan_rows(rows: &mut [TableRow], ctx: &mut DocumentContext) {
    for row in rows.iter_mut() {
        for cell in row.cells.iter_mut() {
            scan_blocks(&mut cell.blocks, ctx);
        }
    }
}

fn register_table(identifier: String, ctx: &mut DocumentContext) {
    let number = ctx.next_table();
    ctx.register(
        identifier.clone(),
        RegistryEntry {
            number: AssignedNumber::Numeric(number),
            identifier,
        },
    );
}

fn scan_heading(level: u8, attr: &mut Attr, content: &mut Vec<Inline>, ctx: &mut DocumentContext) {
    let explicit = attr.get("data-number").map(str::to_string);

    // Truly unnumbered: an unnumbered-class heading with no explicit
    // number is never numbered and never registered.
    if attr.has_class("unnumbered") && explicit.is_none() {
        return;
    }

    let number = match explicit {
        Some(number) => {
            if level == 1 {
                if let Some(letter) = appendix_letter(&number) {
                    ctx.set_current_appendix_letter(letter);
                }
            }
            number
        }
        None if level == 1 && ctx.current_appendix_letter.is_some() => {
            // Should not occur when the boundary tracker ran: a second
            // top-level appendix heading without an explicit letter.
            // Reuse the current letter.
            ctx.current_appendix_letter.unwrap_or('A').to_string()
        }
        None => ctx.enter_section(level),
    };

    attr.set("data-number", number.clone());
    if !starts_with_number_span(content) {
        content.insert(0, Inline::Space);
        content.insert(0, number_span(&number));
    }

    if !attr.identifier.is_empty() {
        ctx.register(
            attr.identifier.clone(),
            RegistryEntry {
                number: AssignedNumber::Sectional(number),
                identifier: attr.identifier.clone(),
            },
        );
    }
}

/// A single uppercase letter is an appendix letter from the boundary
/// tracker; anything else is an ordinary explicit number.
fn appendix_letter(number: &str) -> Option<char> {
    let mut chars = number.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => Some(c),
        _ => None,
    }
}

fn number_span(number: &str) -> Inline {
    let mut attr = Attr::default();
    attr.classes.push("section-number".to_string());
    Inline::Span {
        attr,
        content: vec![Inline::str(number)],
    }
}

fn starts_with_number_span(content: &[Inline]) -> bool {
    matches!(
        content.first(),
        Some(Inline::Span { attr, .. }) if attr.has_class("section-number")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::ProcessOptions;
    use crossdoc_ast::Caption;
    use pretty_assertions::assert_eq;

    fn ctx() -> DocumentContext {
        DocumentContext::new(ProcessOptions::default())
    }

    fn heading(level: u8, id: &str, title: &str) -> Block {
        Block::Heading {
            level,
            attr: Attr::with_id(id),
            content: vec![Inline::str(title)],
        }
    }

    fn number_of(block: &Block) -> Option<&str> {
        match block {
            Block::Heading { attr, .. } => attr.get("data-number"),
            _ => None,
        }
    }

    #[test]
    fn test_hierarchical_numbering() {
        let mut doc = Document::new(vec![
            heading(1, "sec:a", "A"),
            heading(2, "sec:a1", "A1"),
            heading(3, "sec:a11", "A11"),
            heading(2, "sec:a2", "A2"),
            heading(1, "sec:b", "B"),
            heading(2, "sec:b1", "B1"),
        ]);
        let mut ctx = ctx();
        scan(&mut doc, &mut ctx);

        let numbers: Vec<_> = doc.blocks.iter().filter_map(number_of).collect();
        assert_eq!(numbers, vec!["1", "1.1", "1.1.1", "1.2", "2", "2.1"]);
    }

    #[test]
    fn test_appendix_heading_keeps_letter_and_numbers_children() {
        let mut lettered = heading(1, "appdx:data", "Data Sources");
        if let Block::Heading { attr, .. } = &mut lettered {
            attr.set("data-number", "A");
        }
        let mut doc = Document::new(vec![
            heading(1, "sec:intro", "Introduction"),
            lettered,
            heading(2, "appdx:collection", "Collection"),
        ]);
        let mut ctx = ctx();
        scan(&mut doc, &mut ctx);

        let numbers: Vec<_> = doc.blocks.iter().filter_map(number_of).collect();
        assert_eq!(numbers, vec!["1", "A", "A.1"]);

        let entry = ctx.lookup("appdx:data").unwrap();
        assert_eq!(entry.number, AssignedNumber::Sectional("A".to_string()));
        let entry = ctx.lookup("appdx:collection").unwrap();
        assert_eq!(entry.number, AssignedNumber::Sectional("A.1".to_string()));
    }

    #[test]
    fn test_level_one_fallback_reuses_current_letter() {
        let mut lettered = heading(1, "appdx:a", "First");
        if let Block::Heading { attr, .. } = &mut lettered {
            attr.set("data-number", "A");
        }
        // A second top-level heading that somehow missed the tracker.
        let mut doc = Document::new(vec![lettered, heading(1, "appdx:b", "Stray")]);
        let mut ctx = ctx();
        scan(&mut doc, &mut ctx);

        assert_eq!(number_of(&doc.blocks[1]), Some("A"));
    }

    #[test]
    fn test_unnumbered_heading_skipped() {
        let mut unnumbered = heading(1, "refs", "References");
        if let Block::Heading { attr, .. } = &mut unnumbered {
            attr.classes.push("unnumbered".to_string());
        }
        let mut doc = Document::new(vec![unnumbered, heading(1, "sec:x", "X")]);
        let mut ctx = ctx();
        scan(&mut doc, &mut ctx);

        assert_eq!(number_of(&doc.blocks[0]), None);
        assert_eq!(number_of(&doc.blocks[1]), Some("1"));
        assert!(ctx.lookup("refs").is_none());
    }

    #[test]
    fn test_number_span_not_duplicated_on_rescan() {
        let mut doc = Document::new(vec![heading(1, "sec:a", "A")]);
        let mut ctx = ctx();
        scan(&mut doc, &mut ctx);
        // Second full run over the already numbered tree.
        let mut ctx2 = DocumentContext::new(ProcessOptions::default());
        scan(&mut doc, &mut ctx2);

        match &doc.blocks[0] {
            Block::Heading { content, .. } => {
                let spans = content
                    .iter()
                    .filter(|i| matches!(i, Inline::Span { attr, .. } if attr.has_class("section-number")))
                    .count();
                assert_eq!(spans, 1);
                assert_eq!(crossdoc_ast::inlines_text(content), "1 A");
            }
            other => panic!("expected heading, got {:?}", other),
        }
    }

    #[test]
    fn test_figures_and_labeled_table_containers_counted_in_order() {
        let figure = |id: &str| Block::Figure {
            attr: Attr::with_id(id),
            caption: Caption::default(),
            blocks: Vec::new(),
        };
        let table_div = |id: &str| Block::Div {
            attr: Attr::with_id(id),
            blocks: vec![Block::Table {
                attr: Attr::default(),
                caption: Caption::default(),
                rows: Vec::new(),
            }],
        };
        let mut doc = Document::new(vec![
            figure("fig:one"),
            table_div("tab:a"),
            figure("fig:two"),
            table_div("tab:b"),
            table_div("tab:results"),
        ]);
        let mut ctx = ctx();
        scan(&mut doc, &mut ctx);

        assert_eq!(
            ctx.lookup("fig:two").unwrap().number,
            AssignedNumber::Numeric(2)
        );
        assert_eq!(
            ctx.lookup("tab:results").unwrap().number,
            AssignedNumber::Numeric(3)
        );
    }

    #[test]
    fn test_unlabeled_figure_not_counted() {
        let mut doc = Document::new(vec![
            Block::Figure {
                attr: Attr::default(),
                caption: Caption::default(),
                blocks: Vec::new(),
            },
            Block::Figure {
                attr: Attr::with_id("fig:real"),
                caption: Caption::default(),
                blocks: Vec::new(),
            },
        ]);
        let mut ctx = ctx();
        scan(&mut doc, &mut ctx);
        assert_eq!(
            ctx.lookup("fig:real").unwrap().number,
            AssignedNumber::Numeric(1)
        );
    }
}
