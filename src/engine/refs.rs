//! Cross-reference resolution (pass 3) and link filling (pass 4).
//!
//! Pass 3 rewrites `\autoref{label}` and `\ref{label}` commands found in
//! raw inline fragments into anchors pointing at the registered target,
//! and unwraps the `\textzh{...}` wrapper. Unknown labels are left as
//! literal source text: a broken reference stays visible in the output
//! instead of disappearing. Pass 4 gives empty intra-document links their
//! target's number as visible text.

use crossdoc_ast::{is_latex_format, Attr, Block, Document, Inline, Target};
use phf::phf_map;

use super::context::{DocumentContext, ProcessOptions, RegistryEntry};
use super::scan;
use crate::utils::report::WarningKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefKind {
    Figure,
    Table,
    Section,
    Listing,
}

/// Label prefix convention for `\autoref` display text.
static REF_KIND_BY_PREFIX: phf::Map<&'static str, RefKind> = phf_map! {
    "fig" => RefKind::Figure,
    "tab" => RefKind::Table,
    "sec" => RefKind::Section,
    "appdx" => RefKind::Section,
};

pub fn resolve(document: &mut Document, ctx: &mut DocumentContext) {
    resolve_blocks(&mut document.blocks, ctx);
}

fn resolve_blocks(blocks: &mut [Block], ctx: &mut DocumentContext) {
    for block in blocks.iter_mut() {
        match block {
            Block::Paragraph(inlines) | Block::Plain(inlines) => {
                resolve_inlines(inlines, ctx);
            }
            Block::Heading { content, .. } => resolve_inlines(content, ctx),
            Block::Div { blocks, .. } | Block::BlockQuote(blocks) => {
                resolve_blocks(blocks, ctx);
            }
            Block::Figure {
                caption, blocks, ..
            } => {
                resolve_blocks(&mut caption.long, ctx);
                resolve_blocks(blocks, ctx);
            }
            Block::Table { caption, rows, .. } => {
                resolve_blocks(&mut caption.long, ctx);
                for row in rows.iter_mut() {
                    for cell in row.cells.iter_mut() {
                        resolve_blocks(&mut cell.blocks, ctx);
                    }
                }
            }
            Block::BulletList(items) | Block::OrderedList(items) => {
                for item in items.iter_mut() {
                    resolve_blocks(item, ctx);
                }
            }
            _ => {}
        }
    }
}

fn resolve_inlines(inlines: &mut Vec<Inline>, ctx: &mut DocumentContext) {
    let drained = std::mem::take(inlines);
    let mut out = Vec::with_capacity(drained.len());
    for inline in drained {
        match inline {
            Inline::RawInline { format, text } if is_latex_format(&format) => {
                match resolve_fragment(&text, ctx) {
                    Some(parts) => out.extend(parts),
                    None => out.push(Inline::RawInline { format, text }),
                }
            }
            Inline::Emph(mut content) => {
                resolve_inlines(&mut content, ctx);
                out.push(Inline::Emph(content));
            }
            Inline::Strong(mut content) => {
                resolve_inlines(&mut content, ctx);
                out.push(Inline::Strong(content));
            }
            Inline::Span { attr, mut content } => {
                resolve_inlines(&mut content, ctx);
                out.push(Inline::Span { attr, content });
            }
            Inline::Link {
                attr,
                mut content,
                target,
            } => {
                resolve_inlines(&mut content, ctx);
                out.push(Inline::Link {
                    attr,
                    content,
                    target,
                });
            }
            other => out.push(other),
        }
    }
    *inlines = out;
}

/// Resolve the reference commands in one raw fragment. Returns `None`
/// when nothing changed, so the fragment stays byte-for-byte intact.
fn resolve_fragment(text: &str, ctx: &mut DocumentContext) -> Option<Vec<Inline>> {
    let unwrapped = scan::unwrap_command(text, "textzh");
    let unwrap_changed = unwrapped != text;

    let mut out: Vec<Inline> = Vec::new();
    let mut resolved_any = false;
    let mut literal_start = 0usize;
    let mut i = 0usize;

    while i < unwrapped.len() {
        if unwrapped.as_bytes()[i] == b'\\' {
            if let Some((auto, label, end)) = match_reference(&unwrapped, i) {
                match ctx.lookup(&label).cloned() {
                    Some(entry) => {
                        push_literal(
                            &mut out,
                            &unwrapped[literal_start..i],
                            unwrap_changed,
                        );
                        out.push(reference_link(auto, &label, &entry, &ctx.options));
                        resolved_any = true;
                        literal_start = end;
                    }
                    None => {
                        let command = if auto { "autoref" } else { "ref" };
                        ctx.warn(
                            WarningKind::UnresolvedReference,
                            Some(label),
                            format!("no target registered for \\{} command", command),
                        );
                    }
                }
                i = end;
                continue;
            }
        }
        i += unwrapped[i..].chars().next().map_or(1, char::len_utf8);
    }

    if !resolved_any && !unwrap_changed {
        return None;
    }
    push_literal(&mut out, &unwrapped[literal_start..], unwrap_changed);
    Some(out)
}

/// Match `\autoref{label}` or `\ref{label}` at byte offset `i`.
/// Returns (is_autoref, label, offset past the closing brace).
fn match_reference(text: &str, i: usize) -> Option<(bool, String, usize)> {
    let (auto, cmd_len) = if text[i..].starts_with("\\autoref") {
        (true, "\\autoref".len())
    } else if text[i..].starts_with("\\ref") {
        (false, "\\ref".len())
    } else {
        return None;
    };
    let after = i + cmd_len;
    // Reject longer command names (\reference, \autorefstyle, ...)
    if text[after..]
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic())
    {
        return None;
    }
    let brace = after + text[after..].len() - text[after..].trim_start().len();
    let (label, end) = scan::extract_braced(text, brace)?;
    let label = label.trim().to_string();
    if label.is_empty() {
        return None;
    }
    Some((auto, label, end))
}

fn reference_link(
    auto: bool,
    label: &str,
    entry: &RegistryEntry,
    options: &ProcessOptions,
) -> Inline {
    let display = if auto {
        format!("{} {}", type_word(label, entry, options), entry.number)
    } else {
        entry.number.to_string()
    };
    Inline::Link {
        attr: Attr::default(),
        content: vec![Inline::str(display)],
        target: Target::url(format!("#{}", entry.identifier)),
    }
}

/// Pick the display word for an auto-labeled reference: label prefix
/// convention first, then sectional numbers, then the listing default.
fn type_word<'a>(label: &str, entry: &RegistryEntry, options: &'a ProcessOptions) -> &'a str {
    let prefix = label.split(':').next().unwrap_or("");
    let kind = REF_KIND_BY_PREFIX.get(prefix).copied().unwrap_or({
        if entry.number.is_sectional() {
            RefKind::Section
        } else {
            RefKind::Listing
        }
    });
    match kind {
        RefKind::Figure => &options.figure_title,
        RefKind::Table => &options.table_title,
        RefKind::Section => &options.section_title,
        RefKind::Listing => &options.listing_title,
    }
}

fn push_literal(out: &mut Vec<Inline>, text: &str, as_plain_text: bool) {
    if text.is_empty() {
        return;
    }
    if as_plain_text {
        out.push(Inline::str(text));
    } else {
        out.push(Inline::RawInline {
            format: "latex".to_string(),
            text: text.to_string(),
        });
    }
}

/// Pass 4: every hyperlink whose target is a registered `#label` and
/// whose visible text is empty gets the resolved number as text.
pub fn fill_links(document: &mut Document, ctx: &DocumentContext) {
    fill_blocks(&mut document.blocks, ctx);
}

fn fill_blocks(blocks: &mut [Block], ctx: &DocumentContext) {
    for block in blocks.iter_mut() {
        match block {
            Block::Paragraph(inlines) | Block::Plain(inlines) => fill_inlines(inlines, ctx),
            Block::Heading { content, .. } => fill_inlines(content, ctx),
            Block::Div { blocks, .. } | Block::BlockQuote(blocks) => fill_blocks(blocks, ctx),
            Block::Figure {
                caption, blocks, ..
            } => {
                fill_blocks(&mut caption.long, ctx);
                fill_blocks(blocks, ctx);
            }
            Block::Table { caption, rows, .. } => {
                fill_blocks(&mut caption.long, ctx);
                for row in rows.iter_mut() {
                    for cell in row.cells.iter_mut() {
                        fill_blocks(&mut cell.blocks, ctx);
                    }
                }
            }
            Block::BulletList(items) | Block::OrderedList(items) => {
                for item in items.iter_mut() {
                    fill_blocks(item, ctx);
                }
            }
            _ => {}
        }
    }
}

fn fill_inlines(inlines: &mut [Inline], ctx: &DocumentContext) {
    for inline in inlines.iter_mut() {
        match inline {
            Inline::Link {
                content, target, ..
            } => {
                if content.is_empty() {
                    if let Some(label) = target.url.strip_prefix('#') {
                        if let Some(entry) = ctx.lookup(label) {
                            content.push(Inline::str(entry.number.to_string()));
                        }
                    }
                }
                fill_inlines(content, ctx);
            }
            Inline::Emph(content) | Inline::Strong(content) => fill_inlines(content, ctx),
            Inline::Span { content, .. } => fill_inlines(content, ctx),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::AssignedNumber;
    use pretty_assertions::assert_eq;

    fn ctx_with(entries: &[(&str, AssignedNumber, &str)]) -> DocumentContext {
        let mut ctx = DocumentContext::new(ProcessOptions::default());
        for (label, number, id) in entries {
            ctx.register(
                label.to_string(),
                RegistryEntry {
                    number: number.clone(),
                    identifier: id.to_string(),
                },
            );
        }
        ctx
    }

    fn raw_inline(text: &str) -> Inline {
        Inline::RawInline {
            format: "latex".to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_autoref_display_by_prefix() {
        let mut ctx = ctx_with(&[
            ("fig:overview", AssignedNumber::Numeric(2), "fig:overview"),
            ("tab:results", AssignedNumber::Numeric(3), "tab:results"),
            (
                "sec:method",
                AssignedNumber::Sectional("2.1".to_string()),
                "sec:method",
            ),
            ("lst:ex", AssignedNumber::Numeric(1), "lst:ex"),
        ]);

        let cases = [
            ("\\autoref{fig:overview}", "Figure 2", "#fig:overview"),
            ("\\autoref{tab:results}", "Table 3", "#tab:results"),
            ("\\autoref{sec:method}", "Section 2.1", "#sec:method"),
            ("\\autoref{lst:ex}", "Listing 1", "#lst:ex"),
        ];
        for (source, display, url) in cases {
            let parts = resolve_fragment(source, &mut ctx).expect("should resolve");
            assert_eq!(parts.len(), 1, "fragment {:?}", source);
            match &parts[0] {
                Inline::Link {
                    content, target, ..
                } => {
                    assert_eq!(crossdoc_ast::inlines_text(content), display);
                    assert_eq!(target.url, url);
                }
                other => panic!("expected link, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_sectional_number_without_known_prefix_reads_section() {
        let mut ctx = ctx_with(&[(
            "appendix-data",
            AssignedNumber::Sectional("A".to_string()),
            "appendix-data",
        )]);
        let parts = resolve_fragment("\\autoref{appendix-data}", &mut ctx).unwrap();
        assert_eq!(crossdoc_ast::inlines_text(&parts), "Section A");
    }

    #[test]
    fn test_bare_ref_resolves_to_number_only() {
        let mut ctx = ctx_with(&[("fig:overview", AssignedNumber::Numeric(2), "fig:overview")]);
        let parts = resolve_fragment("see \\ref{fig:overview} above", &mut ctx).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(crossdoc_ast::inlines_text(&parts[1..2]), "2");
        match &parts[0] {
            Inline::RawInline { text, .. } => assert_eq!(text, "see "),
            other => panic!("expected preserved raw prefix, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_label_left_untouched() {
        let mut ctx = ctx_with(&[]);
        assert_eq!(resolve_fragment("\\ref{unknown}", &mut ctx), None);
        assert_eq!(resolve_fragment("\\autoref{unknown}", &mut ctx), None);

        let report = ctx.into_report();
        assert_eq!(report.warnings.len(), 2);
        assert!(report
            .warnings
            .iter()
            .all(|w| w.kind == WarningKind::UnresolvedReference));
    }

    #[test]
    fn test_textzh_unwrapped() {
        let mut ctx = ctx_with(&[]);
        let parts = resolve_fragment("\\textzh{中文文本}", &mut ctx).unwrap();
        assert_eq!(parts, vec![Inline::str("中文文本")]);
    }

    #[test]
    fn test_reference_inside_textzh_resolves() {
        let mut ctx = ctx_with(&[("fig:a", AssignedNumber::Numeric(1), "fig:a")]);
        let parts = resolve_fragment("\\textzh{见\\ref{fig:a}}", &mut ctx).unwrap();
        assert_eq!(crossdoc_ast::inlines_text(&parts), "见1");
    }

    #[test]
    fn test_longer_command_names_not_matched() {
        let mut ctx = ctx_with(&[("x", AssignedNumber::Numeric(1), "x")]);
        assert_eq!(resolve_fragment("\\reflection{x}", &mut ctx), None);
    }

    #[test]
    fn test_fill_links_sets_number_text() {
        let ctx = ctx_with(&[(
            "sec:method",
            AssignedNumber::Sectional("2.1".to_string()),
            "sec:method",
        )]);
        let mut doc = Document::new(vec![Block::Paragraph(vec![
            Inline::Link {
                attr: Attr::default(),
                content: Vec::new(),
                target: Target::url("#sec:method"),
            },
            Inline::Link {
                attr: Attr::default(),
                content: vec![Inline::str("existing")],
                target: Target::url("#sec:method"),
            },
            Inline::Link {
                attr: Attr::default(),
                content: Vec::new(),
                target: Target::url("#nowhere"),
            },
        ])]);
        fill_links(&mut doc, &ctx);

        match &doc.blocks[0] {
            Block::Paragraph(inlines) => {
                assert_eq!(crossdoc_ast::inlines_text(&inlines[0..1]), "2.1");
                assert_eq!(crossdoc_ast::inlines_text(&inlines[1..2]), "existing");
                assert_eq!(crossdoc_ast::inlines_text(&inlines[2..3]), "");
            }
            other => panic!("expected paragraph, got {:?}", other),
        }
    }
}
