//! Figure decoration (pass 5) and table caption annotation (pass 6).
//!
//! Figure decoration wraps the first image of each figure in a
//! lightbox-enabled anchor and only runs for HTML render targets. Table
//! annotation prepends the assigned table number to the caption of every
//! registered labeled table container.

use crossdoc_ast::{Attr, Block, Caption, Document, Inline, Target};

use super::context::{AssignedNumber, DocumentContext};
use super::scan;

pub fn figures(document: &mut Document, ctx: &DocumentContext) {
    if !ctx.options.target.is_html() {
        return;
    }
    decorate_blocks(&mut document.blocks, ctx);
}

fn decorate_blocks(blocks: &mut [Block], ctx: &DocumentContext) {
    for block in blocks.iter_mut() {
        match block {
            Block::Figure {
                caption, blocks, ..
            } => {
                if !already_decorated(blocks) {
                    let title = scan::escape_html_attr(&scan::collapse_whitespace(&caption.text()));
                    wrap_first_image_in_blocks(blocks, &title, &ctx.options.lightbox_group);
                }
                decorate_blocks(blocks, ctx);
            }
            Block::Div { blocks, .. } | Block::BlockQuote(blocks) => decorate_blocks(blocks, ctx),
            Block::BulletList(items) | Block::OrderedList(items) => {
                for item in items.iter_mut() {
                    decorate_blocks(item, ctx);
                }
            }
            _ => {}
        }
    }
}

fn already_decorated(blocks: &[Block]) -> bool {
    blocks.iter().any(|block| match block {
        Block::Paragraph(inlines) | Block::Plain(inlines) => inlines_have_lightbox(inlines),
        Block::Div { blocks, .. } => already_decorated(blocks),
        _ => false,
    })
}

fn inlines_have_lightbox(inlines: &[Inline]) -> bool {
    inlines.iter().any(|inline| match inline {
        Inline::Link { attr, .. } => attr.get("data-lightbox").is_some(),
        Inline::Span { content, .. } | Inline::Emph(content) | Inline::Strong(content) => {
            inlines_have_lightbox(content)
        }
        _ => false,
    })
}

fn wrap_first_image_in_blocks(blocks: &mut [Block], title: &str, group: &str) -> bool {
    for block in blocks.iter_mut() {
        let wrapped = match block {
            Block::Paragraph(inlines) | Block::Plain(inlines) => {
                wrap_first_image(inlines, title, group)
            }
            Block::Div { blocks, .. } => wrap_first_image_in_blocks(blocks, title, group),
            _ => false,
        };
        if wrapped {
            return true;
        }
    }
    false
}

fn wrap_first_image(inlines: &mut [Inline], title: &str, group: &str) -> bool {
    for inline in inlines.iter_mut() {
        match inline {
            Inline::Image { target, .. } => {
                let href = target.url.clone();
                let image = std::mem::replace(inline, Inline::Space);
                let mut attr = Attr::default();
                attr.set("data-lightbox", group);
                attr.set("data-title", title);
                *inline = Inline::Link {
                    attr,
                    content: vec![image],
                    target: Target::url(href),
                };
                return true;
            }
            Inline::Span { content, .. } | Inline::Emph(content) | Inline::Strong(content) => {
                if wrap_first_image(content, title, group) {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

pub fn tables(document: &mut Document, ctx: &DocumentContext) {
    annotate_blocks(&mut document.blocks, ctx);
}

fn annotate_blocks(blocks: &mut [Block], ctx: &DocumentContext) {
    for block in blocks.iter_mut() {
        match block {
            Block::Div { attr, blocks } => {
                if let Some(number) = registered_table_number(attr, ctx) {
                    let prefix = format!("{} {}: ", ctx.options.table_title, number);
                    for child in blocks.iter_mut() {
                        if let Block::Table { caption, .. } = child {
                            prepend_caption_prefix(caption, &prefix);
                        }
                    }
                }
                annotate_blocks(blocks, ctx);
            }
            Block::BlockQuote(blocks) => annotate_blocks(blocks, ctx),
            Block::Figure { blocks, .. } => annotate_blocks(blocks, ctx),
            Block::BulletList(items) | Block::OrderedList(items) => {
                for item in items.iter_mut() {
                    annotate_blocks(item, ctx);
                }
            }
            _ => {}
        }
    }
}

fn registered_table_number(attr: &Attr, ctx: &DocumentContext) -> Option<u32> {
    if attr.identifier.is_empty() {
        return None;
    }
    match ctx.lookup(&attr.identifier) {
        Some(entry) => match entry.number {
            AssignedNumber::Numeric(n) => Some(n),
            AssignedNumber::Sectional(_) => None,
        },
        None => None,
    }
}

/// Prepend the number prefix to the first text block of the long
/// caption. Captions without a text block stay unmodified, and a caption
/// that already starts with this exact prefix is left alone.
fn prepend_caption_prefix(caption: &mut Caption, prefix: &str) {
    let first = match caption.long.first_mut() {
        Some(Block::Paragraph(inlines)) | Some(Block::Plain(inlines)) => inlines,
        _ => return,
    };
    if matches!(first.first(), Some(Inline::Str(s)) if s == prefix) {
        return;
    }
    first.insert(0, Inline::str(prefix));
}
