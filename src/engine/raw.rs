//! Raw-fragment interpretation (pass 1).
//!
//! Walks the tree in document order and interprets the two raw LaTeX
//! patterns the engine knows: the `\appendix` marker, which flips the
//! appendix flag and disappears from output, and `\begin{listing}`
//! environments, which expand into captioned, identified code containers.
//! Top-level headings encountered after the marker receive their appendix
//! letter here, since lettering depends on position relative to the marker.
//! Fragments matching neither pattern pass through unchanged.

use crossdoc_ast::{is_latex_format, Attr, Block, Document, Inline};

use super::context::{AssignedNumber, DocumentContext, RegistryEntry};
use super::scan;
use crate::utils::report::WarningKind;

pub fn interpret(document: &mut Document, ctx: &mut DocumentContext) {
    let blocks = std::mem::take(&mut document.blocks);
    document.blocks = interpret_blocks(blocks, ctx);
}

fn interpret_blocks(blocks: Vec<Block>, ctx: &mut DocumentContext) -> Vec<Block> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        match block {
            Block::RawBlock { format, text } if is_latex_format(&format) => {
                if contains_appendix_marker(&text) {
                    ctx.in_appendix = true;
                    continue;
                }
                if text.contains("\\begin{listing}") {
                    match interpret_listing(&text, ctx) {
                        Some(replacement) => out.push(replacement),
                        None => {
                            ctx.warn(
                                WarningKind::MalformedEnvironment,
                                None,
                                "listing environment without matching \\end, left as raw text",
                            );
                            out.push(Block::RawBlock { format, text });
                        }
                    }
                    continue;
                }
                out.push(Block::RawBlock { format, text });
            }
            Block::Heading {
                level,
                mut attr,
                content,
            } => {
                // Appendix boundary: letter every top-level heading after
                // the marker, unless it already carries a number.
                if level == 1 && ctx.in_appendix && attr.get("data-number").is_none() {
                    let letter = ctx.next_appendix_letter();
                    attr.set("data-number", letter.to_string());
                }
                out.push(Block::Heading {
                    level,
                    attr,
                    content,
                });
            }
            Block::Div { attr, blocks } => out.push(Block::Div {
                attr,
                blocks: interpret_blocks(blocks, ctx),
            }),
            Block::BlockQuote(blocks) => {
                out.push(Block::BlockQuote(interpret_blocks(blocks, ctx)))
            }
            Block::Figure {
                attr,
                caption,
                blocks,
            } => out.push(Block::Figure {
                attr,
                caption,
                blocks: interpret_blocks(blocks, ctx),
            }),
            Block::BulletList(items) => out.push(Block::BulletList(
                items
                    .into_iter()
                    .map(|item| interpret_blocks(item, ctx))
                    .collect(),
            )),
            Block::OrderedList(items) => out.push(Block::OrderedList(
                items
                    .into_iter()
                    .map(|item| interpret_blocks(item, ctx))
                    .collect(),
            )),
            other => out.push(other),
        }
    }
    out
}

/// True when the text contains `\appendix` as a complete command name.
fn contains_appendix_marker(text: &str) -> bool {
    const MARKER: &str = "\\appendix";
    let mut from = 0usize;
    while let Some(rel) = text[from..].find(MARKER) {
        let after = from + rel + MARKER.len();
        let continues = text[after..]
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_alphabetic());
        if !continues {
            return true;
        }
        from = after;
    }
    false
}

/// Expand a listing environment into a captioned container: an escaped
/// `<pre><code>` block (language-tagged when a nested minted environment
/// is present) followed by a "Listing N[: caption]" caption paragraph.
fn interpret_listing(text: &str, ctx: &mut DocumentContext) -> Option<Block> {
    let env = scan::find_environment(text, "listing", 0)?;

    let (body, caption) = scan::strip_command(&env.body, "caption");
    let (body, label) = scan::strip_command(&body, "label");

    let number = ctx.next_listing();
    let base_id = label
        .clone()
        .unwrap_or_else(|| format!("listing-{}", number));
    let identifier = ctx.unique_identifier(&base_id);

    // Listings are not separately discoverable as typed tree nodes, so
    // labeled ones register here rather than in the scan pass.
    if let Some(label) = label {
        ctx.register(
            label,
            RegistryEntry {
                number: AssignedNumber::Numeric(number),
                identifier: identifier.clone(),
            },
        );
    }

    let code_html = match scan::find_environment(&body, "minted", 1) {
        Some(minted) => format!(
            "<pre><code class=\"language-{}\">{}</code></pre>",
            minted.args[0],
            scan::escape_html(scan::trim_code(&minted.body))
        ),
        None => format!(
            "<pre><code>{}</code></pre>",
            scan::escape_html(scan::trim_code(&body))
        ),
    };

    let caption_text = match caption {
        Some(caption) => format!(
            "{} {}: {}",
            ctx.options.listing_title,
            number,
            scan::collapse_whitespace(&caption)
        ),
        None => format!("{} {}", ctx.options.listing_title, number),
    };

    let mut attr = Attr::with_id(identifier);
    attr.classes.push("listing".to_string());

    let mut caption_attr = Attr::default();
    caption_attr.classes.push("listing-caption".to_string());

    Some(Block::Div {
        attr,
        blocks: vec![
            Block::RawBlock {
                format: "html".to_string(),
                text: code_html,
            },
            Block::Paragraph(vec![Inline::Span {
                attr: caption_attr,
                content: vec![Inline::str(caption_text)],
            }]),
        ],
    })
}
