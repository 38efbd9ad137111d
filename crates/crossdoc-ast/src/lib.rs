//! Document tree model for academic-paper post-processing.
//!
//! The tree mirrors the node kinds a pandoc-style front end produces:
//! blocks (paragraphs, headings, raw fragments, figures, tables, divs) and
//! inlines (text runs, spans, links, images, raw fragments). Every
//! attributable node carries an [`Attr`] with an identifier, class tags and
//! an ordered attribute map. Child order is significant and preserved by
//! every transformation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A parsed document: an ordered sequence of top-level blocks plus
/// free-form metadata handed through from the front end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub meta: IndexMap<String, String>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            meta: IndexMap::new(),
        }
    }
}

/// Identifier, class list and attribute map attached to a node.
///
/// The identifier doubles as the HTML anchor id; it may be empty. Attribute
/// order is preserved so serialized output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attr {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,
}

impl Attr {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            identifier: id.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.identifier.is_empty() && self.classes.is_empty() && self.attributes.is_empty()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }
}

/// Link or image target: URL plus an optional title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
}

impl Target {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
        }
    }
}

/// Figure or table caption: an optional short form plus the long-form
/// block content rendered beneath the element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<Vec<Inline>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub long: Vec<Block>,
}

impl Caption {
    pub fn from_inlines(inlines: Vec<Inline>) -> Self {
        Self {
            short: None,
            long: vec![Block::Plain(inlines)],
        }
    }

    /// Flatten the long-form caption to plain text.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for block in &self.long {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&blocks_text(std::slice::from_ref(block)));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub header: bool,
}

/// Block-level node kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "c")]
pub enum Block {
    Paragraph(Vec<Inline>),
    Plain(Vec<Inline>),
    Heading {
        level: u8,
        attr: Attr,
        content: Vec<Inline>,
    },
    /// Un-parsed source markup recognized only by pattern matching.
    RawBlock {
        format: String,
        text: String,
    },
    CodeBlock {
        attr: Attr,
        text: String,
    },
    Figure {
        attr: Attr,
        caption: Caption,
        blocks: Vec<Block>,
    },
    Table {
        attr: Attr,
        caption: Caption,
        rows: Vec<TableRow>,
    },
    Div {
        attr: Attr,
        blocks: Vec<Block>,
    },
    BulletList(Vec<Vec<Block>>),
    OrderedList(Vec<Vec<Block>>),
    BlockQuote(Vec<Block>),
    HorizontalRule,
}

/// Inline-level node kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "c")]
pub enum Inline {
    Str(String),
    Space,
    SoftBreak,
    LineBreak,
    Emph(Vec<Inline>),
    Strong(Vec<Inline>),
    Code {
        attr: Attr,
        text: String,
    },
    Span {
        attr: Attr,
        content: Vec<Inline>,
    },
    Link {
        attr: Attr,
        content: Vec<Inline>,
        target: Target,
    },
    Image {
        attr: Attr,
        alt: Vec<Inline>,
        target: Target,
    },
    /// Un-parsed inline source markup.
    RawInline {
        format: String,
        text: String,
    },
}

impl Inline {
    pub fn str(s: impl Into<String>) -> Self {
        Inline::Str(s.into())
    }
}

/// Raw-fragment formats recognized as LaTeX source.
pub fn is_latex_format(format: &str) -> bool {
    matches!(format, "latex" | "tex")
}

/// Flatten a sequence of inlines to plain text.
pub fn inlines_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    push_inlines_text(inlines, &mut out);
    out
}

fn push_inlines_text(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Str(s) => out.push_str(s),
            Inline::Space | Inline::SoftBreak | Inline::LineBreak => out.push(' '),
            Inline::Emph(content) | Inline::Strong(content) => {
                push_inlines_text(content, out);
            }
            Inline::Code { text, .. } => out.push_str(text),
            Inline::Span { content, .. } | Inline::Link { content, .. } => {
                push_inlines_text(content, out);
            }
            Inline::Image { alt, .. } => push_inlines_text(alt, out),
            Inline::RawInline { .. } => {}
        }
    }
}

/// Flatten a sequence of blocks to plain text.
pub fn blocks_text(blocks: &[Block]) -> String {
    let mut parts = Vec::new();
    for block in blocks {
        match block {
            Block::Paragraph(inlines) | Block::Plain(inlines) => {
                parts.push(inlines_text(inlines));
            }
            Block::Heading { content, .. } => parts.push(inlines_text(content)),
            Block::CodeBlock { text, .. } => parts.push(text.clone()),
            Block::Div { blocks, .. } | Block::BlockQuote(blocks) => {
                parts.push(blocks_text(blocks));
            }
            Block::Figure { blocks, caption, .. } => {
                parts.push(blocks_text(blocks));
                parts.push(caption.text());
            }
            _ => {}
        }
    }
    parts.retain(|p| !p.is_empty());
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_helpers() {
        let mut attr = Attr::with_id("sec:intro");
        attr.classes.push("unnumbered".to_string());
        attr.set("data-number", "1.2");

        assert!(attr.has_class("unnumbered"));
        assert!(!attr.has_class("numbered"));
        assert_eq!(attr.get("data-number"), Some("1.2"));
        assert_eq!(attr.get("missing"), None);
    }

    #[test]
    fn test_inlines_text_flattening() {
        let inlines = vec![
            Inline::str("A"),
            Inline::Space,
            Inline::Emph(vec![Inline::str("nested")]),
            Inline::Space,
            Inline::Link {
                attr: Attr::default(),
                content: vec![Inline::str("link")],
                target: Target::url("#x"),
            },
        ];
        assert_eq!(inlines_text(&inlines), "A nested link");
    }

    #[test]
    fn test_document_json_round_trip() {
        let doc = Document::new(vec![
            Block::Heading {
                level: 1,
                attr: Attr::with_id("sec:intro"),
                content: vec![Inline::str("Introduction")],
            },
            Block::RawBlock {
                format: "latex".to_string(),
                text: "\\appendix".to_string(),
            },
        ]);

        let json = serde_json::to_string(&doc).unwrap();
        let parsed: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_empty_attr_fields_omitted_from_json() {
        let heading = Block::Heading {
            level: 2,
            attr: Attr::default(),
            content: vec![Inline::str("x")],
        };
        let json = serde_json::to_string(&heading).unwrap();
        assert!(!json.contains("identifier"));
        assert!(!json.contains("classes"));
    }
}
