//! Section bodies
//!
//! A body reaches us either as structured rich text or as markup that was
//! rendered upstream. Both are normalized once, at fetch time, into a
//! [`Body`] that carries the plain text (for counting) and the HTML (for
//! rendering).

use serde::Serialize;

use crate::helpers::{html_escape, strip_html};

use super::raw::{RawBlock, RawBody};

/// Normalized section body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Body {
    pub text: String,
    pub html: String,
}

impl Body {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            html: String::new(),
        }
    }

    /// Flatten structured rich text
    pub fn from_blocks(blocks: &[Block]) -> Self {
        Self {
            text: as_text(blocks),
            html: as_html(blocks),
        }
    }

    /// Accept pre-rendered markup as is
    pub fn from_markup(markup: &str) -> Self {
        Self {
            text: strip_html(markup),
            html: markup.to_string(),
        }
    }

    pub fn from_raw(raw: &RawBody) -> Self {
        match raw {
            RawBody::Markup(markup) => Self::from_markup(markup),
            RawBody::Blocks(raw_blocks) => {
                let blocks: Vec<Block> = raw_blocks.iter().filter_map(RawBlock::to_block).collect();
                Self::from_blocks(&blocks)
            }
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// A rich text block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph { text: String, spans: Vec<Span> },
    Heading { level: u8, text: String, spans: Vec<Span> },
    Preformatted { text: String, spans: Vec<Span> },
    ListItem { text: String, spans: Vec<Span> },
    OrderedListItem { text: String, spans: Vec<Span> },
    Image { url: String, alt: String },
    Embed { html: String },
}

impl Block {
    fn text(&self) -> Option<&str> {
        match self {
            Block::Paragraph { text, .. }
            | Block::Heading { text, .. }
            | Block::Preformatted { text, .. }
            | Block::ListItem { text, .. }
            | Block::OrderedListItem { text, .. } => Some(text),
            Block::Image { .. } | Block::Embed { .. } => None,
        }
    }
}

/// Inline formatting over `[start, end)`, in UTF-16 code units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub kind: SpanKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink { url: String, target: Option<String> },
    Label(String),
}

impl SpanKind {
    fn open_tag(&self) -> String {
        match self {
            SpanKind::Strong => "<strong>".to_string(),
            SpanKind::Em => "<em>".to_string(),
            SpanKind::Hyperlink { url, target } => match target {
                Some(target) => format!(
                    r#"<a href="{}" target="{}" rel="noopener noreferrer">"#,
                    html_escape(url),
                    html_escape(target)
                ),
                None => format!(r#"<a href="{}">"#, html_escape(url)),
            },
            SpanKind::Label(label) => format!(r#"<span class="{}">"#, html_escape(label)),
        }
    }

    fn close_tag(&self) -> &'static str {
        match self {
            SpanKind::Strong => "</strong>",
            SpanKind::Em => "</em>",
            SpanKind::Hyperlink { .. } => "</a>",
            SpanKind::Label(_) => "</span>",
        }
    }
}

/// Plain text of a block sequence, blocks separated by a single space
pub fn as_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .filter_map(Block::text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Serialize a block sequence to HTML
///
/// Consecutive list items share one `<ul>`/`<ol>`.
pub fn as_html(blocks: &[Block]) -> String {
    let mut out = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list = match block {
            Block::ListItem { .. } => Some("ul"),
            Block::OrderedListItem { .. } => Some("ol"),
            _ => None,
        };
        if open_list != list {
            if let Some(tag) = open_list {
                out.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list {
                out.push_str(&format!("<{}>", tag));
            }
            open_list = list;
        }

        match block {
            Block::Paragraph { text, spans } => {
                out.push_str(&format!("<p>{}</p>", render_spans(text, spans)));
            }
            Block::Heading { level, text, spans } => {
                out.push_str(&format!(
                    "<h{level}>{}</h{level}>",
                    render_spans(text, spans)
                ));
            }
            Block::Preformatted { text, spans } => {
                out.push_str(&format!("<pre>{}</pre>", render_spans(text, spans)));
            }
            Block::ListItem { text, spans } | Block::OrderedListItem { text, spans } => {
                out.push_str(&format!("<li>{}</li>", render_spans(text, spans)));
            }
            Block::Image { url, alt } => {
                out.push_str(&format!(
                    r#"<p class="block-img"><img src="{}" alt="{}"></p>"#,
                    html_escape(url),
                    html_escape(alt)
                ));
            }
            Block::Embed { html } => {
                out.push_str(&format!(r#"<div class="embed">{}</div>"#, html));
            }
        }
    }

    if let Some(tag) = open_list {
        out.push_str(&format!("</{}>", tag));
    }

    out
}

/// Render text with its spans, keeping tags properly nested
fn render_spans(text: &str, spans: &[Span]) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();
    let len = units.len();

    let mut bounds: Vec<usize> = vec![0, len];
    for span in spans {
        bounds.push(span.start.min(len));
        bounds.push(span.end.min(len));
    }
    bounds.sort_unstable();
    bounds.dedup();

    // Outer spans first: earlier start, then longer
    let mut ordered: Vec<&Span> = spans.iter().collect();
    ordered.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::new();
    let mut open: Vec<&Span> = Vec::new();

    for window in bounds.windows(2) {
        let (from, to) = (window[0], window[1]);
        let active: Vec<&Span> = ordered
            .iter()
            .copied()
            .filter(|s| s.start <= from && s.end >= to)
            .collect();

        let keep = open
            .iter()
            .zip(active.iter())
            .take_while(|(a, b)| std::ptr::eq(**a, **b))
            .count();
        while open.len() > keep {
            if let Some(span) = open.pop() {
                out.push_str(span.kind.close_tag());
            }
        }
        for span in &active[keep..] {
            out.push_str(&span.kind.open_tag());
            open.push(span);
        }

        let segment = String::from_utf16_lossy(&units[from..to]);
        out.push_str(&html_escape(&segment).replace('\n', "<br>"));
    }

    while let Some(span) = open.pop() {
        out.push_str(span.kind.close_tag());
    }

    out
}
