//! Boundary shapes of the content API
//!
//! Everything the service sends is decoded into these types first. Fields
//! the site relies on are optional here and validated during
//! normalization, so a malformed record turns into an error instead of a
//! broken page.

use serde::Deserialize;

use super::rich_text::{Block, Span, SpanKind};

/// API root document, used to resolve the master ref
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRoot {
    #[serde(default)]
    pub refs: Vec<ApiRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRef {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

impl ApiRoot {
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference.as_str())
    }
}

/// One page of a paginated search response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results_per_page: u32,
    #[serde(default)]
    pub total_results_size: u32,
    #[serde(default)]
    pub total_pages: u32,
    pub next_page: Option<String>,
    pub prev_page: Option<String>,
    #[serde(default)]
    pub results: Vec<RawDocument>,
}

/// A document as returned by the service, prior to normalization
#[derive(Debug, Clone, Deserialize)]
pub struct RawDocument {
    pub id: String,
    pub uid: Option<String>,
    #[serde(rename = "type", default)]
    pub document_type: String,
    pub first_publication_date: Option<String>,
    pub last_publication_date: Option<String>,
    #[serde(default)]
    pub data: RawPostData,
}

/// The `data` block of a post document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPostData {
    pub title: Option<RawText>,
    pub subtitle: Option<RawText>,
    pub author: Option<RawText>,
    pub banner: Option<RawImage>,
    pub content: Option<Vec<RawSection>>,
}

/// A text field: key text arrives as a string, title fields as rich text
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawText {
    Plain(String),
    Rich(Vec<RawBlock>),
}

impl RawText {
    pub fn to_plain(&self) -> String {
        match self {
            RawText::Plain(s) => s.clone(),
            RawText::Rich(blocks) => blocks
                .iter()
                .filter_map(|b| b.text.as_deref())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Image field; an empty image is `{}` on the wire
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawImage {
    pub url: Option<String>,
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSection {
    pub heading: Option<RawText>,
    pub body: Option<RawBody>,
}

/// Section body: structured rich text, or markup rendered upstream
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawBody {
    Blocks(Vec<RawBlock>),
    Markup(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<String>,
    #[serde(default)]
    pub spans: Vec<RawSpan>,
    pub url: Option<String>,
    pub alt: Option<String>,
    pub oembed: Option<RawEmbed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEmbed {
    pub html: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSpan {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<RawSpanData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSpanData {
    pub url: Option<String>,
    pub target: Option<String>,
    pub label: Option<String>,
}

impl RawBlock {
    /// Convert into a typed block; unknown block types yield `None`
    pub fn to_block(&self) -> Option<Block> {
        let text = || self.text.clone().unwrap_or_default();
        let spans = || self.spans.iter().filter_map(RawSpan::to_span).collect();

        let block = match self.kind.as_str() {
            "paragraph" => Block::Paragraph {
                text: text(),
                spans: spans(),
            },
            "preformatted" => Block::Preformatted {
                text: text(),
                spans: spans(),
            },
            "list-item" => Block::ListItem {
                text: text(),
                spans: spans(),
            },
            "o-list-item" => Block::OrderedListItem {
                text: text(),
                spans: spans(),
            },
            kind if kind.starts_with("heading") => {
                let level = kind["heading".len()..].parse().ok().filter(|l| (1..=6).contains(l))?;
                Block::Heading {
                    level,
                    text: text(),
                    spans: spans(),
                }
            }
            "image" => Block::Image {
                url: self.url.clone()?,
                alt: self.alt.clone().unwrap_or_default(),
            },
            "embed" => Block::Embed {
                html: self.oembed.as_ref()?.html.clone()?,
            },
            other => {
                tracing::debug!("Skipping unsupported rich text block: {}", other);
                return None;
            }
        };
        Some(block)
    }
}

impl RawSpan {
    fn to_span(&self) -> Option<Span> {
        let data = self.data.clone().unwrap_or_default();
        let kind = match self.kind.as_str() {
            "strong" => SpanKind::Strong,
            "em" => SpanKind::Em,
            "hyperlink" => SpanKind::Hyperlink {
                url: data.url?,
                target: data.target,
            },
            "label" => SpanKind::Label(data.label?),
            _ => return None,
        };
        (self.start < self.end).then_some(Span {
            start: self.start,
            end: self.end,
            kind,
        })
    }
}
