//! Built-in spacetraveling templates using Tera template engine
//!
//! All templates are embedded directly in the binary.

use serde::Serialize;
use tera::{Context, Tera};

use crate::error::Result;

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Paths and URLs must not be escaped; text fields arrive already
        // escaped in the data structures below
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("spacetraveling/layout.html")),
            ("index.html", include_str!("spacetraveling/index.html")),
            ("post.html", include_str!("spacetraveling/post.html")),
            ("404.html", include_str!("spacetraveling/404.html")),
            (
                "partials/header.html",
                include_str!("spacetraveling/partials/header.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Data structures for template context
///
/// Every text field holds HTML-escaped text; `SectionData::html` is markup.

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub description: String,
    pub language: String,
    pub url: String,
    pub root: String,
}

/// A post card on the listing page
#[derive(Debug, Clone, Serialize)]
pub struct PostCardData {
    pub uid: String,
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
    pub date_xml: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationData {
    pub current: usize,
    pub next_link: String,
    /// 1-based position of the first post the next page adds
    pub next_anchor: usize,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPageData {
    pub uid: String,
    pub title: String,
    pub author: String,
    pub date: String,
    pub date_xml: String,
    pub banner_url: String,
    pub banner_alt: String,
    pub reading_time: String,
    pub permalink: String,
    pub sections: Vec<SectionData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionData {
    pub heading: String,
    pub html: String,
}
