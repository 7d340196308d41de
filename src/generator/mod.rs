//! Generator module - renders listing snapshots and post pages into the
//! public directory using the built-in Tera templates

use chrono_tz::Tz;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use tera::Context;

use crate::content::raw::RawDocument;
use crate::content::{PostDetail, PostSummary};
use crate::error::Result;
use crate::helpers;
use crate::listing::ListingState;
use crate::templates::{
    ConfigData, PaginationData, PostCardData, PostPageData, SectionData, TemplateRenderer,
};
use crate::Site;

/// Slugs to pre-render and what to do with the rest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticPaths {
    pub slugs: Vec<String>,
    /// Unknown slugs are rendered on demand instead of answering 404
    pub fallback: bool,
}

impl StaticPaths {
    /// Collect the slugs of every document, dropping ones that cannot be a
    /// URL path segment
    pub fn from_documents(documents: &[RawDocument], fallback: bool) -> Self {
        let mut seen = HashSet::new();
        let slugs = documents
            .iter()
            .filter_map(|doc| match doc.uid.as_deref() {
                Some(uid) if is_safe_slug(uid) => Some(uid.to_string()),
                Some(uid) => {
                    tracing::warn!("Skipping document {} with unsafe slug {:?}", doc.id, uid);
                    None
                }
                None => {
                    tracing::warn!("Skipping document {} without a slug", doc.id);
                    None
                }
            })
            .filter(|uid| seen.insert(uid.clone()))
            .collect();
        Self { slugs, fallback }
    }
}

/// Whether a slug maps to a single, clean path segment
pub fn is_safe_slug(uid: &str) -> bool {
    !uid.is_empty() && slug::slugify(uid) == uid
}

/// Static site generator using Tera templates
pub struct Generator {
    site: Site,
    renderer: TemplateRenderer,
    tz: Tz,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site) -> Result<Self> {
        Ok(Self {
            site: site.clone(),
            renderer: TemplateRenderer::new()?,
            tz: site.config.tz()?,
        })
    }

    /// Build config data for templates
    fn build_config_data(&self) -> ConfigData {
        let config = &self.site.config;
        ConfigData {
            title: helpers::html_escape(&config.title),
            description: helpers::html_escape(&helpers::truncate(&config.description, 160, None)),
            language: helpers::html_escape(&config.language),
            url: config.url.clone(),
            root: helpers::url_for(config, ""),
        }
    }

    fn create_base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("config", &self.build_config_data());
        context
    }

    fn format_date(&self, date: Option<&chrono::DateTime<chrono::Utc>>) -> (String, String) {
        let display = helpers::format_publication(date, &self.tz, &self.site.config.date_format);
        let xml = date.map(helpers::date_xml).unwrap_or_default();
        (display, xml)
    }

    fn build_card(&self, post: &PostSummary) -> PostCardData {
        let (date, date_xml) = self.format_date(post.first_publication_date.as_ref());
        PostCardData {
            uid: helpers::html_escape(&post.uid),
            path: helpers::html_escape(&helpers::url_for(
                &self.site.config,
                &helpers::post_path(&post.uid),
            )),
            title: helpers::html_escape(&post.data.title),
            subtitle: helpers::html_escape(&post.data.subtitle),
            author: helpers::html_escape(&post.data.author),
            date,
            date_xml,
        }
    }

    /// Render the listing as it stands after `page_num - 1` loads
    pub fn render_listing(&self, state: &ListingState, page_num: usize) -> Result<String> {
        let listing = &self.site.config.listing;
        let posts: Vec<PostCardData> = state.posts.iter().map(|p| self.build_card(p)).collect();

        let next_link = if state.has_more() && page_num < listing.max_pages {
            helpers::url_for(&self.site.config, &helpers::listing_path(page_num + 1))
        } else {
            String::new()
        };
        let pagination = PaginationData {
            current: page_num,
            next_link,
            next_anchor: posts.len() + 1,
            label: listing.load_more_label.clone(),
        };

        let mut context = self.create_base_context();
        context.insert("posts", &posts);
        context.insert("pagination", &pagination);

        self.renderer.render("index.html", &context)
    }

    pub fn write_listing(&self, state: &ListingState, page_num: usize) -> Result<PathBuf> {
        let html = self.render_listing(state, page_num)?;
        self.write_page(&helpers::listing_path(page_num), &html)
    }

    pub fn render_post(&self, post: &PostDetail) -> Result<String> {
        let (date, date_xml) = self.format_date(post.first_publication_date.as_ref());
        let (banner_url, banner_alt) = post
            .data
            .banner
            .as_ref()
            .map(|b| (helpers::html_escape(&b.url), helpers::html_escape(&b.alt)))
            .unwrap_or_default();

        let page = PostPageData {
            uid: helpers::html_escape(&post.uid),
            title: helpers::html_escape(&post.data.title),
            author: helpers::html_escape(&post.data.author),
            date,
            date_xml,
            banner_url,
            banner_alt,
            reading_time: post.reading_time().to_string(),
            permalink: helpers::html_escape(&helpers::full_url_for(
                &self.site.config,
                &helpers::post_path(&post.uid),
            )),
            sections: post
                .data
                .content
                .iter()
                .map(|s| SectionData {
                    heading: helpers::html_escape(&s.heading),
                    html: s.body.html.clone(),
                })
                .collect(),
        };

        let mut context = self.create_base_context();
        context.insert("post", &page);
        self.renderer.render("post.html", &context)
    }

    /// Write a post page; posts whose slug is not a clean path segment are
    /// skipped
    pub fn write_post(&self, post: &PostDetail) -> Result<Option<PathBuf>> {
        if !is_safe_slug(&post.uid) {
            tracing::warn!("Not writing post with unsafe slug {:?}", post.uid);
            return Ok(None);
        }
        let html = self.render_post(post)?;
        self.write_page(&helpers::post_path(&post.uid), &html).map(Some)
    }

    pub fn render_not_found(&self) -> Result<String> {
        self.renderer.render("404.html", &self.create_base_context())
    }

    pub fn write_not_found(&self) -> Result<PathBuf> {
        let html = self.render_not_found()?;
        fs::create_dir_all(&self.site.public_dir)?;
        let output_path = self.site.public_dir.join("404.html");
        fs::write(&output_path, html)?;
        Ok(output_path)
    }

    pub(crate) fn write_page(&self, path: &str, html: &str) -> Result<PathBuf> {
        let output_path = self
            .site
            .public_dir
            .join(path.trim_start_matches('/'))
            .join("index.html");
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output_path, html)?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(output_path)
    }
}
