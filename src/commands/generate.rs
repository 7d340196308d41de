//! Generate static files

use anyhow::{Context, Result};
use std::time::Instant;

use crate::client::{self, ContentSource, Predicate, QueryOptions};
use crate::content::raw::RawDocument;
use crate::content::PostDetail;
use crate::generator::{Generator, StaticPaths};
use crate::listing::{LoadMore, Listing};
use crate::Site;

/// Largest page size the content API accepts
const FULL_QUERY_PAGE_SIZE: usize = 100;

/// What a generation run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub listing_pages: usize,
    pub posts: usize,
    pub skipped: usize,
    pub static_paths: StaticPaths,
}

/// Generate the static site against the configured content API
pub async fn run(site: &Site) -> Result<Report> {
    let client = site.client()?;
    run_with(site, &client).await
}

/// Generate the static site against any content source
pub async fn run_with<S: ContentSource>(site: &Site, source: &S) -> Result<Report> {
    let start = Instant::now();
    let generator = Generator::new(site)?;

    let listing_pages = generate_listing(site, source, &generator).await?;

    let documents = fetch_all_posts(site, source).await?;
    let static_paths = StaticPaths::from_documents(&documents, site.config.fallback);

    let mut posts = 0;
    let mut skipped = 0;
    for doc in &documents {
        if !doc
            .uid
            .as_ref()
            .is_some_and(|uid| static_paths.slugs.contains(uid))
        {
            skipped += 1;
            continue;
        }
        match PostDetail::from_raw(doc) {
            Ok(post) => {
                if generator.write_post(&post)?.is_some() {
                    posts += 1;
                } else {
                    skipped += 1;
                }
            }
            Err(e) => {
                tracing::warn!("Skipping post: {}", e);
                skipped += 1;
            }
        }
    }

    generator.write_not_found()?;

    tracing::info!(
        "Generated {} listing pages and {} posts ({} skipped) in {:.2}s",
        listing_pages,
        posts,
        skipped,
        start.elapsed().as_secs_f64()
    );

    Ok(Report {
        listing_pages,
        posts,
        skipped,
        static_paths,
    })
}

/// Render listing page 1 from the first query, then one more page per
/// `load_more` until the cursor runs out or the page cap is hit
async fn generate_listing<S: ContentSource>(
    site: &Site,
    source: &S,
    generator: &Generator,
) -> Result<usize> {
    let listing_config = &site.config.listing;
    let predicates = [Predicate::document_type(
        &site.config.content_api.document_type,
    )];
    let options = QueryOptions::default()
        .page_size(listing_config.page_size)
        .newest_first();

    let first = source
        .query(&predicates, &options)
        .await
        .context("failed to fetch the first listing page")?;
    let listing = Listing::from_page(&first)?;

    let mut page_num = 1;
    generator.write_listing(&listing.snapshot().await, page_num)?;

    while page_num < listing_config.max_pages {
        match listing
            .load_more(source)
            .await
            .with_context(|| format!("failed to load listing page {}", page_num + 1))?
        {
            LoadMore::Exhausted => break,
            LoadMore::Appended(count) => {
                page_num += 1;
                tracing::debug!("Listing page {} adds {} posts", page_num, count);
                generator.write_listing(&listing.snapshot().await, page_num)?;
            }
        }
    }

    Ok(page_num)
}

/// Every post document, across all pages
pub async fn fetch_all_posts<S: ContentSource>(site: &Site, source: &S) -> Result<Vec<RawDocument>> {
    let predicates = [Predicate::document_type(
        &site.config.content_api.document_type,
    )];
    let options = QueryOptions::default()
        .page_size(FULL_QUERY_PAGE_SIZE)
        .newest_first();
    client::query_all(source, &predicates, &options)
        .await
        .context("failed to fetch all posts")
}

/// Slugs to pre-render, derived from a full query
pub async fn static_paths<S: ContentSource>(site: &Site, source: &S) -> Result<StaticPaths> {
    let documents = fetch_all_posts(site, source).await?;
    Ok(StaticPaths::from_documents(&documents, site.config.fallback))
}
