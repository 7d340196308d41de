//! List site content

use anyhow::{Context, Result};
use std::io::Write;

use crate::client::{ContentSource, Predicate, QueryOptions};
use crate::helpers;
use crate::listing::{LoadMore, Listing};
use crate::Site;

/// List site content by type
pub async fn run(site: &Site, content_type: &str) -> Result<()> {
    let client = site.client()?;
    let stdout = std::io::stdout();
    run_with(site, &client, content_type, &mut stdout.lock()).await
}

pub async fn run_with<S: ContentSource>(
    site: &Site,
    source: &S,
    content_type: &str,
    out: &mut impl Write,
) -> Result<()> {
    match content_type {
        "post" | "posts" => list_posts(site, source, out).await,
        "route" | "routes" => {
            let paths = super::generate::static_paths(site, source).await?;
            writeln!(out, "Routes ({}):", paths.slugs.len() + 1)?;
            writeln!(out, "  {}", helpers::url_for(&site.config, ""))?;
            for slug in &paths.slugs {
                writeln!(
                    out,
                    "  {}",
                    helpers::url_for(&site.config, &helpers::post_path(slug))
                )?;
            }
            writeln!(
                out,
                "Fallback: {}",
                if paths.fallback { "render on demand" } else { "404" }
            )?;
            Ok(())
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, route", content_type);
        }
    }
}

/// Walk the listing the way a reader would, one `load_more` at a time
async fn list_posts<S: ContentSource>(
    site: &Site,
    source: &S,
    out: &mut impl Write,
) -> Result<()> {
    let tz = site.config.tz()?;
    let predicates = [Predicate::document_type(
        &site.config.content_api.document_type,
    )];
    let options = QueryOptions::default()
        .page_size(site.config.listing.page_size)
        .newest_first();

    let first = source
        .query(&predicates, &options)
        .await
        .context("failed to fetch posts")?;
    let listing = Listing::from_page(&first)?;
    let mut pages = 1;
    while pages < site.config.listing.max_pages {
        match listing.load_more(source).await? {
            LoadMore::Exhausted => break,
            LoadMore::Appended(_) => pages += 1,
        }
    }

    let state = listing.snapshot().await;
    writeln!(out, "Posts ({}):", state.posts.len())?;
    for post in &state.posts {
        let date = helpers::format_publication(
            post.first_publication_date.as_ref(),
            &tz,
            &site.config.date_format,
        );
        writeln!(
            out,
            "  {} - {} by {} [{}]",
            date, post.data.title, post.data.author, post.uid
        )?;
    }

    Ok(())
}
