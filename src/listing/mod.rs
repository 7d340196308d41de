//! Listing accumulator
//!
//! Holds the posts shown on the listing page and the cursor to the next
//! page of results. `load_more` fetches that page and appends it. A call
//! made while another is still in flight is rejected, so rapid repeated
//! triggers can neither duplicate nor reorder entries.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::client::{ContentSource, Cursor};
use crate::content::raw::RawPage;
use crate::content::PostSummary;
use crate::error::{Error, Result};

/// Posts and cursor as exposed to the renderer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingState {
    pub posts: Vec<PostSummary>,
    pub next_page: Option<Cursor>,
}

impl ListingState {
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }
}

/// Outcome of a successful `load_more`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMore {
    /// The cursor was already exhausted; nothing was fetched
    Exhausted,
    /// Number of posts appended
    Appended(usize),
}

pub struct Listing {
    state: RwLock<ListingState>,
    loading: AtomicBool,
}

/// Clears the in-flight flag however the load ends
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Listing {
    /// Start from data fetched at build time
    pub fn new(posts: Vec<PostSummary>, next_page: Option<Cursor>) -> Self {
        Self {
            state: RwLock::new(ListingState { posts, next_page }),
            loading: AtomicBool::new(false),
        }
    }

    /// Start from the first page of a query
    pub fn from_page(page: &RawPage) -> Result<Self> {
        let posts = normalize(page)?;
        Ok(Self::new(posts, page.next_cursor()))
    }

    pub async fn snapshot(&self) -> ListingState {
        self.state.read().await.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Fetch the page at the cursor and append its posts
    ///
    /// On failure the posts and cursor are left untouched.
    pub async fn load_more<S: ContentSource>(&self, source: &S) -> Result<LoadMore> {
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::LoadInFlight);
        }
        let _guard = LoadingGuard(&self.loading);

        let Some(cursor) = self.state.read().await.next_page.clone() else {
            return Ok(LoadMore::Exhausted);
        };

        let page = source.fetch_page(&cursor).await?;
        let fetched = normalize(&page)?;

        let mut state = self.state.write().await;
        let mut seen: HashSet<String> = state.posts.iter().map(|p| p.uid.clone()).collect();
        let before = state.posts.len();
        for post in fetched {
            if seen.insert(post.uid.clone()) {
                state.posts.push(post);
            } else {
                tracing::warn!("Skipping duplicate post {}", post.uid);
            }
        }
        state.next_page = page.next_cursor();

        let appended = state.posts.len() - before;
        tracing::debug!(
            "Loaded {} posts, {} in total, more: {}",
            appended,
            state.posts.len(),
            state.has_more()
        );
        Ok(LoadMore::Appended(appended))
    }
}

fn normalize(page: &RawPage) -> Result<Vec<PostSummary>> {
    page.results.iter().map(PostSummary::from_raw).collect()
}
