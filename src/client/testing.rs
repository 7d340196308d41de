//! In-memory content source for tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ContentSource, Cursor, Predicate, QueryOptions};
use crate::content::raw::{RawDocument, RawPage};
use crate::error::{Error, Result};

/// A post document in the service's wire format
pub fn doc(uid: &str) -> serde_json::Value {
    serde_json::json!({
        "id": format!("id-{}", uid),
        "uid": uid,
        "type": "post",
        "first_publication_date": "2021-03-15T19:25:28+0000",
        "data": {
            "title": format!("Post {}", uid),
            "subtitle": "s",
            "author": "a",
            "banner": {},
            "content": [{
                "heading": "Intro",
                "body": [{"type": "paragraph", "text": "Some words here", "spans": []}]
            }]
        }
    })
}

pub fn page(uids: &[&str], next: Option<&str>) -> RawPage {
    serde_json::from_value(serde_json::json!({
        "page": 1,
        "next_page": next,
        "prev_page": null,
        "results": uids.iter().map(|u| doc(u)).collect::<Vec<_>>()
    }))
    .unwrap()
}

/// Serves query results keyed by page size and pages keyed by cursor
#[derive(Default)]
pub struct MemorySource {
    queries: HashMap<Option<usize>, RawPage>,
    pages: HashMap<String, RawPage>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn with_query(mut self, page_size: usize, page: RawPage) -> Self {
        self.queries.insert(Some(page_size), page);
        self
    }

    pub fn with_page(mut self, cursor: &str, page: RawPage) -> Self {
        self.pages.insert(cursor.to_string(), page);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn all_documents(&self) -> impl Iterator<Item = &RawDocument> {
        self.queries
            .values()
            .chain(self.pages.values())
            .flat_map(|p| p.results.iter())
    }
}

impl ContentSource for MemorySource {
    async fn query(&self, _: &[Predicate], options: &QueryOptions) -> Result<RawPage> {
        Ok(self
            .queries
            .get(&options.page_size)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_by_uid(&self, _: &str, uid: &str) -> Result<Option<RawDocument>> {
        Ok(self
            .all_documents()
            .find(|d| d.uid.as_deref() == Some(uid))
            .cloned())
    }

    async fn fetch_page(&self, cursor: &Cursor) -> Result<RawPage> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(cursor.as_str())
            .cloned()
            .ok_or_else(|| Error::Status {
                status: reqwest::StatusCode::NOT_FOUND,
                url: cursor.to_string(),
            })
    }
}
