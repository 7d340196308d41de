//! Content API access
//!
//! [`ContentSource`] is the seam between the site and the headless content
//! service. [`PrismicClient`] talks to the real API over HTTP; tests plug in
//! in-memory sources.

mod prismic;
#[cfg(test)]
pub(crate) mod testing;

use serde::Serialize;
use std::fmt;
use std::future::Future;

use crate::content::raw::{RawDocument, RawPage};
use crate::error::Result;

pub use prismic::PrismicClient;

/// Opaque reference to the next page of a paginated query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Cursor {
    fn from(url: String) -> Self {
        Self(url)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl RawPage {
    /// Cursor to the page after this one, `None` once exhausted
    pub fn next_cursor(&self) -> Option<Cursor> {
        self.next_page.clone().map(Cursor::from)
    }
}

/// A query predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `path` equals `value`
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::At {
            path: path.into(),
            value: value.into(),
        }
    }

    /// All documents of one type
    pub fn document_type(document_type: &str) -> Self {
        Self::at("document.type", document_type)
    }

    /// The document of `document_type` whose UID is `uid`
    pub fn uid(document_type: &str, uid: &str) -> Self {
        Self::at(format!("my.{}.uid", document_type), uid)
    }

    /// Render a predicate list as the `q` query parameter
    pub fn render_query(predicates: &[Predicate]) -> String {
        let inner: String = predicates.iter().map(|p| p.to_string()).collect();
        format!("[{}]", inner)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::At { path, value } => {
                write!(f, "[at({}, \"{}\")]", path, value.replace('"', "\\\""))
            }
        }
    }
}

/// Pagination and ordering of a query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub page_size: Option<usize>,
    pub page: Option<u32>,
    pub orderings: Vec<String>,
}

impl QueryOptions {
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Order by a field, e.g. `document.first_publication_date desc`
    pub fn order_by(mut self, ordering: impl Into<String>) -> Self {
        self.orderings.push(ordering.into());
        self
    }

    /// Newest posts first
    pub fn newest_first(self) -> Self {
        self.order_by("document.first_publication_date desc")
    }
}

/// A headless content service
pub trait ContentSource: Sync {
    /// Query documents matching every predicate
    fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> impl Future<Output = Result<RawPage>> + Send;

    /// Look up one document by its UID
    fn get_by_uid(
        &self,
        document_type: &str,
        uid: &str,
    ) -> impl Future<Output = Result<Option<RawDocument>>> + Send;

    /// Fetch the page a cursor points at
    fn fetch_page(&self, cursor: &Cursor) -> impl Future<Output = Result<RawPage>> + Send;
}

/// Run a query and follow its cursor until every page is read
pub async fn query_all<S: ContentSource>(
    source: &S,
    predicates: &[Predicate],
    options: &QueryOptions,
) -> Result<Vec<RawDocument>> {
    let mut page = source.query(predicates, options).await?;
    let mut documents = std::mem::take(&mut page.results);

    while let Some(cursor) = page.next_cursor() {
        tracing::debug!("Following cursor {}", cursor);
        page = source.fetch_page(&cursor).await?;
        documents.append(&mut page.results);
    }

    Ok(documents)
}
