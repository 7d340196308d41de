//! HTTP client for a Prismic REST API v2 repository

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::{ContentSource, Cursor, Predicate, QueryOptions};
use crate::config::ContentApiConfig;
use crate::content::raw::{ApiRoot, RawDocument, RawPage};
use crate::error::{Error, Result};

/// Content API client built from an explicit [`ContentApiConfig`]
pub struct PrismicClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
    master_ref: RwLock<Option<CachedRef>>,
    ref_ttl: Duration,
}

struct CachedRef {
    reference: String,
    resolved_at: Instant,
}

impl CachedRef {
    fn fresh(&self, ttl: Duration) -> Option<&str> {
        (self.resolved_at.elapsed() < ttl).then_some(self.reference.as_str())
    }
}

/// Statuses the search endpoint answers with for a ref that is no longer
/// the master
fn is_stale_ref(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::GONE
    )
}

impl PrismicClient {
    pub fn new(config: &ContentApiConfig) -> Result<Self> {
        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        Url::parse(&endpoint)
            .map_err(|e| Error::Config(format!("content_api.endpoint {:?}: {}", endpoint, e)))?;

        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint,
            access_token: config.access_token.clone(),
            master_ref: RwLock::new(None),
            ref_ttl: config.ref_ttl(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ref of the published content, re-resolved once the cached one is
    /// older than the configured TTL
    async fn master_ref(&self) -> Result<String> {
        if let Some(reference) = self
            .master_ref
            .read()
            .await
            .as_ref()
            .and_then(|c| c.fresh(self.ref_ttl))
        {
            return Ok(reference.to_string());
        }

        let mut cached = self.master_ref.write().await;
        if let Some(reference) = cached.as_ref().and_then(|c| c.fresh(self.ref_ttl)) {
            return Ok(reference.to_string());
        }

        let root: ApiRoot = self.get_json(&self.endpoint, &self.token_param()).await?;
        let reference = root
            .master_ref()
            .ok_or_else(|| Error::MissingMasterRef(self.endpoint.clone()))?
            .to_string();
        tracing::debug!("Resolved master ref {}", reference);
        *cached = Some(CachedRef {
            reference: reference.clone(),
            resolved_at: Instant::now(),
        });
        Ok(reference)
    }

    /// Drop the cached ref unless another request already replaced it
    async fn forget_master_ref(&self, stale: &str) {
        let mut cached = self.master_ref.write().await;
        if cached.as_ref().is_some_and(|c| c.reference == stale) {
            *cached = None;
        }
    }

    async fn search(
        &self,
        reference: &str,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<RawPage> {
        let mut params = vec![
            ("ref", reference.to_string()),
            ("q", Predicate::render_query(predicates)),
        ];
        if let Some(size) = options.page_size {
            params.push(("pageSize", size.to_string()));
        }
        if let Some(page) = options.page {
            params.push(("page", page.to_string()));
        }
        if !options.orderings.is_empty() {
            params.push(("orderings", format!("[{}]", options.orderings.join(","))));
        }
        params.extend(self.token_param());

        let url = format!("{}/documents/search", self.endpoint);
        self.get_json(&url, &params).await
    }

    fn token_param(&self) -> Vec<(&'static str, String)> {
        self.access_token
            .iter()
            .map(|token| ("access_token", token.clone()))
            .collect()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&'static str, String)],
    ) -> Result<T> {
        let response = self.client.get(url).query(params).send().await?;
        let status = response.status();

        // The query string may carry the access token
        let mut logged = response.url().clone();
        logged.set_query(None);
        tracing::debug!("GET {} -> {}", logged, status);

        if !status.is_success() {
            return Err(Error::Status {
                status,
                url: logged.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl ContentSource for PrismicClient {
    async fn query(&self, predicates: &[Predicate], options: &QueryOptions) -> Result<RawPage> {
        let reference = self.master_ref().await?;
        match self.search(&reference, predicates, options).await {
            Err(Error::Status { status, .. }) if is_stale_ref(status) => {
                tracing::debug!("Ref {} rejected with {}, resolving again", reference, status);
                self.forget_master_ref(&reference).await;
                let reference = self.master_ref().await?;
                self.search(&reference, predicates, options).await
            }
            result => result,
        }
    }

    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<Option<RawDocument>> {
        let predicates = [Predicate::uid(document_type, uid)];
        let page = self
            .query(&predicates, &QueryOptions::default().page_size(1))
            .await?;
        Ok(page.results.into_iter().next())
    }

    async fn fetch_page(&self, cursor: &Cursor) -> Result<RawPage> {
        self.get_json(cursor.as_str(), &[]).await
    }
}
