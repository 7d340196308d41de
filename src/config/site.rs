//! Site configuration (_config.yml)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,

    // Date format (Moment.js style)
    pub date_format: String,

    /// Render unknown post slugs on demand instead of answering 404
    pub fallback: bool,

    #[serde(default)]
    pub content_api: ContentApiConfig,

    #[serde(default)]
    pub listing: ListingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            language: "pt-BR".to_string(),
            timezone: "UTC".to_string(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),

            date_format: "DD MMM YYYY".to_string(),

            fallback: true,

            content_api: ContentApiConfig::default(),
            listing: ListingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `PRISMIC_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("PRISMIC_API_ENDPOINT").filter(|v| !v.is_empty()) {
            tracing::debug!("Content API endpoint overridden from environment");
            self.content_api.endpoint = endpoint;
        }
        if let Some(token) = lookup("PRISMIC_ACCESS_TOKEN").filter(|v| !v.is_empty()) {
            self.content_api.access_token = Some(token);
        }
    }

    /// Timezone used when displaying publication dates
    pub fn tz(&self) -> Result<chrono_tz::Tz> {
        self.timezone
            .parse()
            .map_err(|e| Error::Config(format!("timezone {:?}: {}", self.timezone, e)))
    }
}

/// Content API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentApiConfig {
    /// API root, e.g. `https://<repo>.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Document type holding blog posts
    pub document_type: String,
    pub timeout_secs: u64,
    /// How long a resolved master ref is reused; every publish moves it
    pub ref_ttl_secs: u64,
}

impl Default for ContentApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "post".to_string(),
            timeout_secs: 10,
            ref_ttl_secs: 5,
        }
    }
}

impl ContentApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn ref_ttl(&self) -> Duration {
        Duration::from_secs(self.ref_ttl_secs)
    }
}

/// Listing page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Posts per fetched page
    pub page_size: usize,
    /// Upper bound on generated listing pages
    pub max_pages: usize,
    pub load_more_label: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: 1,
            max_pages: 50,
            load_more_label: "Carregar mais posts".to_string(),
        }
    }
}
