//! Initialize a new site

use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
description: ''
language: pt-BR
timezone: UTC

# URL
url: http://localhost:3000
root: /

# Directory
public_dir: public

# Date format (Moment.js tokens)
date_format: DD MMM YYYY

# Render unknown post slugs on demand when serving
fallback: true

# Content API
# PRISMIC_API_ENDPOINT and PRISMIC_ACCESS_TOKEN override these
content_api:
  endpoint: https://spacetraveling.cdn.prismic.io/api/v2
  document_type: post
  timeout_secs: 10
  ref_ttl_secs: 5

# Listing
listing:
  page_size: 1
  max_pages: 50
  load_more_label: Carregar mais posts
"#;

/// Write a default `_config.yml` into the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        bail!("{:?} already exists", config_path);
    }

    fs::create_dir_all(target_dir)?;
    fs::write(&config_path, DEFAULT_CONFIG)?;
    tracing::debug!("Created: {:?}", config_path);

    Ok(())
}
