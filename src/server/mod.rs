//! Preview server
//!
//! Serves the generated public directory. Post slugs that were not
//! pre-rendered are fetched from the content API, rendered and written to
//! disk on first request when fallback is enabled.

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::client::ContentSource;
use crate::content::PostDetail;
use crate::generator::{is_safe_slug, Generator};
use crate::helpers;
use crate::Site;

/// Server state
pub struct ServerState<S> {
    site: Site,
    source: S,
    generator: Generator,
}

impl<S: ContentSource> ServerState<S> {
    pub fn new(site: &Site, source: S) -> crate::Result<Self> {
        Ok(Self {
            site: site.clone(),
            source,
            generator: Generator::new(site)?,
        })
    }
}

/// Build the router for a site
pub fn router<S>(state: Arc<ServerState<S>>) -> Router
where
    S: ContentSource + Send + 'static,
{
    let public_dir = &state.site.public_dir;
    let static_files = ServeDir::new(public_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(public_dir.join("404.html")));

    Router::new()
        .route("/post/:slug", get(post_handler::<S>))
        .route("/post/:slug/", get(post_handler::<S>))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the preview server
pub async fn start(site: &Site, ip: &str, port: u16, open: bool) -> Result<()> {
    let state = Arc::new(ServerState::new(site, site.client()?)?);
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    if site.config.fallback {
        println!("Unknown posts are rendered on demand.");
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Serve a post page, rendering it on demand when it was not pre-rendered
async fn post_handler<S: ContentSource>(
    State(state): State<Arc<ServerState<S>>>,
    Path(slug): Path<String>,
) -> crate::Result<Response> {
    if !is_safe_slug(&slug) {
        return Ok(not_found(&state).await);
    }

    let path = helpers::post_path(&slug);
    let file = state.site.public_dir.join(&path).join("index.html");
    if let Ok(html) = tokio::fs::read_to_string(&file).await {
        return Ok(Html(html).into_response());
    }

    if !state.site.config.fallback {
        return Ok(not_found(&state).await);
    }

    let document_type = &state.site.config.content_api.document_type;
    let Some(doc) = state.source.get_by_uid(document_type, &slug).await? else {
        tracing::debug!("No post {:?} in the content API", slug);
        return Ok(not_found(&state).await);
    };

    let post = PostDetail::from_raw(&doc)?;
    let html = state.generator.render_post(&post)?;
    state.generator.write_page(&path, &html)?;
    tracing::info!("Rendered on demand: {}", path);

    Ok(Html(html).into_response())
}

async fn not_found<S>(state: &ServerState<S>) -> Response {
    let html = match tokio::fs::read_to_string(state.site.public_dir.join("404.html")).await {
        Ok(html) => html,
        Err(_) => state.generator.render_not_found().unwrap_or_default(),
    };
    (StatusCode::NOT_FOUND, Html(html)).into_response()
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{page, MemorySource};
    use crate::client::{Cursor, Predicate, QueryOptions};
    use crate::config::SiteConfig;
    use crate::content::raw::{RawDocument, RawPage};
    use crate::Error;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::util::ServiceExt;

    fn site(dir: &std::path::Path, fallback: bool) -> Site {
        let config = SiteConfig {
            fallback,
            ..SiteConfig::default()
        };
        Site::with_config(dir, config)
    }

    fn app<S: ContentSource + Send + 'static>(site: &Site, source: S) -> Router {
        let state = ServerState::new(site, source).unwrap();
        state.generator.write_not_found().unwrap();
        router(Arc::new(state))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let resp = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .expect("oneshot fail");
        let status = resp.status();
        let data = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(data.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_serves_pre_rendered_post() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(dir.path(), true);
        let post_dir = site.public_dir.join("post/a");
        std::fs::create_dir_all(&post_dir).unwrap();
        std::fs::write(post_dir.join("index.html"), "pre-rendered").unwrap();

        let app = app(&site, MemorySource::default());
        assert_eq!(
            get(app.clone(), "/post/a").await,
            (StatusCode::OK, "pre-rendered".to_string())
        );
        assert_eq!(get(app, "/post/a/").await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_fallback_renders_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(dir.path(), true);
        let source = MemorySource::default().with_query(1, page(&["b"], None));

        let (status, body) = get(app(&site, source), "/post/b/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Post b | spacetraveling"));
        assert!(body.contains(r#"<span class="reading-time">1 min</span>"#));
        assert!(site.public_dir.join("post/b/index.html").exists());
    }

    #[tokio::test]
    async fn test_unknown_slug_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(dir.path(), true);

        let (status, body) = get(app(&site, MemorySource::default()), "/post/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Post not found"));
    }

    #[tokio::test]
    async fn test_fallback_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(dir.path(), false);
        let source = MemorySource::default().with_query(1, page(&["b"], None));

        let (status, _) = get(app(&site, source), "/post/b").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!site.public_dir.join("post/b").exists());
    }

    #[tokio::test]
    async fn test_static_files_and_not_found_page() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(dir.path(), true);
        std::fs::create_dir_all(&site.public_dir).unwrap();
        std::fs::write(site.public_dir.join("index.html"), "home").unwrap();
        let app = app(&site, MemorySource::default());

        assert_eq!(
            get(app.clone(), "/").await,
            (StatusCode::OK, "home".to_string())
        );
        let (status, body) = get(app, "/nowhere/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Post not found"));
    }

    struct Unreachable;

    impl ContentSource for Unreachable {
        async fn query(&self, _: &[Predicate], _: &QueryOptions) -> crate::Result<RawPage> {
            Err(Error::MissingMasterRef("test".to_string()))
        }

        async fn get_by_uid(&self, _: &str, _: &str) -> crate::Result<Option<RawDocument>> {
            Err(Error::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                url: "test".to_string(),
            })
        }

        async fn fetch_page(&self, _: &Cursor) -> crate::Result<RawPage> {
            Err(Error::MissingMasterRef("test".to_string()))
        }
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(dir.path(), true);

        let (status, _) = get(app(&site, Unreachable), "/post/b").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
