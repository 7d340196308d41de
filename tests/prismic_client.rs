use axum::{
    body::{to_bytes, Body},
    extract::{Query, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

use spacetraveling::client::{ContentSource, Cursor, Predicate, PrismicClient, QueryOptions};
use spacetraveling::config::{ContentApiConfig, SiteConfig};
use spacetraveling::server::{router, ServerState};
use spacetraveling::{Error, Site};

const MASTER_REF: &str = "master-ref";
const TOKEN: &str = "secret";

/// A content repository; every publish adds a version under a new ref
struct FakeCms {
    base: String,
    /// (ref, uids newest first); the last version is the master
    versions: Mutex<Vec<(String, Vec<&'static str>)>>,
}

impl FakeCms {
    fn master(&self) -> String {
        let versions = self.versions.lock().unwrap();
        versions.last().map(|(r, _)| r.clone()).unwrap_or_default()
    }

    fn uids(&self, reference: &str) -> Option<Vec<&'static str>> {
        let versions = self.versions.lock().unwrap();
        versions
            .iter()
            .find(|(r, _)| r == reference)
            .map(|(_, uids)| uids.clone())
    }

    fn publish(&self, reference: &str, uids: Vec<&'static str>) {
        let mut versions = self.versions.lock().unwrap();
        versions.push((reference.to_string(), uids));
    }

    /// Stop answering for a ref, as the service does for superseded ones
    fn retire(&self, reference: &str) {
        let mut versions = self.versions.lock().unwrap();
        versions.retain(|(r, _)| r != reference);
    }
}

fn doc(uid: &str, day: usize) -> Value {
    json!({
        "id": format!("id-{}", uid),
        "uid": uid,
        "type": "post",
        "first_publication_date": format!("2021-03-{:02}T19:25:28+0000", day),
        "data": {
            "title": format!("Post {}", uid),
            "subtitle": "Pensando em sincronização em vez de ciclos de vida",
            "author": "Joseph Oliveira",
            "banner": {"url": format!("https://images.prismic.io/{}.png", uid)},
            "content": [{
                "heading": "Proin et varius",
                "body": [
                    {"type": "paragraph", "text": "Lorem ipsum dolor sit amet", "spans": [
                        {"start": 0, "end": 5, "type": "strong"}
                    ]},
                    {"type": "list-item", "text": "consectetur", "spans": []}
                ]
            }]
        }
    })
}

async fn api_root(
    State(cms): State<Arc<FakeCms>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if params.get("access_token").map(String::as_str) != Some(TOKEN) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "refs": [
            {"id": "preview", "ref": "preview-ref", "label": "Preview", "isMasterRef": false},
            {"id": "master", "ref": cms.master(), "label": "Master", "isMasterRef": true}
        ]
    }))
    .into_response()
}

async fn search(
    State(cms): State<Arc<FakeCms>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let reference = params.get("ref").cloned().unwrap_or_default();
    let Some(uids) = cms.uids(&reference) else {
        return (StatusCode::BAD_REQUEST, "unknown ref").into_response();
    };
    let q = params.get("q").cloned().unwrap_or_default();

    if let Some(rest) = q.strip_prefix("[[at(my.post.uid, \"") {
        let uid = rest.trim_end_matches("\")]]");
        let results: Vec<Value> = uids
            .iter()
            .enumerate()
            .filter(|(_, u)| **u == uid)
            .map(|(i, u)| doc(u, 20 - i))
            .collect();
        return Json(json!({"page": 1, "next_page": null, "prev_page": null, "results": results}))
            .into_response();
    }

    if q != "[[at(document.type, \"post\")]]" {
        return (StatusCode::BAD_REQUEST, "unexpected predicate").into_response();
    }
    let size: usize = params.get("pageSize").and_then(|s| s.parse().ok()).unwrap_or(20);
    let page: usize = params.get("page").and_then(|s| s.parse().ok()).unwrap_or(1);

    let results: Vec<Value> = uids
        .iter()
        .enumerate()
        .skip((page - 1) * size)
        .take(size)
        .map(|(i, u)| doc(u, 20 - i))
        .collect();
    let next_page = (page * size < uids.len()).then(|| {
        format!(
            "{}/api/v2/documents/search?ref={}&q={}&pageSize={}&page={}&access_token={}",
            cms.base,
            reference,
            "%5B%5Bat%28document.type%2C%20%22post%22%29%5D%5D",
            size,
            page + 1,
            TOKEN
        )
    });

    Json(json!({
        "page": page,
        "results_per_page": size,
        "total_results_size": uids.len(),
        "next_page": next_page,
        "prev_page": null,
        "results": results
    }))
    .into_response()
}

/// Serve the fake CMS on an ephemeral port; returns its API endpoint
async fn spawn_cms() -> (String, Arc<FakeCms>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let cms = Arc::new(FakeCms {
        base: base.clone(),
        versions: Mutex::new(vec![(
            MASTER_REF.to_string(),
            vec!["e", "d", "c", "b", "a"],
        )]),
    });

    let app = Router::new()
        .route("/api/v2", get(api_root))
        .route("/api/v2/documents/search", get(search))
        .with_state(cms.clone());
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    (format!("{}/api/v2", base), cms)
}

fn api_config(endpoint: &str) -> ContentApiConfig {
    ContentApiConfig {
        endpoint: endpoint.to_string(),
        access_token: Some(TOKEN.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn query_and_follow_cursor() {
    let (endpoint, _cms) = spawn_cms().await;
    let client = PrismicClient::new(&api_config(&endpoint)).unwrap();
    let predicates = [Predicate::document_type("post")];

    let first = client
        .query(&predicates, &QueryOptions::default().page_size(2).newest_first())
        .await
        .unwrap();
    let uids: Vec<_> = first.results.iter().filter_map(|d| d.uid.clone()).collect();
    assert_eq!(uids, vec!["e", "d"]);

    let cursor = first.next_cursor().expect("more pages");
    let second = client.fetch_page(&cursor).await.unwrap();
    assert_eq!(second.results[0].uid.as_deref(), Some("c"));

    let all = spacetraveling::client::query_all(
        &client,
        &predicates,
        &QueryOptions::default().page_size(2),
    )
    .await
    .unwrap();
    assert_eq!(all.len(), 5);
}

#[tokio::test]
async fn get_by_uid() {
    let (endpoint, _cms) = spawn_cms().await;
    let client = PrismicClient::new(&api_config(&endpoint)).unwrap();

    let doc = client.get_by_uid("post", "c").await.unwrap().unwrap();
    assert_eq!(doc.id, "id-c");
    assert!(client.get_by_uid("post", "zzz").await.unwrap().is_none());
}

#[tokio::test]
async fn rejected_ref_is_resolved_again() {
    let (endpoint, cms) = spawn_cms().await;
    let client = PrismicClient::new(&api_config(&endpoint)).unwrap();
    assert!(client.get_by_uid("post", "f").await.unwrap().is_none());

    cms.publish("second-ref", vec!["f", "e", "d", "c", "b", "a"]);
    cms.retire(MASTER_REF);

    let doc = client.get_by_uid("post", "f").await.unwrap().unwrap();
    assert_eq!(doc.id, "id-f");
}

#[tokio::test]
async fn expired_ref_picks_up_new_content() {
    let (endpoint, cms) = spawn_cms().await;
    let client = PrismicClient::new(&ContentApiConfig {
        ref_ttl_secs: 0,
        ..api_config(&endpoint)
    })
    .unwrap();
    assert!(client.get_by_uid("post", "f").await.unwrap().is_none());

    // The old ref keeps answering, with the old content
    cms.publish("second-ref", vec!["f", "e", "d", "c", "b", "a"]);

    assert!(client.get_by_uid("post", "f").await.unwrap().is_some());
}

#[tokio::test]
async fn error_statuses_are_reported() {
    let (endpoint, _cms) = spawn_cms().await;

    let client = PrismicClient::new(&api_config(&endpoint)).unwrap();
    let err = client
        .fetch_page(&Cursor::new(format!("{}/documents/search?ref=stale", endpoint)))
        .await
        .unwrap_err();
    assert!(matches!(&err, Error::Status { status, .. } if *status == StatusCode::BAD_REQUEST));
    assert!(err.is_upstream());

    let anonymous = PrismicClient::new(&ContentApiConfig {
        access_token: None,
        ..api_config(&endpoint)
    })
    .unwrap();
    let err = anonymous.get_by_uid("post", "a").await.unwrap_err();
    match err {
        Error::Status { status, url } => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert!(!url.contains("access_token"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

fn site(dir: &std::path::Path, endpoint: &str) -> Site {
    let mut config = SiteConfig::default();
    config.content_api = api_config(endpoint);
    config.listing.page_size = 2;
    Site::with_config(dir, config)
}

#[tokio::test]
async fn generate_site_end_to_end() {
    let (endpoint, _cms) = spawn_cms().await;
    let dir = tempfile::tempdir().unwrap();
    let site = site(dir.path(), &endpoint);

    let report = spacetraveling::commands::generate::run(&site).await.unwrap();
    assert_eq!(report.listing_pages, 3);
    assert_eq!(report.posts, 5);
    assert_eq!(report.static_paths.slugs, vec!["e", "d", "c", "b", "a"]);

    let last = std::fs::read_to_string(site.public_dir.join("page/3/index.html")).unwrap();
    for uid in ["a", "b", "c", "d", "e"] {
        assert!(last.contains(&format!(r#"href="/post/{}/""#, uid)));
    }
    assert!(!last.contains(r#"class="load-more""#));

    let post = std::fs::read_to_string(site.public_dir.join("post/c/index.html")).unwrap();
    assert!(post.contains("18 Mar 2021"));
    assert!(post.contains("<p><strong>Lorem</strong> ipsum dolor sit amet</p>"));
    assert!(post.contains("<ul><li>consectetur</li></ul>"));
    assert!(post.contains(r#"<span class="reading-time">1 min</span>"#));
}

#[tokio::test]
async fn preview_server_renders_posts_published_after_start() {
    let (endpoint, cms) = spawn_cms().await;
    let dir = tempfile::tempdir().unwrap();
    let site = site(dir.path(), &endpoint);
    let app = router(Arc::new(
        ServerState::new(&site, site.client().unwrap()).unwrap(),
    ));

    let get = |uri: &'static str| {
        let app = app.clone();
        async move {
            let resp = app
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .expect("oneshot fail");
            let status = resp.status();
            let data = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            (status, String::from_utf8(data.to_vec()).unwrap())
        }
    };

    assert_eq!(get("/post/a/").await.0, StatusCode::OK);

    cms.publish("second-ref", vec!["f", "e", "d", "c", "b", "a"]);
    cms.retire(MASTER_REF);

    let (status, body) = get("/post/f/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Post f | spacetraveling"));
    assert!(site.public_dir.join("post/f/index.html").exists());
}
