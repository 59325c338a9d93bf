use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use dnf::SearchConfig;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;
use tower::ServiceExt;

// {A,B} -> 100, 101 (101 expired); {} -> 200
fn write_corpus(path: &Path) {
    let corpus = json!({
        "documents": [
            { "id": 100, "conjunctions": [[{"key":"A","value":"a"},{"key":"B","value":"b"}]] },
            { "id": 101, "valid_until": "2001-01-01T00:00:00Z",
              "conjunctions": [[{"key":"A","value":"a"},{"key":"B","value":"b"}]] },
            { "id": 200, "conjunctions": [[]] }
        ]
    });
    fs::write(path, serde_json::to_vec(&corpus).unwrap()).unwrap();
}

async fn post(app: Router, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
    let mut req = Request::post(uri).header("content-type", "application/json");
    if let Some(t) = token {
        req = req.header("X-ADMIN-TOKEN", t);
    }
    let req = req.body(Body::from(body.to_string())).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn conditions(pairs: &[(&str, &str)]) -> Value {
    let list: Vec<Value> = pairs.iter().map(|(k, v)| json!({"key": k, "value": v})).collect();
    json!({ "conditions": list })
}

#[tokio::test]
async fn search_returns_valid_matches() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corpus.json");
    write_corpus(&path);
    let app = server::build_app(path, SearchConfig::default().with_max_workers(2)).unwrap();

    let (status, json) = post(app.clone(), "/search", conditions(&[("A", "a"), ("B", "b")]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["documents"], json!([100, 200]));
    assert_eq!(json["total_hits"], 2);
    assert_eq!(json["generation"], 0);

    let (status, json) = post(app, "/search", conditions(&[("A", "a")]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["documents"], json!([200]));
}

#[tokio::test]
async fn invalid_queries_are_bad_requests() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corpus.json");
    write_corpus(&path);
    let app = server::build_app(path, SearchConfig::default()).unwrap();

    let (status, json) = post(app.clone(), "/search", conditions(&[]), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("no conditions"));

    let (status, json) = post(app.clone(), "/search", json!({}), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("no conditions"));

    let (status, _) = post(app.clone(), "/search", conditions(&[("A", "a"), ("A", "b")]), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(app, "/search", conditions(&[("Z", "z")]), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reload_requires_admin_token() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corpus.json");
    write_corpus(&path);
    // ADMIN_TOKEN is unset in the test environment.
    let app = server::build_app(path, SearchConfig::default()).unwrap();
    let (status, _) = post(app, "/index/reload", json!({}), Some("anything")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[test]
fn missing_corpus_fails_startup() {
    let dir = tempdir().unwrap();
    assert!(server::build_app(dir.path().join("nope.json"), SearchConfig::default()).is_err());
}

#[tokio::test]
async fn reload_publishes_new_generation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corpus.json");
    write_corpus(&path);
    let state = server::AppState::load(path.clone(), SearchConfig::default(), Some("s3cret".into())).unwrap();
    let app = server::router(state);

    let (status, _) = post(app.clone(), "/index/reload", json!({}), Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let corpus = json!({ "documents": [ { "id": 7, "conjunctions": [[{"key":"A","value":"a"}]] } ] });
    fs::write(&path, serde_json::to_vec(&corpus).unwrap()).unwrap();
    let (status, json) = post(app.clone(), "/index/reload", json!({}), Some("s3cret")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["generation"], 1);

    let (status, json) = post(app, "/search", conditions(&[("A", "a")]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["documents"], json!([7]));
    assert_eq!(json["generation"], 1);
}

#[tokio::test]
async fn broken_corpus_keeps_serving_previous_generation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corpus.json");
    write_corpus(&path);
    let state = server::AppState::load(path.clone(), SearchConfig::default(), Some("t".into())).unwrap();
    let app = server::router(state);

    fs::write(&path, b"{ not json").unwrap();
    let (status, _) = post(app.clone(), "/index/reload", json!({}), Some("t")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, json) = post(app, "/search", conditions(&[("A", "a")]), None).await;
    assert_eq!(json["documents"], json!([200]));
    assert_eq!(json["generation"], 0);
}

#[tokio::test]
async fn expired_deadline_is_gateway_timeout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corpus.json");
    write_corpus(&path);
    let app = server::build_app(path, SearchConfig::default().with_timeout(Duration::ZERO)).unwrap();

    let (status, json) = post(app, "/search", conditions(&[("A", "a"), ("B", "b")]), None).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(json["error"].as_str().unwrap().contains("deadline"));
}
