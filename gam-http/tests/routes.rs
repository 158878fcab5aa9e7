use std::path::PathBuf;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use gam_core::{AppConfig, Repository, RepositoryOptions};
use gam_http::{router, AppState};
use gam_store::gpkg::build_geopackage;
use gam_store::{CsvDirSource, GeoPackageSource, NullSource};
use tower::ServiceExt;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../data")
}

fn app() -> axum::Router {
    let repo = Repository::load(&CsvDirSource::new(data_dir()), RepositoryOptions::default());
    router(AppState::new(repo, AppConfig::default().references))
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    let res = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn healthz_is_ok() {
    let (status, _, body) = get(app(), "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn index_defaults_to_first_two_features() {
    let (status, _, body) = get(app(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<option value=\"Erratic or glaciotectonic raft\" selected>"));
    assert!(body.contains("<option value=\"Glauconite\" selected>"));
    assert!(body.contains("Foundation Assessment Comparison"));
    assert!(body.contains("<footer class=\"loaded\">Data loaded "));
}

#[tokio::test]
async fn index_renders_selected_features() {
    let (_, _, body) = get(app(), "/?feature1=Sand&feature2=Nonexistent%20Feature").await;
    assert!(body.contains("Coarse soil units (including gravel)"));
    assert!(body.contains("Scour - removal of lateral support"));
    assert!(body.contains("No data available for Feature 2"));
    assert!(body.contains("No engineering comments available"));
    assert!(body.contains("<span class=\"lower-constraint\">Lower Constraint</span>"));
}

#[tokio::test]
async fn features_endpoint_lists_sorted_names() {
    let (_, _, body) = get(app(), "/api/features").await;
    let names: Vec<String> = serde_json::from_str(&body).unwrap();
    assert_eq!(names.len(), 9);
    assert_eq!(names[0], "Erratic or glaciotectonic raft");
    assert!(names.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn compare_endpoint_returns_the_view_model() {
    let (_, _, body) = get(app(), "/api/compare?feature1=Sand&feature2=Gravel").await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let sand = &json["panels"][0];
    assert_eq!(sand["name"], "Sand");
    assert_eq!(sand["assessments"][2]["text"], "Higher Constraint");
    assert_eq!(
        sand["details"]["constraints"][0]["items"][0],
        "Coarse soil units (including gravel)"
    );
    assert_eq!(json["panels"][1]["details"]["constraints"][0]["domain"], "geological");
}

#[tokio::test]
async fn report_is_a_text_attachment() {
    let (status, headers, body) = get(app(), "/report?feature1=Sand&feature2=Gravel").await;
    assert_eq!(status, StatusCode::OK);
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment"));
    assert!(body.contains("Comparison: Sand vs Gravel"));
    assert!(body.contains("Piles: Lower Constraint (Low complexity)"));
}

#[tokio::test]
async fn missing_data_degrades_to_placeholders() {
    let repo = Repository::load(&NullSource, RepositoryOptions::default());
    let app = router(AppState::new(repo, Vec::new()));

    let (status, _, body) = get(app.clone(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("class=\"notice\""));
    assert!(body.contains("No features available"));
    assert!(body.contains("Data not available"));

    let (_, _, body) = get(app, "/api/status").await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["features"], 0);
    assert_eq!(json["notices"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn serves_from_a_built_geopackage() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("geological_data.gpkg");
    build_geopackage(&CsvDirSource::new(data_dir()), &out).unwrap();

    let repo = Repository::load(&GeoPackageSource::new(&out), RepositoryOptions::default());
    let app = router(AppState::new(repo, Vec::new()));
    let (_, _, body) = get(app, "/api/status").await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(json["source"].as_str().unwrap().starts_with("geopackage"));
    assert_eq!(json["features"], 9);
    assert!(json["notices"].as_array().unwrap().is_empty());
}
