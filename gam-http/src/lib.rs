//! HTTP surface of the matrix: the comparison page plus JSON and text endpoints.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use gam_core::{default_selection, render_text, Comparison, Reference, Repository, RepositoryStatus};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub mod page;

use page::{render_page, PageInput};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub references: Arc<Vec<Reference>>,
}

impl AppState {
    pub fn new(repo: Repository, references: Vec<Reference>) -> Self {
        Self {
            repo: Arc::new(repo),
            references: Arc::new(references),
        }
    }

    /// Requested names, falling back to the default selection for each missing one.
    fn selection(&self, q: &SelectionQuery) -> (String, String) {
        let (first, second) = default_selection(&self.repo.feature_names());
        let pick = |v: &Option<String>, default: String| match v.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default,
        };
        (pick(&q.feature1, first), pick(&q.feature2, second))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SelectionQuery {
    pub feature1: Option<String>,
    pub feature2: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/features", get(features))
        .route("/api/compare", get(compare))
        .route("/api/status", get(status))
        .route("/report", get(report))
        .route("/healthz", get(healthz))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn index(State(state): State<AppState>, Query(q): Query<SelectionQuery>) -> Html<String> {
    let (first, second) = state.selection(&q);
    let comparison = Comparison::build(&state.repo, &first, &second);
    let names = state.repo.feature_names();
    Html(render_page(&PageInput {
        names: &names,
        comparison: &comparison,
        notices: state.repo.notices(),
        references: &state.references,
        loaded_at: state.repo.loaded_at(),
    }))
}

async fn features(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.repo.feature_names())
}

async fn compare(State(state): State<AppState>, Query(q): Query<SelectionQuery>) -> Json<Comparison> {
    let (first, second) = state.selection(&q);
    Json(Comparison::build(&state.repo, &first, &second))
}

async fn status(State(state): State<AppState>) -> Json<RepositoryStatus> {
    Json(state.repo.status())
}

async fn report(State(state): State<AppState>, Query(q): Query<SelectionQuery>) -> impl IntoResponse {
    let (first, second) = state.selection(&q);
    let comparison = Comparison::build(&state.repo, &first, &second);
    let body = render_text(&comparison, Utc::now());
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"geo-assessment-report.txt\"",
            ),
        ],
        body,
    )
}

async fn healthz() -> &'static str {
    "ok"
}
