use crate::infra::{AppState, RouteSettings};
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use tracing::info;
use uplift_policy::error::AppError;
use uplift_policy::models::PredictiveModel;
use uplift_policy::scoring::{
    ContactPolicy, RankedRecord, ScoringRequest, ScoringService, Summary,
};
use uplift_policy::table::FeatureTable;

const UPLOAD_FIELD: &str = "file";

pub(crate) struct ScoringState<T, C> {
    pub(crate) service: Arc<ScoringService<T, C>>,
    pub(crate) settings: RouteSettings,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ScoreParams {
    pub(crate) margin: Option<f64>,
    pub(crate) cost: Option<f64>,
    pub(crate) topn: Option<usize>,
    pub(crate) policy: Option<String>,
}

/// `top` holds at most `response_top_limit` records; `summary` covers every selected contact.
#[derive(Debug, Serialize)]
pub(crate) struct ScoreResponse {
    pub(crate) summary: Summary,
    pub(crate) top: Vec<RankedRecord>,
    pub(crate) top_truncated: bool,
    pub(crate) best_n: Option<usize>,
    pub(crate) rejected: usize,
    pub(crate) scored: usize,
    pub(crate) generated_at: DateTime<Utc>,
}

pub(crate) fn with_scoring_routes<T, C>(
    service: Arc<ScoringService<T, C>>,
    settings: RouteSettings,
) -> Router
where
    T: PredictiveModel + 'static,
    C: PredictiveModel + 'static,
{
    let upload_limit = settings.upload_max_bytes;
    let state = Arc::new(ScoringState { service, settings });

    Router::new()
        .route(
            "/score",
            post(score_endpoint::<T, C>).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(state)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn score_endpoint<T, C>(
    State(state): State<Arc<ScoringState<T, C>>>,
    Query(params): Query<ScoreParams>,
    multipart: Multipart,
) -> Result<Json<ScoreResponse>, AppError>
where
    T: PredictiveModel + 'static,
    C: PredictiveModel + 'static,
{
    let policy = match params.policy.as_deref() {
        Some(raw) => raw.parse::<ContactPolicy>()?,
        None => ContactPolicy::BestN,
    };
    let request = ScoringRequest::new(
        params.margin.unwrap_or(state.settings.margin),
        params.cost.unwrap_or(state.settings.cost),
        policy,
    )
    .with_top_n(params.topn);

    let upload = read_upload(multipart, state.settings.upload_max_bytes).await?;

    // Parsing, encoding and inference are CPU-bound.
    let service = Arc::clone(&state.service);
    let outcome = tokio::task::spawn_blocking(move || {
        let table = FeatureTable::from_reader(Cursor::new(upload))?;
        service.score_table(&table, &request).map_err(AppError::from)
    })
    .await
    .map_err(axum::Error::new)??;

    info!(
        rows = outcome.scored,
        rejected = outcome.rejected.len(),
        contacts = outcome.summary.contacts,
        %policy,
        "scored upload"
    );

    let best_n = outcome.selection.best_n();
    let mut top = outcome.selection.records;
    let top_truncated = top.len() > state.settings.response_top_limit;
    top.truncate(state.settings.response_top_limit);

    Ok(Json(ScoreResponse {
        summary: outcome.summary,
        top,
        top_truncated,
        best_n,
        rejected: outcome.rejected.len(),
        scored: outcome.scored,
        generated_at: Utc::now(),
    }))
}

async fn read_upload(mut multipart: Multipart, limit: usize) -> Result<Vec<u8>, AppError> {
    let upload_error = |err: MultipartError| {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::UploadTooLarge { limit }
        } else {
            AppError::Upload(err.body_text())
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field.bytes().await.map_err(upload_error)?;
            return Ok(bytes.to_vec());
        }
    }

    Err(AppError::Upload(format!(
        "multipart form is missing the '{UPLOAD_FIELD}' field"
    )))
}
