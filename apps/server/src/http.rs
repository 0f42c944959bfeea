//! HTTP shell: one translate endpoint plus a liveness probe.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{instrument, warn};
use uuid::Uuid;

use transdoc_core::{DocumentService, PageTitleSource, Pipeline, TextGenerator, TranslateRequest};
use transdoc_shared::TransdocError;

/// Build the service router.
pub(crate) fn router<G, S, T>(pipeline: Arc<Pipeline<G, S, T>>) -> Router
where
    G: TextGenerator + 'static,
    S: DocumentService + 'static,
    T: PageTitleSource + 'static,
{
    Router::new()
        .route("/", post(translate::<G, S, T>))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(pipeline)
}

#[derive(Debug, Serialize)]
struct TranslateResponse {
    document_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    share_error: Option<String>,
}

#[instrument(skip_all, fields(request_id = %Uuid::now_v7()))]
async fn translate<G, S, T>(
    State(pipeline): State<Arc<Pipeline<G, S, T>>>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateResponse>, ApiError>
where
    G: TextGenerator,
    S: DocumentService,
    T: PageTitleSource,
{
    let Json(request) =
        payload.map_err(|e| TransdocError::invalid_input(e.body_text()))?;

    let report = pipeline.run(&request).await?;
    Ok(Json(TranslateResponse {
        share_error: report.share_error().map(String::from),
        document_url: report.handle.url,
    }))
}

async fn healthz() -> &'static str {
    "ok"
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// [`TransdocError`] rendered as a status code and `{error}` body.
#[derive(Debug)]
pub(crate) struct ApiError(TransdocError);

impl From<TransdocError> for ApiError {
    fn from(e: TransdocError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            TransdocError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            TransdocError::EmptyResponse
            | TransdocError::Parse { .. }
            | TransdocError::Generation(_)
            | TransdocError::DocumentCreate(_)
            | TransdocError::DocumentMutate { .. }
            | TransdocError::DocumentShare(_)
            | TransdocError::Network(_) => StatusCode::BAD_GATEWAY,
            TransdocError::Config { .. } | TransdocError::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), kind = self.0.kind(), error = %self.0, "request failed");
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
