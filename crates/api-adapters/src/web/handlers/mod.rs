pub mod accounts;
pub mod chapters;
pub mod stories;
pub mod volumes;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

use domains::AppError;

use crate::state::AppState;
use crate::web::error::ApiResult;

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn metrics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let body = state
        .metrics
        .render()
        .map_err(|e| AppError::internal(format!("metrics encoding failed: {e}")))?;
    Ok((
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        body,
    ))
}
