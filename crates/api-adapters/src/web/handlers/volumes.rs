use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domains::{CascadeSummary, Chapter, Volume};
use services::NewChapter;

use crate::state::AppState;
use crate::web::error::ApiResult;
use crate::web::extract::{AdminUser, ApiJson, ApiPath};

#[derive(Debug, Deserialize)]
pub struct VolumeTitle {
    pub title: String,
}

/// Full replacement order for a reorder request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reorder {
    pub ordered_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ordering {
    pub ordered_ids: Vec<Uuid>,
}

pub async fn add(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(story_id): ApiPath<String>,
    ApiJson(body): ApiJson<VolumeTitle>,
) -> ApiResult<(StatusCode, Json<Volume>)> {
    let volume = state.content.add_volume(&story_id, &body.title).await?;
    Ok((StatusCode::CREATED, Json(volume)))
}

pub async fn reorder(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(story_id): ApiPath<String>,
    ApiJson(body): ApiJson<Reorder>,
) -> ApiResult<Json<Ordering>> {
    let ordered_ids = state
        .content
        .reorder_volumes(&story_id, &body.ordered_ids)
        .await?;
    Ok(Json(Ordering { ordered_ids }))
}

pub async fn rename(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath((story_id, volume_id)): ApiPath<(String, Uuid)>,
    ApiJson(body): ApiJson<VolumeTitle>,
) -> ApiResult<StatusCode> {
    state
        .content
        .rename_volume(&story_id, volume_id, &body.title)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath((story_id, volume_id)): ApiPath<(String, Uuid)>,
) -> ApiResult<Json<CascadeSummary>> {
    Ok(Json(state.content.delete_volume(&story_id, volume_id).await?))
}

pub async fn add_chapter(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath((story_id, volume_id)): ApiPath<(String, Uuid)>,
    ApiJson(input): ApiJson<NewChapter>,
) -> ApiResult<(StatusCode, Json<Chapter>)> {
    let chapter = state.content.add_chapter(&story_id, volume_id, input).await?;
    Ok((StatusCode::CREATED, Json(chapter)))
}

pub async fn reorder_chapters(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath((story_id, volume_id)): ApiPath<(String, Uuid)>,
    ApiJson(body): ApiJson<Reorder>,
) -> ApiResult<Json<Ordering>> {
    let ordered_ids = state
        .content
        .reorder_chapters(&story_id, volume_id, &body.ordered_ids)
        .await?;
    Ok(Json(Ordering { ordered_ids }))
}
