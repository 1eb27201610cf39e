//! Reading, editing and discussing a single chapter.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use domains::{CascadeSummary, Chapter, Comment};
use services::{ChapterPatch, ChapterView, CommentThread, NewComment, ViewOutcome};

use crate::state::AppState;
use crate::web::error::ApiResult;
use crate::web::extract::{AdminUser, ApiJson, ApiPath, CurrentUser, MaybeUser};

type ChapterPath = ApiPath<(String, Uuid)>;

pub async fn read(
    State(state): State<AppState>,
    viewer: MaybeUser,
    ApiPath((story_id, chapter_id)): ChapterPath,
) -> ApiResult<Json<ChapterView>> {
    let view = state
        .content
        .read_chapter(&story_id, chapter_id, viewer.viewer())
        .await?;
    Ok(Json(view))
}

pub async fn update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath((story_id, chapter_id)): ChapterPath,
    ApiJson(patch): ApiJson<ChapterPatch>,
) -> ApiResult<Json<Chapter>> {
    Ok(Json(state.content.update_chapter(&story_id, chapter_id, patch).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath((story_id, chapter_id)): ChapterPath,
) -> ApiResult<Json<CascadeSummary>> {
    Ok(Json(state.content.delete_chapter(&story_id, chapter_id).await?))
}

pub async fn record_view(
    State(state): State<AppState>,
    viewer: MaybeUser,
    ApiPath((story_id, chapter_id)): ChapterPath,
) -> ApiResult<Json<ViewOutcome>> {
    let outcome = state
        .content
        .record_chapter_view(&story_id, chapter_id, viewer.viewer())
        .await?;
    if outcome.counted {
        state.metrics.chapter_viewed();
    }
    Ok(Json(outcome))
}

pub async fn list_comments(
    State(state): State<AppState>,
    ApiPath((story_id, chapter_id)): ChapterPath,
) -> ApiResult<Json<CommentThread>> {
    Ok(Json(state.comments.list_comments(&story_id, chapter_id).await?))
}

pub async fn post_comment(
    State(state): State<AppState>,
    CurrentUser(author): CurrentUser,
    ApiPath((story_id, chapter_id)): ChapterPath,
    ApiJson(input): ApiJson<NewComment>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment = state
        .comments
        .post_comment(&author, &story_id, chapter_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: u64,
}

pub async fn delete_comment(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(comment_id): ApiPath<Uuid>,
) -> ApiResult<Json<Deleted>> {
    let deleted = state.comments.delete_comment_cascade(comment_id).await?;
    Ok(Json(Deleted { deleted }))
}
