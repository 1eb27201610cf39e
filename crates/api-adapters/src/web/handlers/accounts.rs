//! Sessions and the signed-in reader's own data.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use domains::{AuthUser, Bookmark, Preferences, RatingAggregate};
use services::{BookmarkInput, Credentials, Session};

use crate::state::AppState;
use crate::web::error::ApiResult;
use crate::web::extract::{ApiJson, ApiPath, CurrentUser};

#[derive(Debug, Deserialize)]
pub struct RatingInput {
    pub value: u8,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    let session = state.accounts.register(credentials).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.accounts.login(credentials).await?))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<AuthUser> {
    Json(user)
}

pub async fn preferences(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Preferences>> {
    Ok(Json(state.preferences.get_preferences(&user).await?))
}

pub async fn add_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(story_id): ApiPath<String>,
) -> ApiResult<Json<Preferences>> {
    Ok(Json(state.preferences.add_favorite(&user, &story_id).await?))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(story_id): ApiPath<String>,
) -> ApiResult<Json<Preferences>> {
    Ok(Json(state.preferences.remove_favorite(&user, &story_id).await?))
}

pub async fn set_bookmark(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(story_id): ApiPath<String>,
    ApiJson(input): ApiJson<BookmarkInput>,
) -> ApiResult<Json<Bookmark>> {
    Ok(Json(state.preferences.set_bookmark(&user, &story_id, input).await?))
}

pub async fn remove_bookmark(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(story_id): ApiPath<String>,
) -> ApiResult<Json<Preferences>> {
    Ok(Json(state.preferences.remove_bookmark(&user, &story_id).await?))
}

pub async fn rate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(story_id): ApiPath<String>,
    ApiJson(input): ApiJson<RatingInput>,
) -> ApiResult<Json<RatingAggregate>> {
    Ok(Json(state.preferences.rate_story(&user, &story_id, input.value).await?))
}
