//! Catalog, story documents and the banner carousel.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use domains::{CascadeSummary, CatalogPage, Story};
use services::{BannerEntry, BannerUpdate, CatalogParams, NewStory, StoryDetail, StoryPatch};

use crate::state::AppState;
use crate::web::error::ApiResult;
use crate::web::extract::{AdminUser, ApiJson, ApiPath, ApiQuery, MaybeUser};

pub async fn search(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<CatalogParams>,
) -> ApiResult<Json<CatalogPage>> {
    Ok(Json(state.catalog.search(params).await?))
}

pub async fn create(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiJson(input): ApiJson<NewStory>,
) -> ApiResult<(StatusCode, Json<Story>)> {
    let story = state.content.create_story(input).await?;
    Ok((StatusCode::CREATED, Json(story)))
}

pub async fn detail(
    State(state): State<AppState>,
    viewer: MaybeUser,
    ApiPath(story_id): ApiPath<String>,
) -> ApiResult<Json<StoryDetail>> {
    Ok(Json(state.content.get_story_detail(&story_id, viewer.viewer()).await?))
}

pub async fn update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(story_id): ApiPath<String>,
    ApiJson(patch): ApiJson<StoryPatch>,
) -> ApiResult<Json<Story>> {
    Ok(Json(state.content.update_story(&story_id, patch).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(story_id): ApiPath<String>,
) -> ApiResult<Json<CascadeSummary>> {
    Ok(Json(state.content.delete_story(&story_id).await?))
}

pub async fn set_banner(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(story_id): ApiPath<String>,
    ApiJson(update): ApiJson<BannerUpdate>,
) -> ApiResult<Json<BannerEntry>> {
    Ok(Json(state.catalog.set_banner(&story_id, update).await?))
}

pub async fn banner(State(state): State<AppState>) -> ApiResult<Json<Vec<BannerEntry>>> {
    Ok(Json(state.catalog.banner_stories().await?))
}
