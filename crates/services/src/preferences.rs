//! Per-user favorites, bookmarks and ratings. The stored record is the
//! single source of truth; it is created on first write.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use domains::rating::validate_rating;
use domains::{
    AppError, AuthUser, Bookmark, ChapterRepository, Preferences, RatingAggregate, Result,
    StoryRepository, UserRepository,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkInput {
    pub chapter_id: Uuid,
    #[serde(default)]
    pub progress_percent: u8,
}

pub struct PreferenceService {
    users: Arc<dyn UserRepository>,
    stories: Arc<dyn StoryRepository>,
    chapters: Arc<dyn ChapterRepository>,
}

impl PreferenceService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        stories: Arc<dyn StoryRepository>,
        chapters: Arc<dyn ChapterRepository>,
    ) -> Self {
        Self { users, stories, chapters }
    }

    pub async fn get_preferences(&self, user: &AuthUser) -> Result<Preferences> {
        Ok(self
            .users
            .get_preferences(user.user_id)
            .await?
            .unwrap_or_else(|| Preferences::empty(user.user_id)))
    }

    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn add_favorite(&self, user: &AuthUser, story_id: &str) -> Result<Preferences> {
        self.ensure_story(story_id).await?;
        let mut prefs = self.get_preferences(user).await?;
        if prefs.favorites.insert(story_id.to_string()) {
            self.users.save_preferences(&prefs).await?;
        }
        Ok(prefs)
    }

    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn remove_favorite(&self, user: &AuthUser, story_id: &str) -> Result<Preferences> {
        let mut prefs = self.get_preferences(user).await?;
        if prefs.favorites.remove(story_id) {
            self.users.save_preferences(&prefs).await?;
        }
        Ok(prefs)
    }

    #[instrument(skip(self, user, input), fields(user_id = %user.user_id))]
    pub async fn set_bookmark(&self, user: &AuthUser, story_id: &str, input: BookmarkInput) -> Result<Bookmark> {
        if input.progress_percent > 100 {
            return Err(AppError::validation("progressPercent must be between 0 and 100"));
        }
        let belongs = self
            .chapters
            .get_chapter(input.chapter_id)
            .await?
            .is_some_and(|c| c.story_id == story_id);
        if !belongs {
            return Err(AppError::not_found("Chapter", input.chapter_id));
        }

        let bookmark = Bookmark {
            chapter_id: input.chapter_id,
            progress_percent: input.progress_percent,
            last_read_at: Utc::now(),
        };
        let mut prefs = self.get_preferences(user).await?;
        prefs.bookmarks.insert(story_id.to_string(), bookmark.clone());
        self.users.save_preferences(&prefs).await?;
        Ok(bookmark)
    }

    pub async fn remove_bookmark(&self, user: &AuthUser, story_id: &str) -> Result<Preferences> {
        let mut prefs = self.get_preferences(user).await?;
        if prefs.bookmarks.remove(story_id).is_some() {
            self.users.save_preferences(&prefs).await?;
        }
        Ok(prefs)
    }

    /// One rating per user and story. The duplicate check, the aggregate and
    /// the per-user record are a single store write.
    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn rate_story(&self, user: &AuthUser, story_id: &str, value: u8) -> Result<RatingAggregate> {
        validate_rating(value)?;
        let aggregate = self
            .stories
            .record_user_rating(user.user_id, story_id, value)
            .await?;
        info!(story_id, value, mean = aggregate.mean, count = aggregate.count, "story rated");
        Ok(aggregate)
    }

    async fn ensure_story(&self, story_id: &str) -> Result<()> {
        match self.stories.get_story(story_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found("Story", story_id)),
        }
    }
}
