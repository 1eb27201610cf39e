//! Row structs and their mapping onto domain models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use tracing::error;
use uuid::Uuid;

use domains::{
    AppError, Bookmark, Chapter, ChapterStub, Comment, LatestChapter, Preferences, RatingAggregate,
    Result, Story, StorySummary, User, Volume,
};

pub(super) const STORY_COLUMNS: &str = "id, title, author, aliases, description, cover_image, \
    status, tags, view_count, rating_mean, rating_count, is_in_banner, banner_priority, volumes, \
    created_at, last_updated_at";

pub(super) const CHAPTER_COLUMNS: &str =
    "id, story_id, volume_id, title, content, is_raw, view_count, created_at, updated_at";

pub(super) const COMMENT_COLUMNS: &str =
    "id, story_id, chapter_id, user_id, username, parent_id, content, created_at";

/// Translates driver errors; unique violations surface as `Conflict`.
pub(super) fn db_err(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return AppError::Conflict(db.message().to_string());
        }
    }
    error!(error = %err, "postgres query failed");
    AppError::internal("database failure")
}

pub(super) fn count_from_db(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

pub(super) fn count_to_db(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[derive(Debug, FromRow)]
pub(super) struct StoryRow {
    pub id: String,
    pub title: String,
    pub author: String,
    pub aliases: Vec<String>,
    pub description: String,
    pub cover_image: Option<String>,
    pub status: String,
    pub tags: Vec<String>,
    pub view_count: i64,
    pub rating_mean: f64,
    pub rating_count: i64,
    pub is_in_banner: bool,
    pub banner_priority: i32,
    pub volumes: Json<Vec<Volume>>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl TryFrom<StoryRow> for Story {
    type Error = AppError;

    fn try_from(row: StoryRow) -> Result<Self> {
        let status = row
            .status
            .parse()
            .map_err(|_| AppError::internal(format!("story {} has status {:?}", row.id, row.status)))?;
        Ok(Story {
            id: row.id,
            title: row.title,
            author: row.author,
            aliases: row.aliases,
            description: row.description,
            cover_image: row.cover_image,
            status,
            tags: row.tags.into_iter().collect(),
            view_count: count_from_db(row.view_count),
            rating: RatingAggregate {
                mean: row.rating_mean,
                count: count_from_db(row.rating_count),
            },
            is_in_banner: row.is_in_banner,
            banner_priority: row.banner_priority,
            volumes: row.volumes.0,
            created_at: row.created_at,
            last_updated_at: row.last_updated_at,
        })
    }
}

/// A story row joined with its published-chapter figures.
#[derive(Debug, FromRow)]
pub(super) struct CatalogRow {
    #[sqlx(flatten)]
    pub story: StoryRow,
    pub chapter_count: i64,
    pub latest_id: Option<Uuid>,
    pub latest_title: Option<String>,
    pub latest_created_at: Option<DateTime<Utc>>,
}

impl TryFrom<CatalogRow> for StorySummary {
    type Error = AppError;

    fn try_from(row: CatalogRow) -> Result<Self> {
        let latest = match (row.latest_id, row.latest_title, row.latest_created_at) {
            (Some(id), Some(title), Some(created_at)) => Some(LatestChapter { id, title, created_at }),
            _ => None,
        };
        let mut story = Story::try_from(row.story)?;
        story.volumes.clear();
        Ok(StorySummary::from_story(story, count_from_db(row.chapter_count), latest))
    }
}

#[derive(Debug, FromRow)]
pub(super) struct ChapterRow {
    pub id: Uuid,
    pub story_id: String,
    pub volume_id: Uuid,
    pub title: String,
    pub content: String,
    pub is_raw: bool,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ChapterRow> for Chapter {
    fn from(row: ChapterRow) -> Self {
        Chapter {
            id: row.id,
            story_id: row.story_id,
            volume_id: row.volume_id,
            title: row.title,
            content: row.content,
            is_raw: row.is_raw,
            view_count: count_from_db(row.view_count),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct ChapterStubRow {
    pub id: Uuid,
    pub title: String,
    pub view_count: i64,
    pub is_raw: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ChapterStubRow> for ChapterStub {
    fn from(row: ChapterStubRow) -> Self {
        ChapterStub {
            id: row.id,
            title: row.title,
            view_count: count_from_db(row.view_count),
            is_raw: row.is_raw,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct CommentRow {
    pub id: Uuid,
    pub story_id: String,
    pub chapter_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            story_id: row.story_id,
            chapter_id: row.chapter_id,
            user_id: row.user_id,
            username: row.username,
            parent_id: row.parent_id,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(super) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self> {
        let role = row
            .role
            .parse()
            .map_err(|_| AppError::internal(format!("user {} has role {:?}", row.id, row.role)))?;
        Ok(User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(super) struct PreferencesRow {
    pub user_id: Uuid,
    pub favorites: Vec<String>,
    pub bookmarks: Json<BTreeMap<String, Bookmark>>,
    pub ratings: Json<BTreeMap<String, u8>>,
}

impl From<PreferencesRow> for Preferences {
    fn from(row: PreferencesRow) -> Self {
        Preferences {
            user_id: row.user_id,
            favorites: row.favorites.into_iter().collect(),
            bookmarks: row.bookmarks.0,
            ratings: row.ratings.0,
        }
    }
}
