//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be used by the binary.
//! Multi-collection writes (chapter + story, cascades) are single port calls
//! so that an adapter can run them inside one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::catalog::{CatalogPage, CatalogQuery};
use crate::errors::Result;
use crate::models::{
    AuthUser, CascadeSummary, Chapter, ChapterStub, Comment, Preferences, Story, User, Volume,
};
use crate::rating::RatingAggregate;

/// Persistence contract for story documents, their embedded volumes and the
/// catalog aggregation.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Fails with `Conflict` when the slug is taken.
    async fn insert_story(&self, story: &Story) -> Result<()>;
    async fn get_story(&self, story_id: &str) -> Result<Option<Story>>;
    /// Writes the editable metadata and `last_updated_at`. Volumes,
    /// counters and banner flags are left as stored.
    async fn update_story(&self, story: &Story) -> Result<()>;
    /// Removes every comment and chapter of the story, then the story.
    async fn delete_story_cascade(&self, story_id: &str) -> Result<CascadeSummary>;

    // Volume operations
    async fn add_volume(&self, story_id: &str, volume: &Volume) -> Result<()>;
    async fn rename_volume(&self, story_id: &str, volume_id: Uuid, title: &str) -> Result<()>;
    /// Removes the volume's chapters and their comments, then the volume.
    /// The story moves to `bumped_at` only when a chapter went with it.
    async fn delete_volume_cascade(
        &self,
        story_id: &str,
        volume_id: Uuid,
        bumped_at: DateTime<Utc>,
    ) -> Result<CascadeSummary>;
    /// Validates and stores a full volume permutation; returns the new order.
    async fn reorder_volumes(&self, story_id: &str, ordered_volume_ids: &[Uuid]) -> Result<Vec<Uuid>>;
    /// Same contract as `reorder_volumes`, scoped to one volume.
    async fn reorder_chapters(
        &self,
        story_id: &str,
        volume_id: Uuid,
        ordered_chapter_ids: &[Uuid],
    ) -> Result<Vec<Uuid>>;

    // Counters and banner
    /// Folds `value` into the story aggregate and records it in the user's
    /// preferences as one write. A user who already rated the story gets
    /// `Conflict` and nothing changes.
    async fn record_user_rating(&self, user_id: Uuid, story_id: &str, value: u8) -> Result<RatingAggregate>;
    async fn set_banner(&self, story_id: &str, is_in_banner: bool, banner_priority: i32) -> Result<()>;
    async fn list_banner_stories(&self) -> Result<Vec<Story>>;

    /// Filter, aggregate chapter counts, sort and paginate in one pass.
    async fn search_catalog(&self, query: &CatalogQuery) -> Result<CatalogPage>;
}

/// Persistence contract for chapter rows.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ChapterRepository: Send + Sync {
    /// Inserts the chapter and appends it to its volume; `bump` also moves
    /// the story's `last_updated_at`.
    async fn insert_chapter(&self, chapter: &Chapter, bump: Option<DateTime<Utc>>) -> Result<()>;
    async fn get_chapter(&self, chapter_id: Uuid) -> Result<Option<Chapter>>;
    async fn update_chapter(&self, chapter: &Chapter, bump: Option<DateTime<Utc>>) -> Result<()>;
    /// Removes the chapter, its comments and its volume entry, and bumps
    /// the story to `bumped_at`.
    async fn delete_chapter(
        &self,
        story_id: &str,
        chapter_id: Uuid,
        bumped_at: DateTime<Utc>,
    ) -> Result<CascadeSummary>;
    /// Body-less rows for every chapter of a story, drafts included.
    async fn list_chapter_stubs(&self, story_id: &str) -> Result<Vec<ChapterStub>>;
    /// Increments chapter and story view counters; returns the chapter's count.
    async fn record_chapter_view(&self, story_id: &str, chapter_id: Uuid) -> Result<u64>;
}

/// Persistence contract for the flat comment collection.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert_comment(&self, comment: &Comment) -> Result<()>;
    async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>>;
    /// Comments of one chapter, oldest first.
    async fn list_chapter_comments(&self, story_id: &str, chapter_id: Uuid) -> Result<Vec<Comment>>;
    /// Ids of direct replies to any of `parent_ids`.
    async fn list_reply_ids(&self, parent_ids: &[Uuid]) -> Result<Vec<Uuid>>;
    /// Deletes the whole set or nothing; returns the number removed.
    async fn delete_comments(&self, comment_ids: &[Uuid]) -> Result<u64>;
}

/// Persistence contract for accounts and their preference bags.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the username is taken.
    async fn insert_user(&self, user: &User) -> Result<()>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>>;
    async fn get_preferences(&self, user_id: Uuid) -> Result<Option<Preferences>>;
    /// Stores favorites and bookmarks. Ratings are owned by
    /// `StoryRepository::record_user_rating` and kept as stored.
    async fn save_preferences(&self, preferences: &Preferences) -> Result<()>;
}

/// Password hashing contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String>;
    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Bearer token contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenService: Send + Sync {
    fn issue(&self, user: &AuthUser) -> Result<String>;
    /// Fails with `Unauthorized` on a malformed, forged or expired token.
    fn verify(&self, token: &str) -> Result<AuthUser>;
}
