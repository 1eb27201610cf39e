//! # MemoryStore
//!
//! In-process implementation of every persistence port. Each collection is
//! a `DashMap`; writes that touch more than one collection (chapter insert,
//! cascades, batch deletes) hold `write_lock` for their whole duration, so
//! readers never observe a half-applied cascade.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use domains::{
    AppError, CascadeSummary, CatalogPage, CatalogQuery, Chapter, ChapterRepository, ChapterStub,
    Comment, CommentRepository, LatestChapter, Preferences, RatingAggregate, Result, Story,
    StoryRepository, StorySummary, User, UserRepository, Volume,
};

use crate::sorting::compare_summaries;

#[derive(Default)]
pub struct MemoryStore {
    stories: DashMap<String, Story>,
    chapters: DashMap<Uuid, Chapter>,
    comments: DashMap<Uuid, Comment>,
    users: DashMap<Uuid, User>,
    preferences: DashMap<Uuid, Preferences>,
    write_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chapter rows, all stories included.
    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// Number of comment rows, all chapters included.
    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    fn comment_ids_for_chapters(&self, chapter_ids: &HashSet<Uuid>) -> Vec<Uuid> {
        self.comments
            .iter()
            .filter(|c| chapter_ids.contains(&c.chapter_id))
            .map(|c| c.id)
            .collect()
    }

    /// Removes chapters and their comments. Caller holds `write_lock`.
    fn purge_chapters(&self, chapter_ids: &HashSet<Uuid>) -> CascadeSummary {
        let comment_ids = self.comment_ids_for_chapters(chapter_ids);
        let comments = comment_ids
            .iter()
            .filter(|id| self.comments.remove(id).is_some())
            .count() as u64;
        let chapters = chapter_ids
            .iter()
            .filter(|id| self.chapters.remove(id).is_some())
            .count() as u64;
        CascadeSummary { chapters, comments }
    }

    fn with_story<T>(&self, story_id: &str, f: impl FnOnce(&mut Story) -> Result<T>) -> Result<T> {
        let mut story = self
            .stories
            .get_mut(story_id)
            .ok_or_else(|| AppError::not_found("Story", story_id))?;
        f(&mut story)
    }

    /// Published chapter count and newest published chapter per story.
    fn published_figures(&self) -> HashMap<String, (u64, Option<LatestChapter>)> {
        let mut figures: HashMap<String, (u64, Option<LatestChapter>)> = HashMap::new();
        for chapter in self.chapters.iter().filter(|c| c.is_published()) {
            let entry = figures.entry(chapter.story_id.clone()).or_default();
            entry.0 += 1;
            let newer = entry
                .1
                .as_ref()
                .map_or(true, |l| (chapter.created_at, chapter.id) > (l.created_at, l.id));
            if newer {
                entry.1 = Some(LatestChapter {
                    id: chapter.id,
                    title: chapter.title.clone(),
                    created_at: chapter.created_at,
                });
            }
        }
        figures
    }
}

#[async_trait]
impl StoryRepository for MemoryStore {
    async fn insert_story(&self, story: &Story) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        match self.stories.entry(story.id.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "story id {} is already taken",
                story.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(story.clone());
                Ok(())
            }
        }
    }

    async fn get_story(&self, story_id: &str) -> Result<Option<Story>> {
        Ok(self.stories.get(story_id).map(|s| s.clone()))
    }

    async fn update_story(&self, story: &Story) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.with_story(&story.id, |stored| {
            stored.title = story.title.clone();
            stored.author = story.author.clone();
            stored.aliases = story.aliases.clone();
            stored.description = story.description.clone();
            stored.cover_image = story.cover_image.clone();
            stored.status = story.status;
            stored.tags = story.tags.clone();
            stored.last_updated_at = story.last_updated_at;
            Ok(())
        })
    }

    async fn delete_story_cascade(&self, story_id: &str) -> Result<CascadeSummary> {
        let _guard = self.write_lock.lock().await;
        if !self.stories.contains_key(story_id) {
            return Err(AppError::not_found("Story", story_id));
        }
        let chapter_ids: HashSet<Uuid> = self
            .chapters
            .iter()
            .filter(|c| c.story_id == story_id)
            .map(|c| c.id)
            .collect();
        let mut summary = self.purge_chapters(&chapter_ids);

        // comments whose chapter row was already gone
        let stray: Vec<Uuid> = self
            .comments
            .iter()
            .filter(|c| c.story_id == story_id)
            .map(|c| c.id)
            .collect();
        summary.comments += stray
            .iter()
            .filter(|id| self.comments.remove(id).is_some())
            .count() as u64;

        self.stories.remove(story_id);
        debug!(story_id, ?summary, "memory cascade delete");
        Ok(summary)
    }

    async fn add_volume(&self, story_id: &str, volume: &Volume) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.with_story(story_id, |story| {
            if story.volumes.iter().any(|v| v.id == volume.id) {
                return Err(AppError::Conflict(format!("volume {} already exists", volume.id)));
            }
            story.volumes.push(volume.clone());
            Ok(())
        })
    }

    async fn rename_volume(&self, story_id: &str, volume_id: Uuid, title: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.with_story(story_id, |story| story.rename_volume(volume_id, title))
    }

    async fn delete_volume_cascade(
        &self,
        story_id: &str,
        volume_id: Uuid,
        bumped_at: DateTime<Utc>,
    ) -> Result<CascadeSummary> {
        let _guard = self.write_lock.lock().await;
        let removed = self.with_story(story_id, |story| story.remove_volume(volume_id))?;
        let mut chapter_ids: HashSet<Uuid> = removed.chapter_ids.into_iter().collect();
        chapter_ids.extend(
            self.chapters
                .iter()
                .filter(|c| c.story_id == story_id && c.volume_id == volume_id)
                .map(|c| c.id),
        );
        let summary = self.purge_chapters(&chapter_ids);
        if summary.chapters > 0 {
            self.with_story(story_id, |story| {
                story.last_updated_at = bumped_at;
                Ok(())
            })?;
        }
        Ok(summary)
    }

    async fn reorder_volumes(&self, story_id: &str, ordered_volume_ids: &[Uuid]) -> Result<Vec<Uuid>> {
        let _guard = self.write_lock.lock().await;
        self.with_story(story_id, |story| {
            story.reorder_volumes(ordered_volume_ids)?;
            Ok(story.volumes.iter().map(|v| v.id).collect())
        })
    }

    async fn reorder_chapters(
        &self,
        story_id: &str,
        volume_id: Uuid,
        ordered_chapter_ids: &[Uuid],
    ) -> Result<Vec<Uuid>> {
        let _guard = self.write_lock.lock().await;
        self.with_story(story_id, |story| {
            story.reorder_chapters(volume_id, ordered_chapter_ids)?;
            Ok(story.volume(volume_id)?.chapter_ids.clone())
        })
    }

    async fn record_user_rating(&self, user_id: Uuid, story_id: &str, value: u8) -> Result<RatingAggregate> {
        let _guard = self.write_lock.lock().await;
        let rated = self
            .preferences
            .get(&user_id)
            .is_some_and(|p| p.ratings.contains_key(story_id));
        if rated {
            return Err(AppError::Conflict(format!("story {story_id} already rated")));
        }
        let rating = self.with_story(story_id, |story| {
            story.rating = story.rating.record(value)?;
            Ok(story.rating)
        })?;
        self.preferences
            .entry(user_id)
            .or_insert_with(|| Preferences::empty(user_id))
            .ratings
            .insert(story_id.to_string(), value);
        Ok(rating)
    }

    async fn set_banner(&self, story_id: &str, is_in_banner: bool, banner_priority: i32) -> Result<()> {
        self.with_story(story_id, |story| {
            story.is_in_banner = is_in_banner;
            story.banner_priority = banner_priority;
            Ok(())
        })
    }

    async fn list_banner_stories(&self) -> Result<Vec<Story>> {
        Ok(self
            .stories
            .iter()
            .filter(|s| s.is_in_banner)
            .map(|s| s.clone())
            .collect())
    }

    async fn search_catalog(&self, query: &CatalogQuery) -> Result<CatalogPage> {
        let figures = self.published_figures();
        let mut rows: Vec<StorySummary> = self
            .stories
            .iter()
            .filter(|s| query.status.map_or(true, |status| s.status == status))
            .filter(|s| query.matches_keyword(s))
            .map(|s| {
                let (count, latest) = figures.get(&s.id).cloned().unwrap_or_default();
                let mut story = s.clone();
                story.volumes.clear();
                StorySummary::from_story(story, count, latest)
            })
            .filter(|row| query.bucket.map_or(true, |b| b.contains(row.chapter_count)))
            .collect();

        rows.sort_by(|a, b| compare_summaries(query.sort, a, b));
        let total = rows.len() as u64;
        let items = rows
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.page_size as usize)
            .collect();

        Ok(CatalogPage {
            items,
            total,
            page: query.page,
            page_size: query.page_size,
        })
    }
}

#[async_trait]
impl ChapterRepository for MemoryStore {
    async fn insert_chapter(&self, chapter: &Chapter, bump: Option<DateTime<Utc>>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.chapters.contains_key(&chapter.id) {
            return Err(AppError::Conflict(format!("chapter {} already exists", chapter.id)));
        }
        self.with_story(&chapter.story_id, |story| {
            story.attach_chapter(chapter.volume_id, chapter.id)?;
            if let Some(at) = bump {
                story.last_updated_at = at;
            }
            Ok(())
        })?;
        self.chapters.insert(chapter.id, chapter.clone());
        Ok(())
    }

    async fn get_chapter(&self, chapter_id: Uuid) -> Result<Option<Chapter>> {
        Ok(self.chapters.get(&chapter_id).map(|c| c.clone()))
    }

    async fn update_chapter(&self, chapter: &Chapter, bump: Option<DateTime<Utc>>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        {
            let mut stored = self
                .chapters
                .get_mut(&chapter.id)
                .ok_or_else(|| AppError::not_found("Chapter", chapter.id))?;
            stored.title = chapter.title.clone();
            stored.content = chapter.content.clone();
            stored.is_raw = chapter.is_raw;
            stored.updated_at = chapter.updated_at;
        }
        if let Some(at) = bump {
            self.with_story(&chapter.story_id, |story| {
                story.last_updated_at = at;
                Ok(())
            })?;
        }
        Ok(())
    }

    async fn delete_chapter(
        &self,
        story_id: &str,
        chapter_id: Uuid,
        bumped_at: DateTime<Utc>,
    ) -> Result<CascadeSummary> {
        let _guard = self.write_lock.lock().await;
        let owned = self
            .chapters
            .get(&chapter_id)
            .is_some_and(|c| c.story_id == story_id);
        if !owned {
            return Err(AppError::not_found("Chapter", chapter_id));
        }
        self.with_story(story_id, |story| {
            story.detach_chapter(chapter_id);
            story.last_updated_at = bumped_at;
            Ok(())
        })?;
        Ok(self.purge_chapters(&HashSet::from([chapter_id])))
    }

    async fn list_chapter_stubs(&self, story_id: &str) -> Result<Vec<ChapterStub>> {
        let mut stubs: Vec<ChapterStub> = self
            .chapters
            .iter()
            .filter(|c| c.story_id == story_id)
            .map(|c| c.stub())
            .collect();
        stubs.sort_by_key(|s| (s.created_at, s.id));
        Ok(stubs)
    }

    async fn record_chapter_view(&self, story_id: &str, chapter_id: Uuid) -> Result<u64> {
        let count = {
            let mut chapter = self
                .chapters
                .get_mut(&chapter_id)
                .filter(|c| c.story_id == story_id)
                .ok_or_else(|| AppError::not_found("Chapter", chapter_id))?;
            chapter.view_count += 1;
            chapter.view_count
        };
        if let Some(mut story) = self.stories.get_mut(story_id) {
            story.view_count += 1;
        }
        Ok(count)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if !self.chapters.contains_key(&comment.chapter_id) {
            return Err(AppError::not_found("Chapter", comment.chapter_id));
        }
        self.comments.insert(comment.id, comment.clone());
        Ok(())
    }

    async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        Ok(self.comments.get(&comment_id).map(|c| c.clone()))
    }

    async fn list_chapter_comments(&self, story_id: &str, chapter_id: Uuid) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| c.chapter_id == chapter_id && c.story_id == story_id)
            .map(|c| c.clone())
            .collect();
        comments.sort_by_key(|c| (c.created_at, c.id));
        Ok(comments)
    }

    async fn list_reply_ids(&self, parent_ids: &[Uuid]) -> Result<Vec<Uuid>> {
        let parents: HashSet<&Uuid> = parent_ids.iter().collect();
        let mut replies: Vec<(DateTime<Utc>, Uuid)> = self
            .comments
            .iter()
            .filter(|c| c.parent_id.as_ref().is_some_and(|p| parents.contains(p)))
            .map(|c| (c.created_at, c.id))
            .collect();
        replies.sort();
        Ok(replies.into_iter().map(|(_, id)| id).collect())
    }

    async fn delete_comments(&self, comment_ids: &[Uuid]) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        Ok(comment_ids
            .iter()
            .filter(|id| self.comments.remove(id).is_some())
            .count() as u64)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(format!(
                "username {} is already taken",
                user.username
            )));
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.clone()))
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&user_id).map(|u| u.clone()))
    }

    async fn get_preferences(&self, user_id: Uuid) -> Result<Option<Preferences>> {
        Ok(self.preferences.get(&user_id).map(|p| p.clone()))
    }

    async fn save_preferences(&self, preferences: &Preferences) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut stored = preferences.clone();
        if let Some(ratings) = self.preferences.get(&preferences.user_id).map(|p| p.ratings.clone()) {
            stored.ratings = ratings;
        }
        self.preferences.insert(stored.user_id, stored);
        Ok(())
    }
}
