//! # Content lifecycle
//!
//! Story → Volume → Chapter management. Rules enforced here:
//!
//! - a chapter write bumps the story's `last_updated_at` only when the
//!   chapter is published after the write; deleting a chapter always bumps;
//! - deleting a volume or a story cascades to its chapters (and their
//!   comments) inside the storage adapter;
//! - reorders must name every current member exactly once;
//! - drafts are visible to admins only.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use domains::slug::{slugify, validate_slug};
use domains::{
    AppError, AuthUser, CascadeSummary, Chapter, ChapterRepository, ChapterStub, LatestChapter,
    Result, Story, StoryRepository, StoryStatus, StorySummary, Volume,
};

use crate::required;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStory {
    /// Slug; derived from the title when absent
    pub id: Option<String>,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub description: String,
    pub cover_image: Option<String>,
    pub status: Option<StoryStatus>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Titles of volumes to create up front
    #[serde(default)]
    pub volumes: Vec<String>,
}

/// Partial story edit; absent fields are kept. An empty `cover_image`
/// clears the cover.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub aliases: Option<Vec<String>>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub status: Option<StoryStatus>,
    pub tags: Option<BTreeSet<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChapter {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_raw: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_raw: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeView {
    pub id: Uuid,
    pub title: String,
    pub chapters: Vec<ChapterStub>,
}

/// Story page payload: summary figures plus the ordered volume tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDetail {
    #[serde(flatten)]
    pub summary: StorySummary,
    pub volumes: Vec<VolumeView>,
}

/// Reader payload for one chapter with its neighbours in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterView {
    #[serde(flatten)]
    pub chapter: Chapter,
    pub volume_title: String,
    pub previous_chapter_id: Option<Uuid>,
    pub next_chapter_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewOutcome {
    pub counted: bool,
    pub view_count: u64,
}

pub struct ContentService {
    stories: Arc<dyn StoryRepository>,
    chapters: Arc<dyn ChapterRepository>,
}

impl ContentService {
    pub fn new(stories: Arc<dyn StoryRepository>, chapters: Arc<dyn ChapterRepository>) -> Self {
        Self { stories, chapters }
    }

    // ── Stories ─────────────────────────────────────────────────────────────

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_story(&self, input: NewStory) -> Result<Story> {
        let title = required("title", &input.title)?;
        let author = required("author", &input.author)?;
        let id = match input.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => {
                validate_slug(id)?;
                id.to_string()
            }
            None => derive_slug(&title),
        };

        let mut story = Story::new(id, title, author, Utc::now());
        story.aliases = clean_list(input.aliases);
        story.description = input.description.trim().to_string();
        story.cover_image = input.cover_image.filter(|c| !c.trim().is_empty());
        story.status = input.status.unwrap_or(StoryStatus::Ongoing);
        story.tags = clean_set(input.tags);
        story.volumes = input
            .volumes
            .iter()
            .map(|title| required("volume title", title).map(Volume::new))
            .collect::<Result<_>>()?;

        self.stories.insert_story(&story).await?;
        info!(story_id = %story.id, volumes = story.volumes.len(), "story created");
        Ok(story)
    }

    pub async fn get_story(&self, story_id: &str) -> Result<Story> {
        self.stories
            .get_story(story_id)
            .await?
            .ok_or_else(|| AppError::not_found("Story", story_id))
    }

    /// Story with its volumes and chapter stubs in display order. Drafts
    /// are listed only for admins; the chapter figures count published
    /// chapters for everyone.
    #[instrument(skip(self, viewer))]
    pub async fn get_story_detail(&self, story_id: &str, viewer: Option<&AuthUser>) -> Result<StoryDetail> {
        let story = self.get_story(story_id).await?;
        let stubs: HashMap<Uuid, ChapterStub> = self
            .chapters
            .list_chapter_stubs(story_id)
            .await?
            .into_iter()
            .map(|stub| (stub.id, stub))
            .collect();
        let include_drafts = viewer.is_some_and(AuthUser::is_admin);

        let volumes = story
            .volumes
            .iter()
            .map(|volume| VolumeView {
                id: volume.id,
                title: volume.title.clone(),
                chapters: volume
                    .chapter_ids
                    .iter()
                    .filter_map(|id| stubs.get(id))
                    .filter(|stub| include_drafts || !stub.is_raw)
                    .cloned()
                    .collect(),
            })
            .collect();

        let published = stubs.values().filter(|stub| !stub.is_raw);
        let chapter_count = published.clone().count() as u64;
        let latest_chapter = published
            .max_by_key(|stub| (stub.created_at, stub.id))
            .map(|stub| LatestChapter {
                id: stub.id,
                title: stub.title.clone(),
                created_at: stub.created_at,
            });

        Ok(StoryDetail {
            summary: StorySummary::from_story(story, chapter_count, latest_chapter),
            volumes,
        })
    }

    /// Explicit story edit; always bumps `last_updated_at`.
    #[instrument(skip(self, patch))]
    pub async fn update_story(&self, story_id: &str, patch: StoryPatch) -> Result<Story> {
        let mut story = self.get_story(story_id).await?;
        if let Some(title) = patch.title {
            story.title = required("title", &title)?;
        }
        if let Some(author) = patch.author {
            story.author = required("author", &author)?;
        }
        if let Some(aliases) = patch.aliases {
            story.aliases = clean_list(aliases);
        }
        if let Some(description) = patch.description {
            story.description = description.trim().to_string();
        }
        if let Some(cover) = patch.cover_image {
            story.cover_image = Some(cover).filter(|c| !c.trim().is_empty());
        }
        if let Some(status) = patch.status {
            story.status = status;
        }
        if let Some(tags) = patch.tags {
            story.tags = clean_set(tags);
        }
        story.last_updated_at = Utc::now();

        self.stories.update_story(&story).await?;
        info!(story_id = %story.id, "story updated");
        Ok(story)
    }

    #[instrument(skip(self))]
    pub async fn delete_story(&self, story_id: &str) -> Result<CascadeSummary> {
        let summary = self.stories.delete_story_cascade(story_id).await?;
        info!(
            story_id,
            chapters = summary.chapters,
            comments = summary.comments,
            "story deleted"
        );
        Ok(summary)
    }

    // ── Volumes ─────────────────────────────────────────────────────────────

    #[instrument(skip(self))]
    pub async fn add_volume(&self, story_id: &str, title: &str) -> Result<Volume> {
        let volume = Volume::new(required("volume title", title)?);
        self.stories.add_volume(story_id, &volume).await?;
        info!(story_id, volume_id = %volume.id, "volume added");
        Ok(volume)
    }

    #[instrument(skip(self))]
    pub async fn rename_volume(&self, story_id: &str, volume_id: Uuid, title: &str) -> Result<()> {
        let title = required("volume title", title)?;
        self.stories.rename_volume(story_id, volume_id, &title).await
    }

    /// Removes a volume with all of its chapters. The story counts as
    /// updated when published or draft chapters went with it.
    #[instrument(skip(self))]
    pub async fn delete_volume(&self, story_id: &str, volume_id: Uuid) -> Result<CascadeSummary> {
        let summary = self
            .stories
            .delete_volume_cascade(story_id, volume_id, Utc::now())
            .await?;
        info!(story_id, %volume_id, chapters = summary.chapters, "volume deleted");
        Ok(summary)
    }

    #[instrument(skip(self, ordered_volume_ids), fields(count = ordered_volume_ids.len()))]
    pub async fn reorder_volumes(&self, story_id: &str, ordered_volume_ids: &[Uuid]) -> Result<Vec<Uuid>> {
        let order = self
            .stories
            .reorder_volumes(story_id, ordered_volume_ids)
            .await
            .inspect_err(|err| warn!(story_id, error = %err, "volume reorder rejected"))?;
        info!(story_id, "volumes reordered");
        Ok(order)
    }

    #[instrument(skip(self, ordered_chapter_ids), fields(count = ordered_chapter_ids.len()))]
    pub async fn reorder_chapters(
        &self,
        story_id: &str,
        volume_id: Uuid,
        ordered_chapter_ids: &[Uuid],
    ) -> Result<Vec<Uuid>> {
        let order = self
            .stories
            .reorder_chapters(story_id, volume_id, ordered_chapter_ids)
            .await
            .inspect_err(|err| warn!(story_id, %volume_id, error = %err, "chapter reorder rejected"))?;
        info!(story_id, %volume_id, "chapters reordered");
        Ok(order)
    }

    // ── Chapters ────────────────────────────────────────────────────────────

    #[instrument(skip(self, input), fields(is_raw = input.is_raw))]
    pub async fn add_chapter(&self, story_id: &str, volume_id: Uuid, input: NewChapter) -> Result<Chapter> {
        let story = self.get_story(story_id).await?;
        story.volume(volume_id)?;
        let title = required("title", &input.title)?;

        let now = Utc::now();
        let chapter = Chapter {
            id: Uuid::now_v7(),
            story_id: story.id,
            volume_id,
            title,
            content: input.content,
            is_raw: input.is_raw,
            view_count: 0,
            created_at: now,
            updated_at: now,
        };
        let bump = chapter.is_published().then_some(now);

        self.chapters.insert_chapter(&chapter, bump).await?;
        info!(story_id, chapter_id = %chapter.id, published = chapter.is_published(), "chapter added");
        Ok(chapter)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_chapter(&self, story_id: &str, chapter_id: Uuid, patch: ChapterPatch) -> Result<Chapter> {
        let mut chapter = self.load_chapter(story_id, chapter_id).await?;
        if let Some(title) = patch.title {
            chapter.title = required("title", &title)?;
        }
        if let Some(content) = patch.content {
            chapter.content = content;
        }
        if let Some(is_raw) = patch.is_raw {
            chapter.is_raw = is_raw;
        }

        let now = Utc::now();
        chapter.updated_at = now;
        // Publishing and edits to published chapters count as an update;
        // anything that leaves the chapter a draft does not.
        let bump = chapter.is_published().then_some(now);

        self.chapters.update_chapter(&chapter, bump).await?;
        info!(story_id, %chapter_id, published = chapter.is_published(), "chapter updated");
        Ok(chapter)
    }

    #[instrument(skip(self))]
    pub async fn delete_chapter(&self, story_id: &str, chapter_id: Uuid) -> Result<CascadeSummary> {
        self.load_chapter(story_id, chapter_id).await?;
        let summary = self
            .chapters
            .delete_chapter(story_id, chapter_id, Utc::now())
            .await?;
        info!(story_id, %chapter_id, comments = summary.comments, "chapter deleted");
        Ok(summary)
    }

    /// Full chapter for reading. Drafts resolve for admins only.
    #[instrument(skip(self, viewer))]
    pub async fn read_chapter(
        &self,
        story_id: &str,
        chapter_id: Uuid,
        viewer: Option<&AuthUser>,
    ) -> Result<ChapterView> {
        let include_drafts = viewer.is_some_and(AuthUser::is_admin);
        let chapter = self.load_chapter(story_id, chapter_id).await?;
        if chapter.is_raw && !include_drafts {
            return Err(AppError::not_found("Chapter", chapter_id));
        }

        let story = self.get_story(story_id).await?;
        let drafts: BTreeSet<Uuid> = self
            .chapters
            .list_chapter_stubs(story_id)
            .await?
            .into_iter()
            .filter(|stub| stub.is_raw)
            .map(|stub| stub.id)
            .collect();
        let visible: Vec<Uuid> = story
            .chapter_ids()
            .filter(|id| include_drafts || !drafts.contains(id))
            .collect();
        let position = visible.iter().position(|id| *id == chapter_id);
        let previous_chapter_id = position
            .and_then(|p| p.checked_sub(1))
            .and_then(|p| visible.get(p))
            .copied();
        let next_chapter_id = position.and_then(|p| visible.get(p + 1)).copied();
        let volume_title = story
            .volume(chapter.volume_id)
            .map(|v| v.title.clone())
            .unwrap_or_default();

        Ok(ChapterView {
            chapter,
            volume_title,
            previous_chapter_id,
            next_chapter_id,
        })
    }

    /// Counts a reader view. Admin previews and drafts are not counted.
    #[instrument(skip(self, viewer))]
    pub async fn record_chapter_view(
        &self,
        story_id: &str,
        chapter_id: Uuid,
        viewer: Option<&AuthUser>,
    ) -> Result<ViewOutcome> {
        let chapter = self.load_chapter(story_id, chapter_id).await?;
        if viewer.is_some_and(AuthUser::is_admin) || chapter.is_raw {
            return Ok(ViewOutcome {
                counted: false,
                view_count: chapter.view_count,
            });
        }
        let view_count = self.chapters.record_chapter_view(story_id, chapter_id).await?;
        Ok(ViewOutcome {
            counted: true,
            view_count,
        })
    }

    async fn load_chapter(&self, story_id: &str, chapter_id: Uuid) -> Result<Chapter> {
        self.chapters
            .get_chapter(chapter_id)
            .await?
            .filter(|c| c.story_id == story_id)
            .ok_or_else(|| AppError::not_found("Chapter", chapter_id))
    }
}

fn derive_slug(title: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        // titles without ASCII letters still need an address
        let simple = Uuid::new_v4().simple().to_string();
        format!("story-{}", &simple[..8])
    } else {
        slug
    }
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn clean_set(values: BTreeSet<String>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
