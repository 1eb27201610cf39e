//! Stories, their embedded volumes, and the separately stored chapters.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::ordering::{apply_permutation, validate_permutation};
use crate::rating::RatingAggregate;

/// Publication state of a whole story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryStatus {
    Ongoing,
    Completed,
}

impl StoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryStatus::Ongoing => "ongoing",
            StoryStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoryStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ongoing" => Ok(StoryStatus::Ongoing),
            "completed" => Ok(StoryStatus::Completed),
            other => Err(AppError::validation(format!("unknown story status '{other}'"))),
        }
    }
}

/// A story document. Volumes are embedded; their position in `volumes`
/// is the display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// URL slug, unique across the catalog
    pub id: String,
    pub title: String,
    pub author: String,
    /// Alternative titles, matched by keyword search
    pub aliases: Vec<String>,
    pub description: String,
    pub cover_image: Option<String>,
    pub status: StoryStatus,
    pub tags: BTreeSet<String>,
    pub view_count: u64,
    pub rating: RatingAggregate,
    pub is_in_banner: bool,
    /// Lower shows first in the banner carousel
    pub banner_priority: i32,
    pub volumes: Vec<Volume>,
    pub created_at: DateTime<Utc>,
    /// Bumped by published chapter writes, chapter deletion and story edits only
    pub last_updated_at: DateTime<Utc>,
}

impl Story {
    /// A fresh, empty, ongoing story.
    pub fn new(id: impl Into<String>, title: impl Into<String>, author: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            aliases: Vec::new(),
            description: String::new(),
            cover_image: None,
            status: StoryStatus::Ongoing,
            tags: BTreeSet::new(),
            view_count: 0,
            rating: RatingAggregate::default(),
            is_in_banner: false,
            banner_priority: 0,
            volumes: Vec::new(),
            created_at: at,
            last_updated_at: at,
        }
    }

    pub fn volume(&self, volume_id: Uuid) -> Result<&Volume> {
        self.volumes
            .iter()
            .find(|v| v.id == volume_id)
            .ok_or_else(|| AppError::not_found("Volume", volume_id))
    }

    pub fn volume_mut(&mut self, volume_id: Uuid) -> Result<&mut Volume> {
        self.volumes
            .iter_mut()
            .find(|v| v.id == volume_id)
            .ok_or_else(|| AppError::not_found("Volume", volume_id))
    }

    /// The volume currently listing `chapter_id`, if any.
    pub fn volume_of_chapter(&self, chapter_id: Uuid) -> Option<&Volume> {
        self.volumes.iter().find(|v| v.chapter_ids.contains(&chapter_id))
    }

    /// Every chapter id of the story in display order.
    pub fn chapter_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.volumes.iter().flat_map(|v| v.chapter_ids.iter().copied())
    }

    /// Replaces the volume order with an exact permutation of the current ids.
    pub fn reorder_volumes(&mut self, ordered_volume_ids: &[Uuid]) -> Result<()> {
        let current: Vec<Uuid> = self.volumes.iter().map(|v| v.id).collect();
        validate_permutation(&current, ordered_volume_ids)?;
        let volumes = std::mem::take(&mut self.volumes);
        self.volumes = apply_permutation(volumes, ordered_volume_ids, |v| v.id)?;
        Ok(())
    }

    /// Replaces one volume's chapter order with an exact permutation.
    pub fn reorder_chapters(&mut self, volume_id: Uuid, ordered_chapter_ids: &[Uuid]) -> Result<()> {
        let volume = self.volume_mut(volume_id)?;
        validate_permutation(&volume.chapter_ids, ordered_chapter_ids)?;
        volume.chapter_ids = ordered_chapter_ids.to_vec();
        Ok(())
    }

    pub fn rename_volume(&mut self, volume_id: Uuid, title: &str) -> Result<()> {
        self.volume_mut(volume_id)?.title = title.to_string();
        Ok(())
    }

    /// Detaches a volume from the story, returning it with its chapter ids.
    pub fn remove_volume(&mut self, volume_id: Uuid) -> Result<Volume> {
        let position = self
            .volumes
            .iter()
            .position(|v| v.id == volume_id)
            .ok_or_else(|| AppError::not_found("Volume", volume_id))?;
        Ok(self.volumes.remove(position))
    }

    /// Appends a chapter reference to the end of a volume.
    pub fn attach_chapter(&mut self, volume_id: Uuid, chapter_id: Uuid) -> Result<()> {
        let volume = self.volume_mut(volume_id)?;
        if !volume.chapter_ids.contains(&chapter_id) {
            volume.chapter_ids.push(chapter_id);
        }
        Ok(())
    }

    /// Removes a chapter reference from whichever volume lists it.
    pub fn detach_chapter(&mut self, chapter_id: Uuid) -> bool {
        self.volumes.iter_mut().any(|v| {
            let before = v.chapter_ids.len();
            v.chapter_ids.retain(|id| *id != chapter_id);
            v.chapter_ids.len() != before
        })
    }
}

/// A named run of chapters inside one story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub id: Uuid,
    pub title: String,
    /// Chapter references; position is the display order
    pub chapter_ids: Vec<Uuid>,
}

impl Volume {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: title.into(),
            chapter_ids: Vec::new(),
        }
    }
}

/// A chapter row. Owned by exactly one `(story_id, volume_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: Uuid,
    pub story_id: String,
    pub volume_id: Uuid,
    pub title: String,
    /// Rich HTML body
    pub content: String,
    /// Draft flag: raw chapters are hidden from readers and from update feeds
    pub is_raw: bool,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chapter {
    pub fn is_published(&self) -> bool {
        !self.is_raw
    }

    pub fn stub(&self) -> ChapterStub {
        ChapterStub {
            id: self.id,
            title: self.title.clone(),
            view_count: self.view_count,
            is_raw: self.is_raw,
            created_at: self.created_at,
        }
    }
}

/// Body-less projection of a chapter used in story detail listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterStub {
    pub id: Uuid,
    pub title: String,
    pub view_count: u64,
    pub is_raw: bool,
    pub created_at: DateTime<Utc>,
}

/// What a cascade delete removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeSummary {
    pub chapters: u64,
    pub comments: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story_with_volumes(n: usize) -> Story {
        let mut story = Story::new("s", "S", "A", Utc::now());
        story.volumes = (0..n).map(|i| Volume::new(format!("Volume {i}"))).collect();
        story
    }

    #[test]
    fn reorder_volumes_applies_permutation() {
        let mut story = story_with_volumes(3);
        let ids: Vec<Uuid> = story.volumes.iter().map(|v| v.id).collect();
        let wanted = vec![ids[2], ids[0], ids[1]];
        story.reorder_volumes(&wanted).unwrap();
        let got: Vec<Uuid> = story.volumes.iter().map(|v| v.id).collect();
        assert_eq!(got, wanted);
    }

    #[test]
    fn rejected_reorder_leaves_volumes_untouched() {
        let mut story = story_with_volumes(3);
        let before = story.volumes.clone();
        let err = story.reorder_volumes(&[before[0].id]).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(story.volumes, before);
    }

    #[test]
    fn chapter_attach_detach_and_reorder() {
        let mut story = story_with_volumes(1);
        let volume_id = story.volumes[0].id;
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        story.attach_chapter(volume_id, a).unwrap();
        story.attach_chapter(volume_id, b).unwrap();
        story.reorder_chapters(volume_id, &[b, a]).unwrap();
        assert_eq!(story.volumes[0].chapter_ids, vec![b, a]);
        assert!(story.reorder_chapters(volume_id, &[b]).is_err());

        assert!(story.detach_chapter(a));
        assert!(!story.detach_chapter(a));
        assert_eq!(story.chapter_ids().collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn unknown_volume_is_not_found() {
        let mut story = story_with_volumes(1);
        let err = story.attach_chapter(Uuid::now_v7(), Uuid::now_v7()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref entity, _) if entity == "Volume"));
        assert!(story.remove_volume(Uuid::now_v7()).is_err());
    }
}
