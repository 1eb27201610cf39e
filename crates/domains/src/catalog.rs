//! Catalog listing types: search filters, the chapter-count bucket filter,
//! and the summary rows a listing returns.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{Story, StoryStatus};
use crate::rating::RatingAggregate;

/// Named ranges over a story's published chapter count.
///
/// The count is never stored; adapters compute it per story while
/// evaluating the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChapterCountBucket {
    #[serde(rename = "lt50")]
    Under50,
    #[serde(rename = "50-100")]
    From50To100,
    #[serde(rename = "100-200")]
    From100To200,
    #[serde(rename = "200-500")]
    From200To500,
    #[serde(rename = "500-1000")]
    From500To1000,
    #[serde(rename = "gt1000")]
    Over1000,
}

impl ChapterCountBucket {
    pub const ALL: [ChapterCountBucket; 6] = [
        ChapterCountBucket::Under50,
        ChapterCountBucket::From50To100,
        ChapterCountBucket::From100To200,
        ChapterCountBucket::From200To500,
        ChapterCountBucket::From500To1000,
        ChapterCountBucket::Over1000,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ChapterCountBucket::Under50 => "lt50",
            ChapterCountBucket::From50To100 => "50-100",
            ChapterCountBucket::From100To200 => "100-200",
            ChapterCountBucket::From200To500 => "200-500",
            ChapterCountBucket::From500To1000 => "500-1000",
            ChapterCountBucket::Over1000 => "gt1000",
        }
    }

    /// Inclusive lower bound and exclusive upper bound (`None` = unbounded).
    pub fn bounds(&self) -> (u64, Option<u64>) {
        match self {
            ChapterCountBucket::Under50 => (0, Some(50)),
            ChapterCountBucket::From50To100 => (50, Some(100)),
            ChapterCountBucket::From100To200 => (100, Some(200)),
            ChapterCountBucket::From200To500 => (200, Some(500)),
            ChapterCountBucket::From500To1000 => (500, Some(1001)),
            ChapterCountBucket::Over1000 => (1001, None),
        }
    }

    pub fn contains(&self, chapter_count: u64) -> bool {
        let (min, max) = self.bounds();
        chapter_count >= min && max.map_or(true, |max| chapter_count < max)
    }
}

impl FromStr for ChapterCountBucket {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|bucket| bucket.key() == s)
            .ok_or_else(|| AppError::validation(format!("unknown chapter range '{s}'")))
    }
}

/// Listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSort {
    /// Most recently updated first; the "recently updated" feed
    #[default]
    Updated,
    Newest,
    Views,
    Rating,
    Title,
}

impl FromStr for CatalogSort {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "updated" => Ok(CatalogSort::Updated),
            "newest" => Ok(CatalogSort::Newest),
            "views" => Ok(CatalogSort::Views),
            "rating" => Ok(CatalogSort::Rating),
            "title" => Ok(CatalogSort::Title),
            other => Err(AppError::validation(format!("unknown sort '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub keyword: Option<String>,
    pub status: Option<StoryStatus>,
    pub bucket: Option<ChapterCountBucket>,
    pub sort: CatalogSort,
    /// 1-based
    pub page: u32,
    pub page_size: u32,
}

impl CatalogQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// Lowercased, trimmed keyword; blank keywords are treated as absent.
    pub fn normalized_keyword(&self) -> Option<String> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_lowercase)
    }

    /// Case-insensitive substring match against title, author and aliases.
    pub fn matches_keyword(&self, story: &Story) -> bool {
        let Some(needle) = self.normalized_keyword() else {
            return true;
        };
        std::iter::once(&story.title)
            .chain(std::iter::once(&story.author))
            .chain(story.aliases.iter())
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Newest published chapter of a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestChapter {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// One catalog row: the story without its volume tree, plus the
/// aggregated chapter figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySummary {
    pub id: String,
    pub title: String,
    pub author: String,
    pub aliases: Vec<String>,
    pub description: String,
    pub cover_image: Option<String>,
    pub status: StoryStatus,
    pub tags: BTreeSet<String>,
    pub view_count: u64,
    pub rating: RatingAggregate,
    pub is_in_banner: bool,
    pub banner_priority: i32,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    /// Published chapters only
    pub chapter_count: u64,
    pub latest_chapter: Option<LatestChapter>,
}

impl StorySummary {
    pub fn from_story(story: Story, chapter_count: u64, latest_chapter: Option<LatestChapter>) -> Self {
        Self {
            id: story.id,
            title: story.title,
            author: story.author,
            aliases: story.aliases,
            description: story.description,
            cover_image: story.cover_image,
            status: story.status,
            tags: story.tags,
            view_count: story.view_count,
            rating: story.rating,
            is_in_banner: story.is_in_banner,
            banner_priority: story.banner_priority,
            created_at: story.created_at,
            last_updated_at: story.last_updated_at,
            chapter_count,
            latest_chapter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub items: Vec<StorySummary>,
    /// Stories matching every filter, across all pages
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}
