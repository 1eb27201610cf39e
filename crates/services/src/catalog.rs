//! Catalog search and the banner carousel.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use domains::{
    AppError, CatalogPage, CatalogQuery, CatalogSort, ChapterCountBucket, Result, Story,
    StoryRepository, StoryStatus,
};

/// Raw listing parameters as they arrive from a query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogParams {
    pub keyword: Option<String>,
    pub status: Option<String>,
    /// Chapter-count bucket key, e.g. `50-100`
    pub chapter_range: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerUpdate {
    pub is_in_banner: bool,
    /// Keeps the stored priority when absent
    pub banner_priority: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerEntry {
    pub id: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub cover_image: Option<String>,
    pub banner_priority: i32,
    pub last_updated_at: DateTime<Utc>,
}

impl From<Story> for BannerEntry {
    fn from(story: Story) -> Self {
        Self {
            id: story.id,
            title: story.title,
            author: story.author,
            description: story.description,
            cover_image: story.cover_image,
            banner_priority: story.banner_priority,
            last_updated_at: story.last_updated_at,
        }
    }
}

pub struct CatalogService {
    stories: Arc<dyn StoryRepository>,
    default_page_size: u32,
    max_page_size: u32,
}

impl CatalogService {
    pub fn new(stories: Arc<dyn StoryRepository>, default_page_size: u32, max_page_size: u32) -> Self {
        Self {
            stories,
            default_page_size,
            max_page_size: max_page_size.max(1),
        }
    }

    /// Turns raw parameters into a validated query; oversize pages are clamped.
    pub fn parse_query(&self, params: CatalogParams) -> Result<CatalogQuery> {
        let page = params.page.unwrap_or(1);
        if page == 0 {
            return Err(AppError::validation("page starts at 1"));
        }
        let page_size = match params.limit {
            Some(0) => return Err(AppError::validation("limit must be positive")),
            Some(limit) => limit.min(self.max_page_size),
            None => self.default_page_size.clamp(1, self.max_page_size),
        };
        let status = non_blank(params.status)
            .map(|s| s.parse::<StoryStatus>())
            .transpose()?;
        let bucket = non_blank(params.chapter_range)
            .map(|s| s.parse::<ChapterCountBucket>())
            .transpose()?;
        let sort = non_blank(params.sort)
            .map(|s| s.parse::<CatalogSort>())
            .transpose()?
            .unwrap_or_default();

        Ok(CatalogQuery {
            keyword: non_blank(params.keyword),
            status,
            bucket,
            sort,
            page,
            page_size,
        })
    }

    #[instrument(skip(self))]
    pub async fn search(&self, params: CatalogParams) -> Result<CatalogPage> {
        let query = self.parse_query(params)?;
        self.stories.search_catalog(&query).await
    }

    /// Featured stories: lowest priority first, then most recently updated.
    pub async fn banner_stories(&self) -> Result<Vec<BannerEntry>> {
        let mut stories = self.stories.list_banner_stories().await?;
        stories.retain(|s| s.is_in_banner);
        stories.sort_by(|a, b| {
            a.banner_priority
                .cmp(&b.banner_priority)
                .then_with(|| b.last_updated_at.cmp(&a.last_updated_at))
        });
        Ok(stories.into_iter().map(BannerEntry::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn set_banner(&self, story_id: &str, update: BannerUpdate) -> Result<BannerEntry> {
        let mut story = self
            .stories
            .get_story(story_id)
            .await?
            .ok_or_else(|| AppError::not_found("Story", story_id))?;
        story.is_in_banner = update.is_in_banner;
        if let Some(priority) = update.banner_priority {
            story.banner_priority = priority;
        }
        self.stories
            .set_banner(story_id, story.is_in_banner, story.banner_priority)
            .await?;
        info!(story_id, in_banner = story.is_in_banner, priority = story.banner_priority, "banner updated");
        Ok(BannerEntry::from(story))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domains::MockStoryRepository;

    fn service(stories: MockStoryRepository) -> CatalogService {
        CatalogService::new(Arc::new(stories), 20, 50)
    }

    #[test]
    fn parse_query_applies_defaults_and_clamps() {
        let svc = service(MockStoryRepository::new());
        let query = svc.parse_query(CatalogParams::default()).unwrap();
        assert_eq!((query.page, query.page_size), (1, 20));
        assert_eq!(query.sort, CatalogSort::Updated);

        let query = svc
            .parse_query(CatalogParams {
                chapter_range: Some("50-100".into()),
                status: Some("completed".into()),
                limit: Some(500),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(query.page_size, 50);
        assert_eq!(query.bucket, Some(ChapterCountBucket::From50To100));
        assert_eq!(query.status, Some(StoryStatus::Completed));
    }

    #[test]
    fn parse_query_rejects_unknown_values() {
        let svc = service(MockStoryRepository::new());
        for params in [
            CatalogParams { page: Some(0), ..Default::default() },
            CatalogParams { limit: Some(0), ..Default::default() },
            CatalogParams { status: Some("paused".into()), ..Default::default() },
            CatalogParams { chapter_range: Some("1-2".into()), ..Default::default() },
            CatalogParams { sort: Some("random".into()), ..Default::default() },
        ] {
            assert!(matches!(svc.parse_query(params), Err(AppError::ValidationError(_))));
        }
    }

    #[test]
    fn banner_orders_by_priority_then_recency() {
        let now = Utc::now();
        let mut first = Story::new("first", "First", "A", now);
        first.is_in_banner = true;
        first.banner_priority = 1;
        first.last_updated_at = now - Duration::days(3);
        let mut second = Story::new("second", "Second", "A", now);
        second.is_in_banner = true;
        second.banner_priority = 2;
        second.last_updated_at = now;
        let mut third = Story::new("third", "Third", "A", now);
        third.is_in_banner = true;
        third.banner_priority = 2;
        third.last_updated_at = now - Duration::days(1);

        let mut stories = MockStoryRepository::new();
        stories
            .expect_list_banner_stories()
            .returning(move || Ok(vec![third.clone(), second.clone(), first.clone()]));

        let ids: Vec<String> = tokio_test::block_on(service(stories).banner_stories())
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }
}
