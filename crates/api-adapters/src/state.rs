use std::sync::Arc;

use domains::{
    ChapterRepository, CommentRepository, PasswordHasher, StoryRepository, TokenService,
    UserRepository,
};
use services::{AccountService, CatalogService, CommentService, ContentService, PreferenceService};

use crate::metrics::Metrics;

/// The adapters a binary hands over; a single store usually fills all four
/// repository slots.
#[derive(Clone)]
pub struct Ports {
    pub stories: Arc<dyn StoryRepository>,
    pub chapters: Arc<dyn ChapterRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub users: Arc<dyn UserRepository>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn TokenService>,
}

#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// State shared by every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub content: Arc<ContentService>,
    pub catalog: Arc<CatalogService>,
    pub comments: Arc<CommentService>,
    pub accounts: Arc<AccountService>,
    pub preferences: Arc<PreferenceService>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(ports: Ports, limits: PageLimits) -> Self {
        let Ports {
            stories,
            chapters,
            comments,
            users,
            hasher,
            tokens,
        } = ports;
        Self {
            content: Arc::new(ContentService::new(stories.clone(), chapters.clone())),
            catalog: Arc::new(CatalogService::new(
                stories.clone(),
                limits.default_page_size,
                limits.max_page_size,
            )),
            comments: Arc::new(CommentService::new(chapters.clone(), comments)),
            accounts: Arc::new(AccountService::new(users.clone(), hasher, tokens)),
            preferences: Arc::new(PreferenceService::new(users, stories, chapters)),
            metrics: Arc::new(Metrics::new()),
        }
    }
}
