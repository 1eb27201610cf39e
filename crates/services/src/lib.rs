//! # services
//!
//! Use-case orchestration for Inkwell. Services own the business rules
//! (when a story counts as updated, who may see drafts, how a comment
//! subtree is collected) and talk to storage only through the ports in
//! `domains::ports`.

pub mod accounts;
pub mod catalog;
pub mod comments;
pub mod content;
pub mod preferences;

pub use accounts::{AccountService, Credentials, Session};
pub use catalog::{BannerEntry, BannerUpdate, CatalogParams, CatalogService};
pub use comments::{CommentService, CommentThread, NewComment};
pub use content::{
    ChapterPatch, ChapterView, ContentService, NewChapter, NewStory, StoryDetail, StoryPatch,
    ViewOutcome, VolumeView,
};
pub use preferences::{BookmarkInput, PreferenceService};

use domains::{AppError, Result};

/// Trims `value` and rejects it when nothing is left.
pub(crate) fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::validation(format!("{field} is required")))
    } else {
        Ok(trimmed.to_string())
    }
}
