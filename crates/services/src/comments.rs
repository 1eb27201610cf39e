//! # Comments
//!
//! Chapters carry flat comment lists that are folded into reply forests on
//! read. Deleting a comment removes its whole reply subtree: descendants are
//! discovered one tree level per lookup, then removed in a single batch, so
//! a failed lookup deletes nothing.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use domains::comment_tree::{build_comment_tree, MAX_REPLY_DEPTH};
use domains::{
    AppError, AuthUser, ChapterRepository, Comment, CommentNode, CommentRepository, Result,
};

pub const MAX_COMMENT_CHARS: usize = 2000;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    /// Comments in the forest, replies included
    pub total: usize,
    pub comments: Vec<CommentNode>,
}

pub struct CommentService {
    chapters: Arc<dyn ChapterRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl CommentService {
    pub fn new(chapters: Arc<dyn ChapterRepository>, comments: Arc<dyn CommentRepository>) -> Self {
        Self { chapters, comments }
    }

    #[instrument(skip(self))]
    pub async fn list_comments(&self, story_id: &str, chapter_id: Uuid) -> Result<CommentThread> {
        self.ensure_chapter(story_id, chapter_id).await?;
        let flat = self.comments.list_chapter_comments(story_id, chapter_id).await?;
        let total = flat.len();
        Ok(CommentThread {
            total,
            comments: build_comment_tree(flat),
        })
    }

    #[instrument(skip(self, author, input), fields(user = %author.username))]
    pub async fn post_comment(
        &self,
        author: &AuthUser,
        story_id: &str,
        chapter_id: Uuid,
        input: NewComment,
    ) -> Result<Comment> {
        let content = input.content.trim();
        if content.is_empty() {
            return Err(AppError::validation("comment must not be empty"));
        }
        if content.chars().count() > MAX_COMMENT_CHARS {
            return Err(AppError::validation(format!(
                "comment exceeds {MAX_COMMENT_CHARS} characters"
            )));
        }
        self.ensure_chapter(story_id, chapter_id).await?;

        if let Some(parent_id) = input.parent_id {
            let parent = self
                .comments
                .get_comment(parent_id)
                .await?
                .filter(|p| p.chapter_id == chapter_id && p.story_id == story_id);
            let Some(parent) = parent else {
                warn!(%parent_id, %chapter_id, "reply target is not on this chapter");
                return Err(AppError::validation(format!(
                    "parent comment {parent_id} does not exist on this chapter"
                )));
            };
            if self.level_of(&parent).await? >= MAX_REPLY_DEPTH {
                return Err(AppError::validation(format!(
                    "replies nest at most {MAX_REPLY_DEPTH} levels deep"
                )));
            }
        }

        let comment = Comment {
            id: Uuid::now_v7(),
            story_id: story_id.to_string(),
            chapter_id,
            user_id: author.user_id,
            username: author.username.clone(),
            parent_id: input.parent_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.comments.insert_comment(&comment).await?;
        info!(comment_id = %comment.id, reply = comment.parent_id.is_some(), "comment posted");
        Ok(comment)
    }

    /// Deletes a comment and every transitive reply; returns how many went.
    #[instrument(skip(self))]
    pub async fn delete_comment_cascade(&self, comment_id: Uuid) -> Result<u64> {
        let root = self
            .comments
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment", comment_id))?;

        let mut doomed = vec![root.id];
        let mut seen: HashSet<Uuid> = HashSet::from([root.id]);
        let mut frontier = vec![root.id];
        while !frontier.is_empty() {
            let replies = self.comments.list_reply_ids(&frontier).await?;
            frontier = replies.into_iter().filter(|id| seen.insert(*id)).collect();
            doomed.extend(frontier.iter().copied());
        }

        let removed = self.comments.delete_comments(&doomed).await?;
        info!(%comment_id, removed, "comment subtree deleted");
        Ok(removed)
    }

    /// Nesting level of a stored comment, roots being 0. Stops counting at
    /// the reply cap.
    async fn level_of(&self, comment: &Comment) -> Result<usize> {
        let mut level = 0;
        let mut next = comment.parent_id;
        while let Some(id) = next {
            if level >= MAX_REPLY_DEPTH {
                break;
            }
            match self.comments.get_comment(id).await? {
                Some(ancestor) => {
                    level += 1;
                    next = ancestor.parent_id;
                }
                None => break,
            }
        }
        Ok(level)
    }

    async fn ensure_chapter(&self, story_id: &str, chapter_id: Uuid) -> Result<()> {
        match self.chapters.get_chapter(chapter_id).await? {
            Some(chapter) if chapter.story_id == story_id => Ok(()),
            _ => Err(AppError::not_found("Chapter", chapter_id)),
        }
    }
}
