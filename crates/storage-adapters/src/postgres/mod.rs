//! # PgStore
//!
//! Postgres implementation of the persistence ports. Volumes (with their
//! chapter order) live in a JSONB column on `stories`; every write that
//! touches the volume tree locks the story row with `SELECT ... FOR UPDATE`
//! inside a transaction, edits it through the domain model, and writes it
//! back before commit.

mod rows;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use domains::{
    AppError, CascadeSummary, CatalogPage, CatalogQuery, Chapter, ChapterRepository, ChapterStub,
    Comment, CommentRepository, Preferences, RatingAggregate, Result, Story, StoryRepository,
    StorySummary, User, UserRepository, Volume,
};

use crate::sorting::order_by_clause;
use rows::{
    count_to_db, db_err, CatalogRow, ChapterRow, ChapterStubRow, CommentRow, PreferencesRow,
    StoryRow, UserRow, CHAPTER_COLUMNS, COMMENT_COLUMNS, STORY_COLUMNS,
};

/// Filtered stories with their published chapter count. Parameters:
/// `$1` status, `$2` ILIKE pattern, `$3` min count, `$4` exclusive max count.
const CATALOG_FILTER: &str = r"
WITH published AS (
    SELECT story_id, COUNT(*) AS cnt
    FROM chapters
    WHERE NOT is_raw
    GROUP BY story_id
),
filtered AS (
    SELECT s.*, COALESCE(p.cnt, 0) AS chapter_count
    FROM stories s
    LEFT JOIN published p ON p.story_id = s.id
    WHERE ($1::TEXT IS NULL OR s.status = $1)
      AND ($2::TEXT IS NULL
           OR s.title ILIKE $2 ESCAPE '\'
           OR s.author ILIKE $2 ESCAPE '\'
           OR EXISTS (SELECT 1 FROM unnest(s.aliases) AS alias WHERE alias ILIKE $2 ESCAPE '\'))
      AND COALESCE(p.cnt, 0) >= $3
      AND ($4::BIGINT IS NULL OR COALESCE(p.cnt, 0) < $4)
)";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(db_err)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::internal(format!("migration failed: {e}")))?;
        info!("database migrations applied");
        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'_, Postgres>> {
        self.pool.begin().await.map_err(db_err)
    }
}

async fn lock_story(tx: &mut Transaction<'_, Postgres>, story_id: &str) -> Result<Story> {
    let sql = format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = $1 FOR UPDATE");
    let row: Option<StoryRow> = sqlx::query_as(&sql)
        .bind(story_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_err)?;
    row.ok_or_else(|| AppError::not_found("Story", story_id))?
        .try_into()
}

/// Writes the volume tree back, optionally bumping `last_updated_at`.
async fn save_volumes(
    tx: &mut Transaction<'_, Postgres>,
    story: &Story,
    bump: Option<DateTime<Utc>>,
) -> Result<()> {
    sqlx::query(
        "UPDATE stories SET volumes = $2, last_updated_at = COALESCE($3, last_updated_at) WHERE id = $1",
    )
    .bind(&story.id)
    .bind(Json(&story.volumes))
    .bind(bump)
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;
    Ok(())
}

/// Removes the comments of the given chapters, then the chapters.
async fn purge_chapters(
    tx: &mut Transaction<'_, Postgres>,
    chapter_ids: &[Uuid],
) -> Result<CascadeSummary> {
    let comments = sqlx::query("DELETE FROM comments WHERE chapter_id = ANY($1)")
        .bind(chapter_ids)
        .execute(&mut **tx)
        .await
        .map_err(db_err)?
        .rows_affected();
    let chapters = sqlx::query("DELETE FROM chapters WHERE id = ANY($1)")
        .bind(chapter_ids)
        .execute(&mut **tx)
        .await
        .map_err(db_err)?
        .rows_affected();
    Ok(CascadeSummary { chapters, comments })
}

/// `%keyword%` with LIKE metacharacters escaped.
fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl StoryRepository for PgStore {
    async fn insert_story(&self, story: &Story) -> Result<()> {
        let tags: Vec<String> = story.tags.iter().cloned().collect();
        sqlx::query(
            "INSERT INTO stories (id, title, author, aliases, description, cover_image, status, tags, \
             view_count, rating_mean, rating_count, is_in_banner, banner_priority, volumes, created_at, last_updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(&story.id)
        .bind(&story.title)
        .bind(&story.author)
        .bind(&story.aliases)
        .bind(&story.description)
        .bind(&story.cover_image)
        .bind(story.status.as_str())
        .bind(tags)
        .bind(count_to_db(story.view_count))
        .bind(story.rating.mean)
        .bind(count_to_db(story.rating.count))
        .bind(story.is_in_banner)
        .bind(story.banner_priority)
        .bind(Json(&story.volumes))
        .bind(story.created_at)
        .bind(story.last_updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_story(&self, story_id: &str) -> Result<Option<Story>> {
        let sql = format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = $1");
        let row: Option<StoryRow> = sqlx::query_as(&sql)
            .bind(story_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(Story::try_from).transpose()
    }

    async fn update_story(&self, story: &Story) -> Result<()> {
        let tags: Vec<String> = story.tags.iter().cloned().collect();
        let updated = sqlx::query(
            "UPDATE stories SET title = $2, author = $3, aliases = $4, description = $5, \
             cover_image = $6, status = $7, tags = $8, last_updated_at = $9 WHERE id = $1",
        )
        .bind(&story.id)
        .bind(&story.title)
        .bind(&story.author)
        .bind(&story.aliases)
        .bind(&story.description)
        .bind(&story.cover_image)
        .bind(story.status.as_str())
        .bind(tags)
        .bind(story.last_updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?
        .rows_affected();
        if updated == 0 {
            return Err(AppError::not_found("Story", &story.id));
        }
        Ok(())
    }

    async fn delete_story_cascade(&self, story_id: &str) -> Result<CascadeSummary> {
        let mut tx = self.begin().await?;
        lock_story(&mut tx, story_id).await?;
        let comments = sqlx::query("DELETE FROM comments WHERE story_id = $1")
            .bind(story_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .rows_affected();
        let chapters = sqlx::query("DELETE FROM chapters WHERE story_id = $1")
            .bind(story_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .rows_affected();
        sqlx::query("DELETE FROM stories WHERE id = $1")
            .bind(story_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        let summary = CascadeSummary { chapters, comments };
        debug!(story_id, ?summary, "postgres cascade delete");
        Ok(summary)
    }

    async fn add_volume(&self, story_id: &str, volume: &Volume) -> Result<()> {
        let mut tx = self.begin().await?;
        let mut story = lock_story(&mut tx, story_id).await?;
        if story.volumes.iter().any(|v| v.id == volume.id) {
            return Err(AppError::Conflict(format!("volume {} already exists", volume.id)));
        }
        story.volumes.push(volume.clone());
        save_volumes(&mut tx, &story, None).await?;
        tx.commit().await.map_err(db_err)
    }

    async fn rename_volume(&self, story_id: &str, volume_id: Uuid, title: &str) -> Result<()> {
        let mut tx = self.begin().await?;
        let mut story = lock_story(&mut tx, story_id).await?;
        story.rename_volume(volume_id, title)?;
        save_volumes(&mut tx, &story, None).await?;
        tx.commit().await.map_err(db_err)
    }

    async fn delete_volume_cascade(
        &self,
        story_id: &str,
        volume_id: Uuid,
        bumped_at: DateTime<Utc>,
    ) -> Result<CascadeSummary> {
        let mut tx = self.begin().await?;
        let mut story = lock_story(&mut tx, story_id).await?;
        let removed = story.remove_volume(volume_id)?;

        let mut chapter_ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM chapters WHERE story_id = $1 AND volume_id = $2")
                .bind(story_id)
                .bind(volume_id)
                .fetch_all(&mut *tx)
                .await
                .map_err(db_err)?;
        for id in removed.chapter_ids {
            if !chapter_ids.contains(&id) {
                chapter_ids.push(id);
            }
        }

        let summary = purge_chapters(&mut tx, &chapter_ids).await?;
        save_volumes(&mut tx, &story, (summary.chapters > 0).then_some(bumped_at)).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(summary)
    }

    async fn reorder_volumes(&self, story_id: &str, ordered_volume_ids: &[Uuid]) -> Result<Vec<Uuid>> {
        let mut tx = self.begin().await?;
        let mut story = lock_story(&mut tx, story_id).await?;
        story.reorder_volumes(ordered_volume_ids)?;
        save_volumes(&mut tx, &story, None).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(story.volumes.iter().map(|v| v.id).collect())
    }

    async fn reorder_chapters(
        &self,
        story_id: &str,
        volume_id: Uuid,
        ordered_chapter_ids: &[Uuid],
    ) -> Result<Vec<Uuid>> {
        let mut tx = self.begin().await?;
        let mut story = lock_story(&mut tx, story_id).await?;
        story.reorder_chapters(volume_id, ordered_chapter_ids)?;
        save_volumes(&mut tx, &story, None).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(story.volume(volume_id)?.chapter_ids.clone())
    }

    async fn record_user_rating(&self, user_id: Uuid, story_id: &str, value: u8) -> Result<RatingAggregate> {
        let mut tx = self.begin().await?;
        let story = lock_story(&mut tx, story_id).await?;
        sqlx::query("INSERT INTO preferences (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        let rated: bool = sqlx::query_scalar(
            "SELECT (ratings -> $2) IS NOT NULL FROM preferences WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .bind(story_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;
        if rated {
            return Err(AppError::Conflict(format!("story {story_id} already rated")));
        }

        let rating = story.rating.record(value)?;
        sqlx::query("UPDATE stories SET rating_mean = $2, rating_count = $3 WHERE id = $1")
            .bind(story_id)
            .bind(rating.mean)
            .bind(count_to_db(rating.count))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        sqlx::query(
            "UPDATE preferences SET ratings = ratings || jsonb_build_object($2::text, $3::int) \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(story_id)
        .bind(i32::from(value))
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        debug!(story_id, %user_id, value, "rating recorded");
        Ok(rating)
    }

    async fn set_banner(&self, story_id: &str, is_in_banner: bool, banner_priority: i32) -> Result<()> {
        let updated =
            sqlx::query("UPDATE stories SET is_in_banner = $2, banner_priority = $3 WHERE id = $1")
                .bind(story_id)
                .bind(is_in_banner)
                .bind(banner_priority)
                .execute(&self.pool)
                .await
                .map_err(db_err)?
                .rows_affected();
        if updated == 0 {
            return Err(AppError::not_found("Story", story_id));
        }
        Ok(())
    }

    async fn list_banner_stories(&self) -> Result<Vec<Story>> {
        let sql = format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE is_in_banner \
             ORDER BY banner_priority ASC, last_updated_at DESC"
        );
        let rows: Vec<StoryRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter().map(Story::try_from).collect()
    }

    async fn search_catalog(&self, query: &CatalogQuery) -> Result<CatalogPage> {
        let status = query.status.map(|s| s.as_str());
        let pattern = query.normalized_keyword().map(|k| like_pattern(&k));
        let (min, max) = query.bucket.map_or((0, None), |b| b.bounds());
        let (min, max) = (count_to_db(min), max.map(count_to_db));

        let count_sql = format!("{CATALOG_FILTER} SELECT COUNT(*) FROM filtered");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(status)
            .bind(&pattern)
            .bind(min)
            .bind(max)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        let page_sql = format!(
            "{CATALOG_FILTER}
            SELECT s.*, lc.id AS latest_id, lc.title AS latest_title, lc.created_at AS latest_created_at
            FROM filtered s
            LEFT JOIN LATERAL (
                SELECT c.id, c.title, c.created_at
                FROM chapters c
                WHERE c.story_id = s.id AND NOT c.is_raw
                ORDER BY c.created_at DESC, c.id DESC
                LIMIT 1
            ) lc ON TRUE
            ORDER BY {}
            LIMIT $5 OFFSET $6",
            order_by_clause(query.sort)
        );
        let rows: Vec<CatalogRow> = sqlx::query_as(&page_sql)
            .bind(status)
            .bind(&pattern)
            .bind(min)
            .bind(max)
            .bind(i64::from(query.page_size))
            .bind(count_to_db(query.offset()))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        let items = rows
            .into_iter()
            .map(StorySummary::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(CatalogPage {
            items,
            total: rows::count_from_db(total),
            page: query.page,
            page_size: query.page_size,
        })
    }
}

#[async_trait]
impl ChapterRepository for PgStore {
    async fn insert_chapter(&self, chapter: &Chapter, bump: Option<DateTime<Utc>>) -> Result<()> {
        let mut tx = self.begin().await?;
        let mut story = lock_story(&mut tx, &chapter.story_id).await?;
        story.attach_chapter(chapter.volume_id, chapter.id)?;

        sqlx::query(
            "INSERT INTO chapters (id, story_id, volume_id, title, content, is_raw, view_count, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(chapter.id)
        .bind(&chapter.story_id)
        .bind(chapter.volume_id)
        .bind(&chapter.title)
        .bind(&chapter.content)
        .bind(chapter.is_raw)
        .bind(count_to_db(chapter.view_count))
        .bind(chapter.created_at)
        .bind(chapter.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        save_volumes(&mut tx, &story, bump).await?;
        tx.commit().await.map_err(db_err)
    }

    async fn get_chapter(&self, chapter_id: Uuid) -> Result<Option<Chapter>> {
        let sql = format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id = $1");
        let row: Option<ChapterRow> = sqlx::query_as(&sql)
            .bind(chapter_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Chapter::from))
    }

    async fn update_chapter(&self, chapter: &Chapter, bump: Option<DateTime<Utc>>) -> Result<()> {
        let mut tx = self.begin().await?;
        let updated = sqlx::query(
            "UPDATE chapters SET title = $2, content = $3, is_raw = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(chapter.id)
        .bind(&chapter.title)
        .bind(&chapter.content)
        .bind(chapter.is_raw)
        .bind(chapter.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?
        .rows_affected();
        if updated == 0 {
            return Err(AppError::not_found("Chapter", chapter.id));
        }
        if let Some(at) = bump {
            sqlx::query("UPDATE stories SET last_updated_at = $2 WHERE id = $1")
                .bind(&chapter.story_id)
                .bind(at)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)
    }

    async fn delete_chapter(
        &self,
        story_id: &str,
        chapter_id: Uuid,
        bumped_at: DateTime<Utc>,
    ) -> Result<CascadeSummary> {
        let mut tx = self.begin().await?;
        let mut story = lock_story(&mut tx, story_id).await?;
        let owner: Option<String> =
            sqlx::query_scalar("SELECT story_id FROM chapters WHERE id = $1 FOR UPDATE")
                .bind(chapter_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?;
        if owner.as_deref() != Some(story_id) {
            return Err(AppError::not_found("Chapter", chapter_id));
        }

        story.detach_chapter(chapter_id);
        let summary = purge_chapters(&mut tx, &[chapter_id]).await?;
        save_volumes(&mut tx, &story, Some(bumped_at)).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(summary)
    }

    async fn list_chapter_stubs(&self, story_id: &str) -> Result<Vec<ChapterStub>> {
        let rows: Vec<ChapterStubRow> = sqlx::query_as(
            "SELECT id, title, view_count, is_raw, created_at FROM chapters \
             WHERE story_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(story_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(ChapterStub::from).collect())
    }

    async fn record_chapter_view(&self, story_id: &str, chapter_id: Uuid) -> Result<u64> {
        let mut tx = self.begin().await?;
        let count: Option<i64> = sqlx::query_scalar(
            "UPDATE chapters SET view_count = view_count + 1 \
             WHERE id = $1 AND story_id = $2 RETURNING view_count",
        )
        .bind(chapter_id)
        .bind(story_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;
        let count = count.ok_or_else(|| AppError::not_found("Chapter", chapter_id))?;
        sqlx::query("UPDATE stories SET view_count = view_count + 1 WHERE id = $1")
            .bind(story_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(rows::count_from_db(count))
    }
}

#[async_trait]
impl CommentRepository for PgStore {
    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO comments (id, story_id, chapter_id, user_id, username, parent_id, content, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(comment.id)
        .bind(&comment.story_id)
        .bind(comment.chapter_id)
        .bind(comment.user_id)
        .bind(&comment.username)
        .bind(comment.parent_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(AppError::not_found("Chapter", comment.chapter_id))
            }
            Err(err) => Err(db_err(err)),
        }
    }

    async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        let row: Option<CommentRow> = sqlx::query_as(&sql)
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Comment::from))
    }

    async fn list_chapter_comments(&self, story_id: &str, chapter_id: Uuid) -> Result<Vec<Comment>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE story_id = $1 AND chapter_id = $2 \
             ORDER BY created_at ASC, id ASC"
        );
        let rows: Vec<CommentRow> = sqlx::query_as(&sql)
            .bind(story_id)
            .bind(chapter_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn list_reply_ids(&self, parent_ids: &[Uuid]) -> Result<Vec<Uuid>> {
        sqlx::query_scalar(
            "SELECT id FROM comments WHERE parent_id = ANY($1) ORDER BY created_at ASC, id ASC",
        )
        .bind(parent_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn delete_comments(&self, comment_ids: &[Uuid]) -> Result<u64> {
        let deleted = sqlx::query("DELETE FROM comments WHERE id = ANY($1)")
            .bind(comment_ids)
            .execute(&self.pool)
            .await
            .map_err(db_err)?
            .rows_affected();
        Ok(deleted)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, role, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match db_err(err) {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("username {} is already taken", user.username))
            }
            other => other,
        })?;
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(User::try_from).transpose()
    }

    async fn get_preferences(&self, user_id: Uuid) -> Result<Option<Preferences>> {
        let row: Option<PreferencesRow> = sqlx::query_as(
            "SELECT user_id, favorites, bookmarks, ratings FROM preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(Preferences::from))
    }

    async fn save_preferences(&self, preferences: &Preferences) -> Result<()> {
        let favorites: Vec<String> = preferences.favorites.iter().cloned().collect();
        sqlx::query(
            "INSERT INTO preferences (user_id, favorites, bookmarks) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET favorites = EXCLUDED.favorites, \
             bookmarks = EXCLUDED.bookmarks",
        )
        .bind(preferences.user_id)
        .bind(favorites)
        .bind(Json(&preferences.bookmarks))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}
