//! Post repository for the social feed.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use farmers_place_core::{PostId, UserId};

use super::RepositoryError;
use crate::models::post::{FeedAuthor, FeedPost};
use crate::models::user::avatar_url;

#[derive(sqlx::FromRow)]
struct FeedRow {
    id: PostId,
    caption: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    user_id: UserId,
    first_name: String,
    last_name: String,
    profile_photo: Option<String>,
}

impl From<FeedRow> for FeedPost {
    fn from(r: FeedRow) -> Self {
        let profile_photo = avatar_url(r.profile_photo.as_deref(), &r.first_name, &r.last_name);
        Self {
            id: r.id,
            content: r.caption,
            image_url: r.image_url,
            created_at: r.created_at,
            user: FeedAuthor {
                id: r.user_id,
                first_name: r.first_name,
                last_name: r.last_name,
                profile_photo,
            },
        }
    }
}

const FEED_SELECT: &str = r"
    SELECT p.id, p.caption, p.image_url, p.created_at, p.user_id,
           u.first_name, u.last_name, u.profile_photo
    FROM storefront.post p
    JOIN storefront.user u ON u.id = p.user_id
";

/// Repository for feed posts.
pub struct PostRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PostRepository<'a> {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every post with its author, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_feed(&self) -> Result<Vec<FeedPost>, RepositoryError> {
        let rows = sqlx::query_as::<_, FeedRow>(&format!(
            "{FEED_SELECT} ORDER BY p.created_at DESC, p.id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(FeedPost::from).collect())
    }

    /// Insert a post and return it in feed format.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        caption: &str,
        image_url: Option<&str>,
    ) -> Result<FeedPost, RepositoryError> {
        let row = sqlx::query_as::<_, FeedRow>(
            r"
            WITH inserted AS (
                INSERT INTO storefront.post (caption, image_url, user_id)
                VALUES ($1, $2, $3)
                RETURNING id, caption, image_url, created_at, user_id
            )
            SELECT p.id, p.caption, p.image_url, p.created_at, p.user_id,
                   u.first_name, u.last_name, u.profile_photo
            FROM inserted p
            JOIN storefront.user u ON u.id = p.user_id
            ",
        )
        .bind(caption)
        .bind(image_url)
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
