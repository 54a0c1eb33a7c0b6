//! Social feed.

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use crate::db::{PostRepository, RepositoryError};
use crate::models::post::FeedPost;
use crate::models::session::CurrentUser;
use crate::services::storage::{BlobStorage, StorageError, Upload};

/// Folder inside the bucket that post images go to.
const POST_IMAGES: &str = "post-images";

/// Errors from feed operations.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Only farmers can create posts")]
    NotAFarmer,

    #[error("Caption is required")]
    MissingCaption,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A post as submitted by a farmer.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub caption: String,
    pub image_url: Option<String>,
    pub image: Option<Upload>,
}

pub struct FeedService<'a> {
    posts: PostRepository<'a>,
    storage: &'a BlobStorage,
}

impl<'a> FeedService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, storage: &'a BlobStorage) -> Self {
        Self {
            posts: PostRepository::new(pool),
            storage,
        }
    }

    /// All posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Repository` if the query fails.
    pub async fn list(&self) -> Result<Vec<FeedPost>, FeedError> {
        Ok(self.posts.list_feed().await?)
    }

    /// Publish a post. An uploaded image replaces any supplied image URL.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::NotAFarmer` for shoppers, `FeedError::MissingCaption`
    /// for a blank caption and `FeedError::Storage` if the image is rejected.
    #[instrument(skip(self, post), fields(user_id = %author.id))]
    pub async fn create(&self, author: &CurrentUser, post: NewPost) -> Result<FeedPost, FeedError> {
        if !author.is_farmer {
            return Err(FeedError::NotAFarmer);
        }
        let caption = post.caption.trim();
        if caption.is_empty() {
            return Err(FeedError::MissingCaption);
        }

        let stored = match &post.image {
            Some(upload) => Some(self.storage.store_image(POST_IMAGES, upload).await?),
            None => None,
        };
        let image_url = match &stored {
            Some(object) => Some(object.url.as_str()),
            None => post
                .image_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty()),
        };

        let created = match self.posts.create(author.id, caption, image_url).await {
            Ok(created) => created,
            Err(e) => {
                if let Some(object) = &stored {
                    self.discard(&object.path).await;
                }
                return Err(e.into());
            }
        };
        tracing::info!(post_id = %created.id, "Post published");
        Ok(created)
    }

    /// Remove an upload whose post was never written.
    async fn discard(&self, object_path: &str) {
        if let Err(e) = self.storage.delete(object_path).await {
            tracing::warn!(object = %object_path, error = %e, "Failed to remove orphaned upload");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use farmers_place_core::{Email, UserId};
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    use super::*;

    fn author(is_farmer: bool) -> CurrentUser {
        CurrentUser {
            id: UserId::new(3),
            email: Email::parse("ada@example.com").unwrap(),
            is_farmer,
        }
    }

    /// A pool that fails on first use: nowhere listens on port 1.
    fn unreachable_pool() -> PgPool {
        PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://localhost:1/farmers_place_test")
            .unwrap()
    }

    fn image_post() -> NewPost {
        NewPost {
            caption: "First eggs of spring".to_string(),
            image_url: Some("https://example.com/old.png".to_string()),
            image: Some(Upload {
                file_name: Some("eggs.png".to_string()),
                content_type: Some("image/png".to_string()),
                bytes: b"\x89PNG".to_vec(),
            }),
        }
    }

    #[tokio::test]
    async fn test_only_farmers_post() {
        let pool = unreachable_pool();
        let storage = BlobStorage::new(std::env::temp_dir(), "http://localhost:3000");
        let feed = FeedService::new(&pool, &storage);

        let err = feed.create(&author(false), image_post()).await.unwrap_err();
        assert_eq!(err.to_string(), "Only farmers can create posts");

        let blank = NewPost {
            caption: "   ".to_string(),
            ..NewPost::default()
        };
        let err = feed.create(&author(true), blank).await.unwrap_err();
        assert!(matches!(err, FeedError::MissingCaption));
    }

    #[tokio::test]
    async fn test_failed_insert_removes_upload() {
        let pool = unreachable_pool();
        let root = std::env::temp_dir().join(format!("fp-feed-{}", Uuid::new_v4()));
        let storage = BlobStorage::new(root.clone(), "http://localhost:3000");
        let feed = FeedService::new(&pool, &storage);

        let err = feed.create(&author(true), image_post()).await.unwrap_err();
        assert!(matches!(err, FeedError::Repository(_)));

        let folder = storage.bucket_dir().join(POST_IMAGES);
        let mut entries = tokio::fs::read_dir(&folder).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
