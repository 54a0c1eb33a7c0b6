//! Social feed route handlers.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::FeedPost;
use crate::services::feed::{FeedService, NewPost};
use crate::services::storage::{MAX_UPLOAD_BYTES, StorageError, Upload};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub success: bool,
    pub posts: Vec<FeedPost>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub success: bool,
    pub post: FeedPost,
}

/// GET /posts
pub async fn index(State(state): State<AppState>) -> Result<Json<FeedResponse>> {
    let posts = FeedService::new(state.pool(), state.storage())
        .list()
        .await?;
    Ok(Json(FeedResponse {
        success: true,
        posts,
    }))
}

/// POST /posts
///
/// Multipart fields: `caption`, optional `image_url`, optional `image_file`.
#[instrument(skip(state, user, multipart), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PostResponse>)> {
    let post = read_post(multipart).await.map_err(multipart_error)?;

    let post = FeedService::new(state.pool(), state.storage())
        .create(&user, post)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            success: true,
            post,
        }),
    ))
}

async fn read_post(mut multipart: Multipart) -> std::result::Result<NewPost, MultipartError> {
    let mut post = NewPost::default();

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("caption") => post.caption = field.text().await?,
            Some("image_url") => post.image_url = Some(field.text().await?),
            Some("image_file") => {
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await?.to_vec();

                // Browsers send an empty part when no file was chosen.
                let chosen =
                    !bytes.is_empty() || file_name.as_deref().is_some_and(|n| !n.is_empty());
                if chosen {
                    post.image = Some(Upload {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
            }
            _ => {}
        }
    }

    Ok(post)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return StorageError::TooLarge {
            max: MAX_UPLOAD_BYTES,
        }
        .into();
    }
    AppError::BadRequest(err.body_text())
}
