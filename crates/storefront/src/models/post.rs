//! Social feed types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use farmers_place_core::{PostId, UserId};

/// A post as shown in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedPost {
    pub id: PostId,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user: FeedAuthor,
}

/// Author block of a feed post. `profile_photo` is always populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedAuthor {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub profile_photo: String,
}
