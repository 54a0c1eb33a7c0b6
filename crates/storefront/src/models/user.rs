//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use farmers_place_core::{Email, UserId};

/// A storefront user: a shopper, or a farmer when `is_farmer` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_farmer: bool,
    pub phone_num: String,
    pub profile_photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Profile photo, or a generated initials avatar when none is set.
    #[must_use]
    pub fn avatar_url(&self) -> String {
        avatar_url(
            self.profile_photo.as_deref(),
            &self.first_name,
            &self.last_name,
        )
    }
}

/// Resolve a profile photo, falling back to a generated avatar.
#[must_use]
pub fn avatar_url(photo: Option<&str>, first_name: &str, last_name: &str) -> String {
    match photo {
        Some(url) if !url.trim().is_empty() => url.to_owned(),
        _ => format!(
            "https://ui-avatars.com/api/?name={}+{}&background=random",
            url_component(first_name),
            url_component(last_name)
        ),
    }
}

fn url_component(part: &str) -> String {
    url::form_urlencoded::byte_serialize(part.trim().as_bytes()).collect()
}

/// Fields needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_farmer: bool,
    pub phone_num: String,
}

/// Editable profile fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_num: String,
    #[serde(default)]
    pub profile_photo: Option<String>,
}

/// A farmer's display name, attached to catalog items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FarmerName {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_url_prefers_photo() {
        assert_eq!(
            avatar_url(Some("https://cdn.example.com/me.png"), "Ada", "Hart"),
            "https://cdn.example.com/me.png"
        );
    }

    #[test]
    fn test_avatar_url_fallback() {
        assert_eq!(
            avatar_url(None, "Ada", "Hart"),
            "https://ui-avatars.com/api/?name=Ada+Hart&background=random"
        );
        assert_eq!(
            avatar_url(Some("  "), "Mary Ann", "Lee"),
            "https://ui-avatars.com/api/?name=Mary+Ann+Lee&background=random"
        );
    }
}
