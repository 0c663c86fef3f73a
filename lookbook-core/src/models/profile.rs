use serde::{Deserialize, Serialize};
use std::fmt;

/// Profile of a fan account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Profile of a creator account. Creators are backed by a user account,
/// `user_id` points at it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatorProfile {
    pub id: i64,
    pub user_id: i64,
    pub display_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub subscription_price: Option<f64>,
}

/// The profile returned by `/me`, discriminated by the `kind` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Profile {
    User(UserProfile),
    Creator(CreatorProfile),
}

impl Profile {
    /// Id used as the acting identity for ownership checks. Collections are
    /// owned by creators, so a creator acts under its creator id.
    pub fn actor_id(&self) -> i64 {
        match self {
            Profile::User(user) => user.id,
            Profile::Creator(creator) => creator.id,
        }
    }

    pub fn is_creator(&self) -> bool {
        matches!(self, Profile::Creator(_))
    }

    pub fn display_name(&self) -> &str {
        match self {
            Profile::User(user) => &user.username,
            Profile::Creator(creator) => &creator.display_name,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::User(user) => write!(f, "{} (user #{})", user.username, user.id),
            Profile::Creator(creator) => {
                write!(f, "{} (creator #{})", creator.display_name, creator.id)
            }
        }
    }
}
