use crate::domain_model::{Fields, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const FOLLOWER_FIELD: &str = "followerId";
pub const FOLLOWED_FIELD: &str = "followedId";

/// A "follows" edge as stored in the follower collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowEdge {
    pub follower_id: UserId,
    pub followed_id: UserId,
}

impl FollowEdge {
    pub fn new(follower_id: UserId, followed_id: UserId) -> Self {
        Self {
            follower_id,
            followed_id,
        }
    }

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(
            FOLLOWER_FIELD.to_owned(),
            Value::String(self.follower_id.0.clone()),
        );
        fields.insert(
            FOLLOWED_FIELD.to_owned(),
            Value::String(self.followed_id.0.clone()),
        );
        fields
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowIntent {
    Follow,
    Unfollow,
}

impl FollowIntent {
    /// The intent a toggle button issues from the given displayed state.
    pub fn toggle_from(is_following: bool) -> Self {
        if is_following {
            FollowIntent::Unfollow
        } else {
            FollowIntent::Follow
        }
    }
}

impl fmt::Display for FollowIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FollowIntent::Follow => write!(f, "follow"),
            FollowIntent::Unfollow => write!(f, "unfollow"),
        }
    }
}

/// What a caller displays for a `(viewer, target)` pair.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipView {
    pub is_following: bool,
    pub follower_count: u64,
}

impl RelationshipView {
    pub fn new(is_following: bool, follower_count: u64) -> Self {
        Self {
            is_following,
            follower_count,
        }
    }
}
