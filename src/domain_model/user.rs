use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque account identifier handed out by the identity provider.
#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_owned())
    }
}

impl std::str::FromStr for UserId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("empty user id".to_string());
        }
        Ok(UserId(trimmed.to_owned()))
    }
}

/// Directed `(follower, followed)` pair. Unlike an unordered friendship pair,
/// `(a, b)` and `(b, a)` are distinct keys.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct FollowPair {
    follower: UserId,
    followed: UserId,
}

impl FollowPair {
    pub fn new(follower: UserId, followed: UserId) -> Self {
        Self { follower, followed }
    }

    pub fn follower(&self) -> &UserId {
        &self.follower
    }

    pub fn followed(&self) -> &UserId {
        &self.followed
    }

    pub fn is_self_loop(&self) -> bool {
        self.follower == self.followed
    }
}

impl fmt::Display for FollowPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.follower, self.followed)
    }
}
