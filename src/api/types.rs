//! Wire types for the HTTP API. Field names are part of the public contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::FollowEntry;

/// Body of `POST /follow` and `DELETE /follow`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowRequest {
    pub follower: String,
    pub followed: String,
}

/// One user in a follow listing or traversal result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowOut {
    pub followed: String,
    pub followed_at: Option<DateTime<Utc>>,
}

impl From<FollowEntry> for FollowOut {
    fn from(entry: FollowEntry) -> Self {
        Self {
            followed: entry.username,
            followed_at: entry.followed_at,
        }
    }
}

/// Query string of the traversal routes. `depth` is kept textual so a
/// non-integer value is reported as an invalid argument.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TraverseParams {
    pub depth: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowerCount {
    pub follower_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowingCount {
    pub following_count: u64,
}

/// Body of `POST /users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserOut {
    pub username: String,
    /// False when the user already existed.
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthOut {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
