//! Identity and relationship stores over SQLite.
//!
//! `UserStore` owns user records, `FollowStore` owns follow edges. The graph
//! traversal engine only sees follow edges through the [`EdgeSource`] trait.

mod follows;
mod users;

pub use follows::FollowStore;
pub use users::UserStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::Result;

/// Deterministic document key for an ordered (follower, followed) pair.
pub fn edge_key(follower: &str, followed: &str) -> String {
    format!("{}__{}", follower, followed)
}

/// A stored "follower follows followed" edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowEdge {
    pub key: String,
    pub follower: String,
    pub followed: String,
    pub followed_at: DateTime<Utc>,
}

impl FollowEdge {
    pub fn new(follower: &str, followed: &str, followed_at: DateTime<Utc>) -> Self {
        Self {
            key: edge_key(follower, followed),
            follower: follower.to_string(),
            followed: followed.to_string(),
            followed_at,
        }
    }
}

/// One user in a listing or traversal result, with the timestamp of the edge
/// that connected it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowEntry {
    pub username: String,
    pub followed_at: Option<DateTime<Utc>>,
}

impl FollowEntry {
    /// Entry for the vertex an edge points to.
    pub fn target_of(edge: &FollowEdge) -> Self {
        Self {
            username: edge.followed.clone(),
            followed_at: Some(edge.followed_at),
        }
    }

    /// Entry for the vertex an edge starts from.
    pub fn source_of(edge: &FollowEdge) -> Self {
        Self {
            username: edge.follower.clone(),
            followed_at: Some(edge.followed_at),
        }
    }
}

/// Adjacency access the traversal engine runs against.
///
/// Implementations return edges in a stable order for a given store state.
pub trait EdgeSource: Send + Sync {
    /// Edges whose follower is `username`.
    fn outbound(&self, username: &str) -> impl Future<Output = Result<Vec<FollowEdge>>> + Send;

    /// Edges whose followed user is `username`.
    fn inbound(&self, username: &str) -> impl Future<Output = Result<Vec<FollowEdge>>> + Send;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_key_format() {
        assert_eq!(edge_key("alice", "bob"), "alice__bob");
    }

    #[test]
    fn test_entries_from_edge() {
        let edge = FollowEdge::new("alice", "bob", Utc::now());
        assert_eq!(edge.key, "alice__bob");
        assert_eq!(FollowEntry::target_of(&edge).username, "bob");
        assert_eq!(FollowEntry::source_of(&edge).username, "alice");
        assert_eq!(FollowEntry::source_of(&edge).followed_at, Some(edge.followed_at));
    }
}
