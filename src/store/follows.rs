use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::db::Db;
use crate::error::{FollowError, Result};
use crate::store::users::user_exists_in;
use crate::store::{EdgeSource, FollowEdge, FollowEntry};
use crate::validate::validate_username;

/// Relationship store: exclusive owner of follow edge lifecycle.
#[derive(Debug, Clone)]
pub struct FollowStore {
    db: Db,
}

impl FollowStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Upsert the edge `follower -> followed`, stamping it with the current time.
    ///
    /// Both users must exist. Repeating the call keeps a single edge and only
    /// refreshes `followed_at`. Existence checks and the upsert share one
    /// transaction, so a failed call leaves the edge unchanged.
    pub async fn create_follow(&self, follower: &str, followed: &str) -> Result<FollowEdge> {
        validate_username(follower)?;
        validate_username(followed)?;

        if follower == followed {
            return Err(FollowError::SelfFollow);
        }

        log::info!("Creating follow: {} -> {}", follower, followed);

        let edge = FollowEdge::new(follower, followed, Utc::now());
        let row = edge.clone();
        self.db
            .with_connection(move |conn| {
                let tx = conn.transaction()?;
                for username in [&row.follower, &row.followed] {
                    if !user_exists_in(&tx, username)? {
                        log::error!("User '{}' not found, follow not created", username);
                        return Err(FollowError::UserNotFound(username.clone()));
                    }
                }
                tx.execute(
                    "INSERT INTO follows (follower, followed, edge_key, followed_at) \
                     VALUES (?1, ?2, ?3, ?4) \
                     ON CONFLICT(follower, followed) DO UPDATE SET followed_at = excluded.followed_at",
                    params![row.follower, row.followed, row.key, row.followed_at],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await?;

        log::info!("Follow saved: {}", edge.key);
        Ok(edge)
    }

    /// Users following `username`. Unknown users have no followers.
    pub async fn get_followers(&self, username: &str) -> Result<Vec<FollowEntry>> {
        log::debug!("Getting followers for '{}'", username);
        let edges = self.inbound(username).await?;
        let entries: Vec<FollowEntry> = edges.iter().map(FollowEntry::source_of).collect();
        log::debug!("Found {} followers", entries.len());
        Ok(entries)
    }

    /// Users `username` follows. Unknown users follow nobody.
    pub async fn get_following(&self, username: &str) -> Result<Vec<FollowEntry>> {
        log::debug!("Getting users followed by '{}'", username);
        let edges = self.outbound(username).await?;
        let entries: Vec<FollowEntry> = edges.iter().map(FollowEntry::target_of).collect();
        log::debug!("Found {} followed users", entries.len());
        Ok(entries)
    }

    /// Remove the edge `follower -> followed`. Returns whether an edge existed.
    pub async fn delete_follow(&self, follower: &str, followed: &str) -> Result<bool> {
        validate_username(follower)?;
        validate_username(followed)?;

        log::info!("Deleting follow: {} -> {}", follower, followed);

        let (from, to) = (follower.to_string(), followed.to_string());
        let removed = self
            .db
            .with_connection(move |conn| {
                let changed = conn.execute(
                    "DELETE FROM follows WHERE follower = ?1 AND followed = ?2",
                    params![from, to],
                )?;
                Ok::<bool, FollowError>(changed > 0)
            })
            .await?;

        if removed {
            log::info!("Follow deleted");
        } else {
            log::info!("Follow not found");
        }
        Ok(removed)
    }

    pub async fn count_followers(&self, username: &str) -> Result<u64> {
        let count = self.count_where("followed", username).await?;
        log::info!("User '{}' has {} followers", username, count);
        Ok(count)
    }

    pub async fn count_following(&self, username: &str) -> Result<u64> {
        let count = self.count_where("follower", username).await?;
        log::info!("User '{}' is following {} users", username, count);
        Ok(count)
    }

    async fn count_where(&self, column: &'static str, username: &str) -> Result<u64> {
        let name = username.to_string();
        self.db
            .with_connection(move |conn| {
                let sql = format!("SELECT COUNT(*) FROM follows WHERE {} = ?1", column);
                let count: i64 = conn.query_row(&sql, [name], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
    }

    async fn edges_where(&self, column: &'static str, username: &str) -> Result<Vec<FollowEdge>> {
        let name = username.to_string();
        self.db
            .with_connection(move |conn| select_edges(conn, column, &name))
            .await
    }
}

/// Edges matching `column = username`, in insertion order.
fn select_edges(conn: &Connection, column: &str, username: &str) -> Result<Vec<FollowEdge>> {
    let sql = format!(
        "SELECT edge_key, follower, followed, followed_at FROM follows \
         WHERE {} = ?1 ORDER BY rowid",
        column
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([username], |row| {
        Ok(FollowEdge {
            key: row.get(0)?,
            follower: row.get(1)?,
            followed: row.get(2)?,
            followed_at: row.get::<_, DateTime<Utc>>(3)?,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

impl EdgeSource for FollowStore {
    async fn outbound(&self, username: &str) -> Result<Vec<FollowEdge>> {
        self.edges_where("follower", username).await
    }

    async fn inbound(&self, username: &str) -> Result<Vec<FollowEdge>> {
        self.edges_where("followed", username).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testutil::migrated_db;
    use crate::store::UserStore;

    async fn setup(users: &[&str]) -> (FollowStore, tempfile::TempDir) {
        let (db, temp) = migrated_db().await;
        let user_store = UserStore::new(db.clone());
        for user in users {
            user_store.create_user(user).await.unwrap();
        }
        (FollowStore::new(db), temp)
    }

    fn names(entries: &[FollowEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.username.as_str()).collect()
    }

    #[tokio::test]
    async fn test_create_and_query_follow() {
        let (follows, _temp) = setup(&["alice", "bob"]).await;

        let edge = follows.create_follow("alice", "bob").await.unwrap();
        assert_eq!(edge.key, "alice__bob");

        let followers = follows.get_followers("bob").await.unwrap();
        let following = follows.get_following("alice").await.unwrap();
        assert_eq!(names(&followers), vec!["alice"]);
        assert_eq!(names(&following), vec!["bob"]);
        assert_eq!(following[0].followed_at, Some(edge.followed_at));
    }

    #[tokio::test]
    async fn test_create_follow_is_idempotent() {
        let (follows, _temp) = setup(&["alice", "bob"]).await;

        let first = follows.create_follow("alice", "bob").await.unwrap();
        let second = follows.create_follow("alice", "bob").await.unwrap();
        assert!(second.followed_at >= first.followed_at);

        let followers = follows.get_followers("bob").await.unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].followed_at, Some(second.followed_at));
        assert_eq!(follows.get_following("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_follow_edge() {
        let (follows, _temp) = setup(&["charlie", "dave"]).await;

        follows.create_follow("charlie", "dave").await.unwrap();
        assert!(follows.delete_follow("charlie", "dave").await.unwrap());
        assert!(!follows.delete_follow("charlie", "dave").await.unwrap());
        assert!(follows.get_followers("dave").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_directional() {
        let (follows, _temp) = setup(&["alice", "bob"]).await;

        follows.create_follow("alice", "bob").await.unwrap();
        assert!(!follows.delete_follow("bob", "alice").await.unwrap());
        assert_eq!(follows.get_following("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cannot_follow_nonexistent_user() {
        let (follows, _temp) = setup(&["alice"]).await;

        let err = follows.create_follow("ghost", "phantom").await.unwrap_err();
        assert!(matches!(err, FollowError::UserNotFound(_)));

        let err = follows.create_follow("alice", "phantom").await.unwrap_err();
        assert!(matches!(err, FollowError::UserNotFound(ref name) if name == "phantom"));
        assert!(follows.get_following("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cannot_follow_self() {
        let (follows, _temp) = setup(&["eve"]).await;

        let err = follows.create_follow("eve", "eve").await.unwrap_err();
        assert!(matches!(err, FollowError::SelfFollow));
        assert!(follows.get_following("eve").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_usernames() {
        let (follows, _temp) = setup(&["alice"]).await;

        assert!(matches!(
            follows.create_follow("", "alice").await,
            Err(FollowError::InvalidArgument(_))
        ));
        assert!(matches!(
            follows.delete_follow("alice", " ").await,
            Err(FollowError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_listing_unknown_user_is_empty() {
        let (follows, _temp) = setup(&[]).await;

        assert!(follows.get_followers("nobody").await.unwrap().is_empty());
        assert!(follows.get_following("nobody").await.unwrap().is_empty());
        assert_eq!(follows.count_followers("nobody").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_counts() {
        let (follows, _temp) = setup(&["a", "b", "c"]).await;

        follows.create_follow("a", "c").await.unwrap();
        follows.create_follow("b", "c").await.unwrap();
        follows.create_follow("c", "a").await.unwrap();

        assert_eq!(follows.count_followers("c").await.unwrap(), 2);
        assert_eq!(follows.count_following("c").await.unwrap(), 1);
        assert_eq!(follows.count_following("b").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_keys_with_separator_do_not_collide() {
        let (follows, _temp) = setup(&["a__", "b", "a", "__b"]).await;

        follows.create_follow("a__", "b").await.unwrap();
        follows.create_follow("a", "__b").await.unwrap();

        assert_eq!(names(&follows.get_following("a__").await.unwrap()), vec!["b"]);
        assert_eq!(names(&follows.get_following("a").await.unwrap()), vec!["__b"]);
    }

    #[tokio::test]
    async fn test_outbound_insertion_order() {
        let (follows, _temp) = setup(&["root", "x", "y", "z"]).await;

        for target in ["y", "z", "x"] {
            follows.create_follow("root", target).await.unwrap();
        }
        // Re-following keeps the original position.
        follows.create_follow("root", "y").await.unwrap();

        let edges = follows.outbound("root").await.unwrap();
        let targets: Vec<_> = edges.iter().map(|e| e.followed.as_str()).collect();
        assert_eq!(targets, vec!["y", "z", "x"]);
    }
}
