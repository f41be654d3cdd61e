use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::Db;
use crate::error::{FollowError, Result};
use crate::validate::validate_username;

/// Identity store: user records keyed by username.
#[derive(Debug, Clone)]
pub struct UserStore {
    db: Db,
}

impl UserStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Create the user if absent. Returns `true` if a new record was inserted,
    /// `false` if the username already existed.
    pub async fn create_user(&self, username: &str) -> Result<bool> {
        validate_username(username)?;

        let name = username.to_string();
        let created = self
            .db
            .with_connection(move |conn| {
                let changed = conn.execute(
                    "INSERT INTO users (username, created_at) VALUES (?1, ?2) \
                     ON CONFLICT(username) DO NOTHING",
                    params![name, Utc::now()],
                )?;
                Ok::<bool, FollowError>(changed == 1)
            })
            .await?;

        if created {
            log::info!("User '{}' created", username);
        } else {
            log::info!("User '{}' already exists", username);
        }
        Ok(created)
    }

    pub async fn user_exists(&self, username: &str) -> Result<bool> {
        validate_username(username)?;

        let name = username.to_string();
        let exists = self
            .db
            .with_connection(move |conn| user_exists_in(conn, &name))
            .await?;

        log::debug!("Exists check for '{}': {}", username, exists);
        Ok(exists)
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.db
            .with_connection(|conn| {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
    }
}

/// Existence check usable inside another store's transaction.
pub(crate) fn user_exists_in(conn: &Connection, username: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM users WHERE username = ?1",
            [username],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}
