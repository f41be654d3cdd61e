use thiserror::Error;

/// Main error type for the follow service
#[derive(Error, Debug)]
pub enum FollowError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed input: empty username, non-integer or negative depth
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Follower and followed are the same user
    #[error("Cannot follow oneself")]
    SelfFollow,

    /// A referenced user does not exist
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// No follow edge for the given pair
    #[error("Follow relation not found: {follower} -> {followed}")]
    FollowNotFound { follower: String, followed: String },

    /// Message broker errors
    #[error("Broker error: {0}")]
    Broker(#[from] lapin::Error),

    /// JSON encoding/decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Traversal exceeded its wall-clock budget (milliseconds)
    #[error("Traversal timed out after {0} ms")]
    Timeout(u64),

    /// Blocking task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),
}

/// Convenient Result type using FollowError
pub type Result<T> = std::result::Result<T, FollowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FollowError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_error_from_rusqlite() {
        let rusqlite_err = rusqlite::Error::InvalidQuery;
        let err: FollowError = rusqlite_err.into();
        assert!(matches!(err, FollowError::Database(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FollowError = io_err.into();
        assert!(matches!(err, FollowError::Io(_)));
    }

    #[test]
    fn test_follow_not_found_display() {
        let err = FollowError::FollowNotFound {
            follower: "alice".into(),
            followed: "bob".into(),
        };
        assert_eq!(err.to_string(), "Follow relation not found: alice -> bob");
    }
}
