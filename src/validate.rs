//! Input validation shared by the stores, the traversal engine and the HTTP layer.
//!
//! Every check here runs before any database access.

use crate::error::{FollowError, Result};

/// Username must contain at least one non-whitespace character.
pub fn validate_username(username: &str) -> Result<()> {
    log::debug!("Validating username: {:?}", username);
    if username.trim().is_empty() {
        log::debug!("Validation failed: username must be a non-empty string");
        return Err(FollowError::InvalidArgument(
            "username must be non-empty".to_string(),
        ));
    }
    Ok(())
}

/// Check a traversal depth and convert it to a hop count.
pub fn validate_max_depth(max_depth: i64) -> Result<usize> {
    usize::try_from(max_depth).map_err(|_| {
        FollowError::InvalidArgument(format!(
            "max depth must be a non-negative integer, got {}",
            max_depth
        ))
    })
}

/// Parse a textual depth (query string, CLI argument).
pub fn parse_max_depth(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| FollowError::InvalidArgument("max depth must be an integer".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username(" bob ").is_ok());
    }

    #[test]
    fn test_empty_and_blank_usernames_rejected() {
        for name in ["", "   ", "\t\n"] {
            let err = validate_username(name).unwrap_err();
            assert!(matches!(err, FollowError::InvalidArgument(_)), "{:?}", name);
        }
    }

    #[test]
    fn test_depth_bounds() {
        assert_eq!(validate_max_depth(0).unwrap(), 0);
        assert_eq!(validate_max_depth(7).unwrap(), 7);
        assert!(matches!(
            validate_max_depth(-1),
            Err(FollowError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_depth() {
        assert_eq!(parse_max_depth("3").unwrap(), 3);
        assert_eq!(parse_max_depth(" 2 ").unwrap(), 2);
        assert_eq!(parse_max_depth("-4").unwrap(), -4);

        for raw in ["", "two", "2.5", "3x"] {
            let err = parse_max_depth(raw).unwrap_err();
            assert!(err.to_string().contains("max depth must be an integer"), "{:?}", raw);
        }
    }
}
