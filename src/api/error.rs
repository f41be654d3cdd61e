use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::api::types::ErrorBody;
use crate::error::FollowError;

impl FollowError {
    /// HTTP status for this error at the API boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            FollowError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            FollowError::SelfFollow
            | FollowError::UserNotFound(_)
            | FollowError::FollowNotFound { .. } => StatusCode::NOT_FOUND,
            FollowError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FollowError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        } else {
            log::debug!("Request rejected ({}): {}", status, self);
        }

        let message = match &self {
            // Infrastructure details stay in the log.
            FollowError::Database(_)
            | FollowError::Io(_)
            | FollowError::Broker(_)
            | FollowError::Task(_)
            | FollowError::Config(_)
            | FollowError::Json(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
