use axum::extract::{rejection::JsonRejection, FromRequest};

use crate::error::FollowError;

/// JSON request body whose rejections surface as [`FollowError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(FollowError))]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for FollowError {
    fn from(rejection: JsonRejection) -> Self {
        FollowError::InvalidArgument(rejection.body_text())
    }
}
