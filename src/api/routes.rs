use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::api::extract::JsonBody;
use crate::api::types::*;
use crate::api::AppState;
use crate::config::TraversalConfig;
use crate::error::{FollowError, Result};
use crate::graph::TraversalOrder;
use crate::validate::parse_max_depth;

/// `POST /follow`
pub async fn create_follow(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<FollowRequest>,
) -> Result<impl IntoResponse> {
    let edge = state
        .follows
        .create_follow(&payload.follower, &payload.followed)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(FollowOut {
            followed: edge.followed,
            followed_at: Some(edge.followed_at),
        }),
    ))
}

/// `DELETE /follow`
pub async fn delete_follow(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<FollowRequest>,
) -> Result<StatusCode> {
    let removed = state
        .follows
        .delete_follow(&payload.follower, &payload.followed)
        .await?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(FollowError::FollowNotFound {
            follower: payload.follower,
            followed: payload.followed,
        })
    }
}

/// `GET /follow/followers/{username}`
pub async fn get_followers(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<FollowOut>>> {
    let entries = state.follows.get_followers(&username).await?;
    Ok(Json(entries.into_iter().map(FollowOut::from).collect()))
}

/// `GET /follow/following/{username}`
pub async fn get_following(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<FollowOut>>> {
    let entries = state.follows.get_following(&username).await?;
    Ok(Json(entries.into_iter().map(FollowOut::from).collect()))
}

/// `GET /follow/count/followers/{username}`
pub async fn count_followers(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<FollowerCount>> {
    let follower_count = state.follows.count_followers(&username).await?;
    Ok(Json(FollowerCount { follower_count }))
}

/// `GET /follow/count/following/{username}`
pub async fn count_following(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<FollowingCount>> {
    let following_count = state.follows.count_following(&username).await?;
    Ok(Json(FollowingCount { following_count }))
}

/// `GET /follow/traverse/bfs/{username}?depth=N`
pub async fn traverse_bfs(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(params): Query<TraverseParams>,
) -> Result<Json<Vec<FollowOut>>> {
    traverse(state, TraversalOrder::Bfs, username, params).await
}

/// `GET /follow/traverse/dfs/{username}?depth=N`
pub async fn traverse_dfs(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(params): Query<TraverseParams>,
) -> Result<Json<Vec<FollowOut>>> {
    traverse(state, TraversalOrder::Dfs, username, params).await
}

async fn traverse(
    state: AppState,
    order: TraversalOrder,
    username: String,
    params: TraverseParams,
) -> Result<Json<Vec<FollowOut>>> {
    let depth = resolve_depth(params.depth.as_deref(), &state.limits)?;
    let entries = state.traversal.run(order, &username, depth).await?;
    Ok(Json(entries.into_iter().map(FollowOut::from).collect()))
}

/// Depth from the query string, defaulted and clamped to `1..=max_depth`.
fn resolve_depth(raw: Option<&str>, limits: &TraversalConfig) -> Result<i64> {
    let depth = match raw {
        Some(raw) => parse_max_depth(raw)?,
        None => limits.default_depth,
    };
    if depth < 1 || depth > limits.max_depth {
        return Err(FollowError::InvalidArgument(format!(
            "depth must be between 1 and {}",
            limits.max_depth
        )));
    }
    Ok(depth)
}

/// `POST /users`
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> Result<impl IntoResponse> {
    let created = state.users.create_user(&payload.username).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((
        status,
        Json(CreateUserOut {
            username: payload.username,
            created,
        }),
    ))
}

/// `GET /health`
pub async fn health() -> Json<HealthOut> {
    Json(HealthOut {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
