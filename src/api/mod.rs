//! Follow Service HTTP layer.
//!
//! Thin axum surface over the stores and the traversal engine. Domain errors
//! map to 4xx in [`error`], everything else surfaces as 5xx.

pub mod error;
pub mod extract;
pub mod routes;
pub mod types;

use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{Config, TraversalConfig};
use crate::db::Db;
use crate::error::{FollowError, Result};
use crate::graph::{GraphTraversal, TraversalLog};
use crate::store::{FollowStore, UserStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: UserStore,
    pub follows: FollowStore,
    pub traversal: Arc<GraphTraversal<FollowStore>>,
    pub limits: TraversalConfig,
}

impl AppState {
    pub fn new(db: Db, limits: TraversalConfig) -> Self {
        let follows = FollowStore::new(db.clone());
        let traversal = GraphTraversal::with_timeout_ms(
            follows.clone(),
            TraversalLog::new(db.clone()),
            limits.timeout_ms,
        );
        Self {
            users: UserStore::new(db),
            follows,
            traversal: Arc::new(traversal),
            limits,
        }
    }
}

/// Build the router. An empty `allowed_origins` allows any origin.
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    let cors = if allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<axum::http::HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route(
            "/follow",
            post(routes::create_follow).delete(routes::delete_follow),
        )
        .route(
            "/follow/",
            post(routes::create_follow).delete(routes::delete_follow),
        )
        .route("/follow/followers/:username", get(routes::get_followers))
        .route("/follow/following/:username", get(routes::get_following))
        .route("/follow/count/followers/:username", get(routes::count_followers))
        .route("/follow/count/following/:username", get(routes::count_following))
        .route("/follow/traverse/bfs/:username", get(routes::traverse_bfs))
        .route("/follow/traverse/dfs/:username", get(routes::traverse_dfs))
        .route("/users", post(routes::create_user))
        .route("/health", get(routes::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// HTTP server wrapper
pub struct HttpServer {
    state: AppState,
    host: String,
    port: u16,
    allowed_origins: Vec<String>,
}

impl HttpServer {
    pub fn new(db: Db, config: &Config) -> Self {
        Self {
            state: AppState::new(db, config.traversal.clone()),
            host: config.http_server.host.clone(),
            port: config.http_server.port,
            allowed_origins: config.http_server.allowed_origins.clone(),
        }
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state, &self.allowed_origins);

        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            FollowError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to bind to {}: {}. Set http_server.port in config.toml or FOLLOWSVC_PORT.", addr, e),
            ))
        })?;

        log::info!("Follow service listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| FollowError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("HTTP server error: {}", e)
            )))?;

        log::info!("HTTP server stopped");
        Ok(())
    }
}
