pub mod config;
pub mod error;
pub mod db;
pub mod validate;
pub mod store;
pub mod graph;
pub mod api;
pub mod events;

pub use config::Config;
pub use error::{FollowError, Result};
pub use graph::{traverse_bfs, traverse_dfs, GraphTraversal, TraversalOrder};
pub use store::{EdgeSource, FollowEdge, FollowEntry, FollowStore, UserStore};
