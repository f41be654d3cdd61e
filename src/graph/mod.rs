//! Follow graph traversal: bounded BFS/DFS over outbound follow edges.
//!
//! BFS excludes revisits globally; DFS only excludes vertices already on the
//! current root-to-vertex path, so a vertex reachable by two paths may be
//! emitted twice. Both stop at `max_depth` hops and never emit the root.

mod query_log;
mod traversal;

pub use query_log::{percentile, OrderSummary, TraversalLog, TraversalRecord};
pub use traversal::{traverse, traverse_bfs, traverse_dfs, GraphTraversal};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FollowError;

/// Traversal order and its uniqueness policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalOrder {
    /// Level by level, each vertex at most once.
    Bfs,
    /// Pre-order depth-first, path-scoped revisit exclusion.
    Dfs,
}

impl TraversalOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraversalOrder::Bfs => "bfs",
            TraversalOrder::Dfs => "dfs",
        }
    }
}

impl fmt::Display for TraversalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TraversalOrder {
    type Err = FollowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bfs" => Ok(TraversalOrder::Bfs),
            "dfs" => Ok(TraversalOrder::Dfs),
            other => Err(FollowError::InvalidArgument(format!(
                "unknown traversal order '{}', expected bfs or dfs",
                other
            ))),
        }
    }
}
