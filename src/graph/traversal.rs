//! Bounded BFS/DFS over an [`EdgeSource`].

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use crate::error::{FollowError, Result};
use crate::graph::{TraversalLog, TraversalOrder, TraversalRecord};
use crate::store::{EdgeSource, FollowEdge, FollowEntry};
use crate::validate::{validate_max_depth, validate_username};

/// Breadth-first traversal from `start_user`, at most `max_depth` hops.
///
/// Vertices are emitted in non-decreasing depth, each at most once, with the
/// timestamp of the edge that first discovered them.
pub async fn traverse_bfs<S: EdgeSource>(
    source: &S,
    start_user: &str,
    max_depth: i64,
) -> Result<Vec<FollowEntry>> {
    validate_username(start_user)?;
    let max_depth = validate_max_depth(max_depth)?;

    log::info!("BFS traversal from '{}', max depth = {}", start_user, max_depth);

    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    let mut result = Vec::new();

    if max_depth == 0 {
        return Ok(result);
    }

    visited.insert(start_user.to_string());
    queue.push_back((start_user.to_string(), 0usize));

    while let Some((user, depth)) = queue.pop_front() {
        let next_depth = depth + 1;
        for edge in source.outbound(&user).await? {
            if !visited.insert(edge.followed.clone()) {
                continue;
            }
            result.push(FollowEntry::target_of(&edge));
            if next_depth < max_depth {
                queue.push_back((edge.followed, next_depth));
            }
        }
    }

    log::info!("BFS traversal found {} users", result.len());
    Ok(result)
}

/// Depth-first pre-order traversal from `start_user`, at most `max_depth` hops.
///
/// A vertex on the current path is never re-entered; the same vertex reached
/// through a different branch is emitted again.
pub async fn traverse_dfs<S: EdgeSource>(
    source: &S,
    start_user: &str,
    max_depth: i64,
) -> Result<Vec<FollowEntry>> {
    validate_username(start_user)?;
    let max_depth = validate_max_depth(max_depth)?;

    log::info!("DFS traversal from '{}', max depth = {}", start_user, max_depth);

    let mut result = Vec::new();
    if max_depth == 0 {
        return Ok(result);
    }

    // path[i] is the vertex whose remaining out-edges are frames[i].
    let mut path: Vec<String> = vec![start_user.to_string()];
    let mut frames: Vec<std::vec::IntoIter<FollowEdge>> =
        vec![source.outbound(start_user).await?.into_iter()];

    loop {
        let Some(frame) = frames.last_mut() else {
            break;
        };
        let Some(edge) = frame.next() else {
            frames.pop();
            path.pop();
            continue;
        };

        if path.iter().any(|v| *v == edge.followed) {
            continue;
        }

        result.push(FollowEntry::target_of(&edge));

        // The vertex just emitted sits frames.len() hops from the root.
        if frames.len() < max_depth {
            let children = source.outbound(&edge.followed).await?;
            path.push(edge.followed);
            frames.push(children.into_iter());
        }
    }

    log::info!("DFS traversal found {} users", result.len());
    Ok(result)
}

/// Dispatch on traversal order.
pub async fn traverse<S: EdgeSource>(
    source: &S,
    order: TraversalOrder,
    start_user: &str,
    max_depth: i64,
) -> Result<Vec<FollowEntry>> {
    match order {
        TraversalOrder::Bfs => traverse_bfs(source, start_user, max_depth).await,
        TraversalOrder::Dfs => traverse_dfs(source, start_user, max_depth).await,
    }
}

/// Traversal entry point used by the HTTP layer and CLI: adds a wall-clock
/// budget and records every valid run in `traversal_logs`.
pub struct GraphTraversal<S> {
    source: S,
    log: TraversalLog,
    timeout: Option<Duration>,
}

impl<S: EdgeSource> GraphTraversal<S> {
    /// `timeout` of `None` leaves only the depth bound.
    pub fn new(source: S, log: TraversalLog, timeout: Option<Duration>) -> Self {
        Self { source, log, timeout }
    }

    /// Build from a `traversal.timeout_ms`-style value where 0 disables the timeout.
    pub fn with_timeout_ms(source: S, log: TraversalLog, timeout_ms: u64) -> Self {
        let timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));
        Self::new(source, log, timeout)
    }

    pub async fn bfs(&self, start_user: &str, max_depth: i64) -> Result<Vec<FollowEntry>> {
        self.run(TraversalOrder::Bfs, start_user, max_depth).await
    }

    pub async fn dfs(&self, start_user: &str, max_depth: i64) -> Result<Vec<FollowEntry>> {
        self.run(TraversalOrder::Dfs, start_user, max_depth).await
    }

    pub async fn run(
        &self,
        order: TraversalOrder,
        start_user: &str,
        max_depth: i64,
    ) -> Result<Vec<FollowEntry>> {
        let started = Instant::now();
        let walk = traverse(&self.source, order, start_user, max_depth);

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, walk).await {
                Ok(result) => result,
                Err(_) => {
                    log::warn!(
                        "{} traversal from '{}' exceeded {} ms",
                        order,
                        start_user,
                        limit.as_millis()
                    );
                    Err(FollowError::Timeout(limit.as_millis() as u64))
                }
            },
            None => walk.await,
        };

        let result_count = match &result {
            Ok(entries) => Some(entries.len()),
            Err(FollowError::Timeout(_)) => None,
            // Invalid input or store failure: nothing ran to log.
            Err(_) => return result,
        };

        let record = TraversalRecord {
            order,
            start_user: start_user.to_string(),
            max_depth,
            result_count: result_count.unwrap_or(0),
            latency_ms: started.elapsed().as_millis() as u64,
            timed_out: result_count.is_none(),
        };
        if let Err(e) = self.log.record(record).await {
            log::warn!("Failed to record traversal log: {}", e);
        }

        result
    }
}
