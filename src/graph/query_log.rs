//! Traversal query log (`traversal_logs` table) and its aggregate reports.

use rusqlite::params;

use crate::db::Db;
use crate::error::{FollowError, Result};
use crate::graph::TraversalOrder;

/// One executed traversal.
#[derive(Debug, Clone)]
pub struct TraversalRecord {
    pub order: TraversalOrder,
    pub start_user: String,
    pub max_depth: i64,
    pub result_count: usize,
    pub latency_ms: u64,
    pub timed_out: bool,
}

/// Per-order aggregate over a time window.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub order_kind: String,
    pub count: u64,
    pub avg_latency_ms: f64,
    pub min_latency_ms: i64,
    pub max_latency_ms: i64,
    pub avg_result_count: f64,
    pub timeouts: u64,
}

#[derive(Debug, Clone)]
pub struct TraversalLog {
    db: Db,
}

impl TraversalLog {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn record(&self, record: TraversalRecord) -> Result<()> {
        self.db
            .with_connection(move |conn| {
                conn.execute(
                    "INSERT INTO traversal_logs \
                     (order_kind, start_user, max_depth, result_count, latency_ms, timed_out) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        record.order.as_str(),
                        record.start_user,
                        record.max_depth,
                        record.result_count as i64,
                        record.latency_ms as i64,
                        record.timed_out,
                    ],
                )?;
                Ok::<(), FollowError>(())
            })
            .await
    }

    /// Aggregates for traversals logged in the last `hours` hours, busiest order first.
    pub async fn summary_since(&self, hours: u32) -> Result<Vec<OrderSummary>> {
        let window = format!("-{} hours", hours);
        self.db
            .with_connection(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT
                        order_kind,
                        COUNT(*),
                        AVG(latency_ms),
                        MIN(latency_ms),
                        MAX(latency_ms),
                        AVG(result_count),
                        SUM(timed_out)
                    FROM traversal_logs
                    WHERE timestamp > datetime('now', ?1)
                    GROUP BY order_kind
                    ORDER BY COUNT(*) DESC
                    "#,
                )?;

                let mut rows = stmt.query([window])?;
                let mut out = Vec::new();
                while let Some(row) = rows.next()? {
                    out.push(OrderSummary {
                        order_kind: row.get(0)?,
                        count: row.get::<_, i64>(1)? as u64,
                        avg_latency_ms: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                        min_latency_ms: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
                        max_latency_ms: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
                        avg_result_count: row.get::<_, Option<f64>>(5)?.unwrap_or(0.0),
                        timeouts: row.get::<_, Option<i64>>(6)?.unwrap_or(0) as u64,
                    });
                }
                Ok::<Vec<OrderSummary>, FollowError>(out)
            })
            .await
    }

    /// Sorted latencies for one order in the last `hours` hours.
    pub async fn latencies_since(&self, order: TraversalOrder, hours: u32) -> Result<Vec<i64>> {
        let window = format!("-{} hours", hours);
        self.db
            .with_connection(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT latency_ms FROM traversal_logs \
                     WHERE order_kind = ?1 AND timestamp > datetime('now', ?2) \
                     ORDER BY latency_ms",
                )?;
                let latencies = stmt
                    .query_map(params![order.as_str(), window], |row| row.get::<_, i64>(0))?
                    .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
                Ok(latencies)
            })
            .await
    }
}

/// Percentile `p` (0.0..=1.0) of already-sorted values; 0 for an empty slice.
pub fn percentile(sorted_values: &[i64], p: f64) -> i64 {
    if sorted_values.is_empty() {
        return 0;
    }
    let index = ((sorted_values.len() - 1) as f64 * p).ceil() as usize;
    sorted_values[index.min(sorted_values.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testutil::migrated_db;

    fn record(order: TraversalOrder, latency_ms: u64, timed_out: bool) -> TraversalRecord {
        TraversalRecord {
            order,
            start_user: "alice".to_string(),
            max_depth: 3,
            result_count: if timed_out { 0 } else { 4 },
            latency_ms,
            timed_out,
        }
    }

    #[tokio::test]
    async fn test_summary_groups_by_order() {
        let (db, _temp) = migrated_db().await;
        let log = TraversalLog::new(db);

        log.record(record(TraversalOrder::Bfs, 10, false)).await.unwrap();
        log.record(record(TraversalOrder::Bfs, 30, false)).await.unwrap();
        log.record(record(TraversalOrder::Dfs, 50, true)).await.unwrap();

        let summary = log.summary_since(24).await.unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].order_kind, "bfs");
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].min_latency_ms, 10);
        assert_eq!(summary[0].max_latency_ms, 30);
        assert!((summary[0].avg_latency_ms - 20.0).abs() < f64::EPSILON);
        assert_eq!(summary[1].timeouts, 1);
    }

    #[tokio::test]
    async fn test_latencies_sorted() {
        let (db, _temp) = migrated_db().await;
        let log = TraversalLog::new(db);

        for ms in [40, 10, 20] {
            log.record(record(TraversalOrder::Dfs, ms, false)).await.unwrap();
        }
        log.record(record(TraversalOrder::Bfs, 5, false)).await.unwrap();

        let latencies = log.latencies_since(TraversalOrder::Dfs, 24).await.unwrap();
        assert_eq!(latencies, vec![10, 20, 40]);
    }

    #[test]
    fn test_percentile() {
        assert_eq!(percentile(&[], 0.5), 0);
        assert_eq!(percentile(&[7], 0.99), 7);
        let values = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        assert_eq!(percentile(&values, 0.5), 6);
        assert_eq!(percentile(&values, 0.95), 10);
        assert_eq!(percentile(&values, 0.0), 1);
    }
}
