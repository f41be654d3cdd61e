use clap::Parser;
use followsvc::db::Db;
use followsvc::graph::{percentile, TraversalLog};
use followsvc::{Config, TraversalOrder};

#[derive(Parser, Debug)]
#[command(name = "stats")]
#[command(about = "Traversal query statistics from traversal_logs")]
struct Args {
    /// Window size in hours
    #[arg(long, default_value_t = 24)]
    hours: u32,

    /// Read database.test_path instead of database.path
    #[arg(long)]
    test_db: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = Config::load()?;
    let log = TraversalLog::new(Db::new(config.db_path(args.test_db)?));

    println!("\n=== followsvc Traversal Statistics ===\n");

    let summary = log.summary_since(args.hours).await?;
    if summary.is_empty() {
        println!("No traversals logged in the last {} hours.", args.hours);
        return Ok(());
    }

    println!("{}-Hour Traversal Statistics by Order:\n", args.hours);
    println!("{:-<80}", "");
    println!(
        "{:<8} {:>8} {:>12} {:>10} {:>10} {:>12} {:>10}",
        "Order", "Count", "Avg (ms)", "Min (ms)", "Max (ms)", "Avg Results", "Timeouts"
    );
    println!("{:-<80}", "");
    for row in &summary {
        println!(
            "{:<8} {:>8} {:>12.1} {:>10} {:>10} {:>12.1} {:>10}",
            row.order_kind,
            row.count,
            row.avg_latency_ms,
            row.min_latency_ms,
            row.max_latency_ms,
            row.avg_result_count,
            row.timeouts
        );
    }
    println!("{:-<80}", "");

    for order in [TraversalOrder::Bfs, TraversalOrder::Dfs] {
        let latencies = log.latencies_since(order, args.hours).await?;
        if latencies.is_empty() {
            continue;
        }
        println!("\nLatency Percentiles ({}):", order);
        println!("  P50: {} ms", percentile(&latencies, 0.50));
        println!("  P95: {} ms", percentile(&latencies, 0.95));
        println!("  P99: {} ms", percentile(&latencies, 0.99));
    }

    println!();
    Ok(())
}
