use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use followsvc::api::types::FollowOut;
use followsvc::api::HttpServer;
use followsvc::db::{migrate, Db};
use followsvc::events::UserEventConsumer;
use followsvc::graph::{GraphTraversal, TraversalLog};
use followsvc::{Config, FollowError, FollowStore, TraversalOrder, UserStore};

#[derive(Parser, Debug)]
#[command(name = "followsvc")]
#[command(about = "Follow graph service: follow/unfollow, listings and bounded BFS/DFS traversal")]
struct Args {
    /// Use database.test_path instead of database.path
    #[arg(long, global = true)]
    test_db: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API and the user event consumer
    Serve,
    /// Apply migrations and verify the database schema (default)
    Verify,
    /// Run one traversal and print the result as JSON
    Traverse {
        username: String,
        /// bfs or dfs
        #[arg(short, long, default_value = "bfs")]
        order: TraversalOrder,
        /// Maximum hops from the start user
        #[arg(short, long, default_value_t = 3)]
        depth: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", config.service.log_level.as_str())
    ).init();

    let db = open_database(&config, args.test_db).await?;

    match args.command.unwrap_or(Command::Verify) {
        Command::Serve => run_service(db, config).await?,
        Command::Verify => run_schema_verification(&db).await?,
        Command::Traverse { username, order, depth } => {
            run_traversal(db, &config, order, &username, depth).await?
        }
    }

    Ok(())
}

/// Select the database for the mode and bring its schema up to date
async fn open_database(config: &Config, test_mode: bool) -> Result<Db> {
    let db_path = config.db_path(test_mode)?;
    log::info!(
        "Database path: {} ({})",
        db_path.display(),
        if test_mode { "test" } else { "production" }
    );

    let db = Db::new(db_path);
    let migrations_dir = config.migrations_dir().to_path_buf();
    db.with_connection(move |conn| migrate::run_migrations(conn, &migrations_dir))
        .await
        .context("Failed to apply database migrations")?;

    log::info!("Database initialized successfully");
    Ok(db)
}

/// HTTP server plus background consumer until Ctrl-C
async fn run_service(db: Db, config: Config) -> Result<()> {
    log::info!("Starting followsvc v{}", env!("CARGO_PKG_VERSION"));

    let consumer = if config.broker.enabled {
        let consumer = UserEventConsumer::new(UserStore::new(db.clone()), config.broker.clone());
        Some(tokio::spawn(consumer.run()))
    } else {
        log::warn!("broker.enabled = false, user events will not be consumed");
        None
    };

    let server = HttpServer::new(db, &config);
    let result = server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {}", e);
            }
            log::info!("Shutdown signal received");
        })
        .await;

    // Unacknowledged in-flight messages are redelivered by the broker.
    if let Some(handle) = consumer {
        handle.abort();
    }

    result.context("HTTP server failed")
}

async fn run_traversal(
    db: Db,
    config: &Config,
    order: TraversalOrder,
    username: &str,
    depth: i64,
) -> Result<()> {
    let traversal = GraphTraversal::with_timeout_ms(
        FollowStore::new(db.clone()),
        TraversalLog::new(db),
        config.traversal.timeout_ms,
    );

    let entries: Vec<FollowOut> = traversal
        .run(order, username, depth)
        .await?
        .into_iter()
        .map(FollowOut::from)
        .collect();
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

/// Verify that all expected database objects exist
async fn run_schema_verification(db: &Db) -> Result<()> {
    db.with_connection(|conn| {
        let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
        let tables: Vec<String> = stmt.query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

        let mut all_tables_exist = true;
        for table in ["users", "follows", "traversal_logs", "schema_migrations"] {
            if tables.iter().any(|t| t == table) {
                log::debug!("✓ Table exists: {}", table);
            } else {
                log::error!("Missing table: {}", table);
                all_tables_exist = false;
            }
        }
        if !all_tables_exist {
            return Err(FollowError::Config("Not all required tables exist".to_string()));
        }

        let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%'")?;
        let indexes: Vec<String> = stmt.query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        for index_name in ["idx_follows_follower", "idx_follows_followed"] {
            if indexes.iter().any(|i| i == index_name) {
                log::debug!("✓ Index exists: {}", index_name);
            } else {
                log::warn!("Index not found: {} (traversals will scan the follows table)", index_name);
            }
        }

        let applied = migrate::get_applied_migrations(conn)?;
        log::debug!("✓ {} migrations applied", applied.len());

        let journal_mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
        if journal_mode.to_uppercase() != "WAL" {
            return Err(FollowError::Config(format!("Journal mode is not WAL: {}", journal_mode)));
        }

        let foreign_keys: i32 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
        if foreign_keys != 1 {
            return Err(FollowError::Config("Foreign keys not enabled".to_string()));
        }

        let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        if integrity != "ok" {
            return Err(FollowError::Config(format!("Database integrity check failed: {}", integrity)));
        }
        log::info!("✓ Database integrity: OK");

        Ok(())
    }).await?;

    let user_count = UserStore::new(db.clone()).count_users().await?;

    log::info!("✓ Database schema verification complete ({} users)", user_count);
    Ok(())
}
