//! Database connection pool management.
//!
//! Connection pooling for SQLite using r2d2. Every pool runs pending
//! migrations before it is handed out.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use stagehand_common::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::migrations;

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const POOL_SIZE: u32 = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

static MEMORY_DB_COUNTER: AtomicU64 = AtomicU64::new(0);

fn build(manager: SqliteConnectionManager) -> Result<DbPool> {
    let manager = manager.with_init(|conn| conn.busy_timeout(BUSY_TIMEOUT));

    let pool = Pool::builder()
        .max_size(POOL_SIZE)
        .build(manager)
        .map_err(|e| Error::pool(format!("Failed to create connection pool: {}", e)))?;

    let conn = pool
        .get()
        .map_err(|e| Error::pool(format!("Failed to get connection for migrations: {}", e)))?;

    migrations::run_migrations(&conn)
        .map_err(|e| Error::migration(e.to_string()))?;

    Ok(pool)
}

/// Initialize a pool backed by the SQLite file at `db_path`.
///
/// The file is created if it doesn't exist.
///
/// ```no_run
/// use stagehand_db::pool::init_pool;
///
/// let pool = init_pool("/var/lib/stagehand/catalog.db").unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    build(SqliteConnectionManager::file(db_path))
}

/// Initialize an in-memory pool.
///
/// All connections of one pool share a single named in-memory database,
/// which lives as long as the pool does. Separate pools never see each
/// other's data.
///
/// ```
/// use stagehand_db::pool::init_memory_pool;
///
/// let pool = init_memory_pool().unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_memory_pool() -> Result<DbPool> {
    let n = MEMORY_DB_COUNTER.fetch_add(1, Ordering::Relaxed);
    let uri = format!(
        "file:stagehand_memdb_{}_{}?mode=memory&cache=shared",
        std::process::id(),
        n
    );
    build(SqliteConnectionManager::file(uri))
}

/// Get a connection from the pool.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::pool(format!("Failed to get connection from pool: {}", e)))
}
