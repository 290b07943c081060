//! stagehand-db: catalog schema, migrations, and query operations
//!
//! The catalog keeps one table per media type (`mm_movies`, `mm_shows`,
//! `mm_music`), keyed by the absolute path of the classified file. SQLite is
//! accessed through rusqlite with r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Catalog row models
//! - `queries` - Catalog query operations
//!
//! # Example
//!
//! ```no_run
//! use stagehand_common::MediaType;
//! use stagehand_db::pool::{get_conn, init_pool};
//! use stagehand_db::queries::catalog;
//!
//! let pool = init_pool("/var/lib/stagehand/catalog.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! for entry in catalog::list_entries(&conn, MediaType::Movies).unwrap() {
//!     println!("{} ({:.2})", entry.path, entry.confidence);
//! }
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;

pub use models::{CatalogEntry, CatalogFields, EntryStatus};
pub use pool::{get_conn, init_memory_pool, init_pool, DbPool, PooledConnection};
