//! Catalog error type shared by the storage layer and its callers.

/// Errors raised while opening or querying the catalog.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The connection pool could not be built or handed out a connection.
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// A schema migration failed to apply.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// A catalog query failed.
    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn pool<S: Into<String>>(msg: S) -> Self {
        Self::Pool(msg.into())
    }

    pub fn migration<S: Into<String>>(msg: S) -> Self {
        Self::Migration(msg.into())
    }

    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }
}

/// Result alias over [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
