//! Pooled, read-only access to vendor SQLite shortcut stores.
//!
//! The host never owns these databases — they belong to the creative
//! application — so every connection is opened read-only and the application
//! can rewrite the files underneath us at any time.  A small per-path pool
//! keeps connections warm across cache refreshes without holding file handles
//! open unboundedly.
//!
//! All calls here are blocking; callers on the async runtime go through
//! `tokio::task::spawn_blocking`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OpenFlags};
use thiserror::Error;
use tracing::debug;

/// At most this many idle connections are retained per database path.
const MAX_IDLE_PER_PATH: usize = 5;

/// Error type for shortcut-store access.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database file does not exist.  Callers treat this as "no data"
    /// rather than a fault: the application may simply not be installed.
    #[error("shortcut store not found: {0}")]
    NotFound(PathBuf),

    /// The database exists but could not be opened or queried.
    #[error("sqlite error on {path}: {source}")]
    Sqlite {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
}

/// Shared pool of read-only SQLite connections, keyed by database path.
#[derive(Default)]
pub struct StorePool {
    pools: Mutex<HashMap<PathBuf, Arc<PathPool>>>,
}

/// Idle connections for a single database file.
struct PathPool {
    path: PathBuf,
    idle: Mutex<Vec<Connection>>,
}

impl StorePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with a pooled read-only connection to the database at `path`.
    ///
    /// A connection is checked out (or opened on demand), handed to `f`, and
    /// returned to the idle set afterwards unless the pool is already at
    /// capacity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the file does not exist, and
    /// [`StoreError::Sqlite`] when opening fails or `f` reports a query error.
    pub fn with_connection<T>(
        &self,
        path: &Path,
        f: impl FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    ) -> Result<T, StoreError> {
        let pool = self.path_pool(path);
        let conn = pool.checkout()?;

        let result = f(&conn).map_err(|source| StoreError::Sqlite {
            path: path.to_path_buf(),
            source,
        });

        pool.restore(conn);
        result
    }

    fn path_pool(&self, path: &Path) -> Arc<PathPool> {
        let mut pools = self.pools.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(pools.entry(path.to_path_buf()).or_insert_with(|| {
            Arc::new(PathPool {
                path: path.to_path_buf(),
                idle: Mutex::new(Vec::new()),
            })
        }))
    }
}

impl PathPool {
    fn checkout(&self) -> Result<Connection, StoreError> {
        if let Some(conn) = self
            .idle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop()
        {
            return Ok(conn);
        }

        if !self.path.exists() {
            return Err(StoreError::NotFound(self.path.clone()));
        }

        debug!(path = %self.path.display(), "opening read-only shortcut store connection");
        Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(
            |source| StoreError::Sqlite {
                path: self.path.clone(),
                source,
            },
        )
    }

    fn restore(&self, conn: Connection) {
        let mut idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
        if idle.len() < MAX_IDLE_PER_PATH {
            idle.push(conn);
        }
        // Over capacity: drop the connection, closing it.
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Creates a throwaway database with one table via a writable connection.
    fn seed_db(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE t (k TEXT, v INTEGER);
             INSERT INTO t VALUES ('a', 1), ('b', 2);",
        )
        .unwrap();
    }

    #[test]
    fn test_with_connection_queries_existing_store() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("store.db");
        seed_db(&db);
        let pool = StorePool::new();

        // Act
        let count: i64 = pool
            .with_connection(&db, |conn| {
                conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            })
            .unwrap();

        // Assert
        assert_eq!(count, 2);
    }

    #[test]
    fn test_missing_store_reports_not_found() {
        // Arrange
        let pool = StorePool::new();
        let path = PathBuf::from("/nonexistent/store.db");

        // Act
        let result = pool.with_connection(&path, |_conn| Ok(()));

        // Assert
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_connections_are_reused_across_calls() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("store.db");
        seed_db(&db);
        let pool = StorePool::new();

        // Act: two sequential calls share one pooled connection.
        pool.with_connection(&db, |_c| Ok(())).unwrap();
        pool.with_connection(&db, |_c| Ok(())).unwrap();

        // Assert
        let pools = pool.pools.lock().unwrap();
        let idle = pools[&db].idle.lock().unwrap();
        assert_eq!(idle.len(), 1, "one idle connection retained, not two");
    }

    #[test]
    fn test_pool_is_read_only() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("store.db");
        seed_db(&db);
        let pool = StorePool::new();

        // Act: a write through the pool must fail.
        let result = pool.with_connection(&db, |conn| {
            conn.execute("INSERT INTO t VALUES ('c', 3)", [])
        });

        // Assert
        assert!(matches!(result, Err(StoreError::Sqlite { .. })));
    }

    #[test]
    fn test_query_error_still_restores_connection() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("store.db");
        seed_db(&db);
        let pool = StorePool::new();

        // Act: bad SQL errors out, then a good query must still work.
        let bad = pool.with_connection(&db, |conn| {
            conn.query_row("SELECT nope FROM missing", [], |row| row.get::<_, i64>(0))
        });
        let good: i64 = pool
            .with_connection(&db, |conn| {
                conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            })
            .unwrap();

        // Assert
        assert!(bad.is_err());
        assert_eq!(good, 2);
    }
}
