use rusqlite::Connection;
use std::cell::RefCell;
use std::path::PathBuf;

use crate::errors::SyncError;

// Thread-local connection slot.
thread_local! {
    static DB_CONN: RefCell<Option<(PathBuf, Connection)>> = const { RefCell::new(None) };
}

#[derive(Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Provides a mutable connection to the closure. The connection is
    /// opened lazily, once per thread, and foreign keys are switched on so
    /// boat deletes cascade into the child tables.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, SyncError>
    where
        F: FnOnce(&mut Connection) -> Result<T, SyncError>,
    {
        let inner_result = DB_CONN
            .try_with(|cell| {
                let mut slot = cell.borrow_mut();
                let reopen = match slot.as_ref() {
                    Some((p, _)) => p != &self.path,
                    None => true,
                };
                if reopen {
                    let conn = Connection::open(&self.path)
                        .map_err(|e| SyncError::Db(format!("Open DB failed: {e}")))?;
                    conn.execute_batch("PRAGMA foreign_keys = ON;")
                        .map_err(|e| SyncError::Db(format!("Pragma failed: {e}")))?;
                    *slot = Some((self.path.clone(), conn));
                }
                let (_, conn) = slot.as_mut().unwrap();
                f(conn)
            })
            .map_err(|e| SyncError::Db(format!("Connection slot unavailable: {e}")))?;
        inner_result
    }
}

/// Initialize from the schema baked into the binary; deployments don't need
/// the sql/ directory next to the executable.
pub fn init_db_embedded(db: &Database) -> Result<(), SyncError> {
    const SCHEMA: &str = include_str!("../../sql/schema.sql");
    db.with_conn(|conn| {
        conn.execute_batch(SCHEMA)
            .map_err(|e| SyncError::Db(format!("Failed to apply schema: {e}")))?;
        Ok(())
    })
}
