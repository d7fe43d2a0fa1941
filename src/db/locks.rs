// src/db/locks.rs
//
// Short-lived running flags. At most one export and one import may run at a
// time, across both the scheduled and the manual trigger. The expiry bound
// means a process that dies mid-run can't lock everyone out for good.

use crate::errors::SyncError;
use rusqlite::{params, Connection};

pub const EXPORT_LOCK: &str = "export";
pub const IMPORT_LOCK: &str = "import";

/// How long a flag lives if its holder never releases it.
pub const DEFAULT_TTL_SECS: i64 = 15 * 60;

fn db_err(e: rusqlite::Error) -> SyncError {
    SyncError::Db(e.to_string())
}

/// Try to take the named flag. Returns Err(Locked) when a live holder
/// exists; expired flags are reclaimed silently.
pub fn acquire(conn: &Connection, name: &str, ttl_secs: i64, now: i64) -> Result<(), SyncError> {
    conn.execute(
        "DELETE FROM sync_locks WHERE name = ?1 AND expires_at <= ?2",
        params![name, now],
    )
    .map_err(db_err)?;

    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO sync_locks (name, acquired_at, expires_at) VALUES (?1, ?2, ?3)",
            params![name, now, now + ttl_secs],
        )
        .map_err(db_err)?;

    if inserted == 1 {
        Ok(())
    } else {
        Err(SyncError::Locked(format!(
            "{name} is already running (flag held, not yet expired)"
        )))
    }
}

pub fn release(conn: &Connection, name: &str) -> Result<(), SyncError> {
    conn.execute("DELETE FROM sync_locks WHERE name = ?1", params![name])
        .map_err(db_err)?;
    Ok(())
}
