use crate::errors::SyncError;
use rusqlite::{params, Connection, OptionalExtension};

fn db_err(e: rusqlite::Error) -> SyncError {
    SyncError::Db(e.to_string())
}

#[derive(Debug)]
pub struct SyncRun {
    pub id: i64,
    pub kind: String,
    pub source: String,
    pub started_at: i64,
    pub finished_at: Option<i64>,
    pub items_processed: Option<i64>,
    pub warnings: Option<i64>,
    pub success: Option<bool>,
    pub error_message: Option<String>,
}

pub fn start_run(conn: &Connection, kind: &str, source: &str, now: i64) -> Result<i64, SyncError> {
    conn.execute(
        "INSERT INTO sync_runs (kind, source, started_at) VALUES (?1, ?2, ?3)",
        params![kind, source, now],
    )
    .map_err(db_err)?;
    Ok(conn.last_insert_rowid())
}

#[allow(clippy::too_many_arguments)]
pub fn end_run(
    conn: &Connection,
    run_id: i64,
    now: i64,
    items: usize,
    warnings: usize,
    success: bool,
    error: Option<String>,
) -> Result<(), SyncError> {
    conn.execute(
        "UPDATE sync_runs SET finished_at = ?1, items_processed = ?2, warnings = ?3, success = ?4, error_message = ?5 WHERE id = ?6",
        params![now, items, warnings, success, error, run_id],
    ).map_err(db_err)?;
    Ok(())
}

pub fn last_successful_run(
    conn: &Connection,
    kind: &str,
) -> Result<Option<SyncRun>, SyncError> {
    conn.query_row(
        "SELECT id, kind, source, started_at, finished_at, items_processed, warnings, success, error_message
         FROM sync_runs WHERE kind = ?1 AND success = 1 ORDER BY started_at DESC LIMIT 1",
        params![kind],
        |row| {
            Ok(SyncRun {
                id: row.get(0)?,
                kind: row.get(1)?,
                source: row.get(2)?,
                started_at: row.get(3)?,
                finished_at: row.get(4)?,
                items_processed: row.get(5)?,
                warnings: row.get(6)?,
                success: row.get(7)?,
                error_message: row.get(8)?,
            })
        },
    )
    .optional()
    .map_err(db_err)
}

/// Schedule check for the periodic trigger: true when no successful export
/// exists yet, or the last one started more than `frequency_hours` ago.
pub fn export_due(conn: &Connection, frequency_hours: u32, now: i64) -> Result<bool, SyncError> {
    match last_successful_run(conn, "export")? {
        None => Ok(true),
        Some(run) => Ok(run.started_at + i64::from(frequency_hours) * 3600 <= now),
    }
}
