// src/import/reconcile.rs
//
// After a feed import, boats whose reference no longer appears in the feed
// get the configured disposition. Ordinary upserts never delete; this pass
// is the only place removal happens, and only for `delete`.

use crate::config::Disposition;
use crate::db::boats::{self, visibility};
use crate::domain::boat::taxonomy;
use crate::domain::status::BoatStatus;
use crate::errors::SyncError;
use rusqlite::Connection;
use std::collections::HashSet;

/// Apply `disposition` to every stored boat not named in `seen_references`.
/// Returns the number of boats affected.
pub fn reconcile_missing(
    conn: &Connection,
    seen_references: &HashSet<String>,
    disposition: Disposition,
) -> Result<usize, SyncError> {
    let mut affected = 0;
    for (boat_id, reference) in boats::all_references(conn)? {
        if seen_references.contains(&reference) {
            continue;
        }
        match disposition {
            Disposition::Delete => boats::delete_boat(conn, boat_id)?,
            Disposition::Draft => boats::set_visibility(conn, boat_id, visibility::DRAFT)?,
            Disposition::Hide => boats::set_visibility(conn, boat_id, visibility::HIDDEN)?,
            Disposition::MarkSold => {
                boats::set_status(conn, boat_id, BoatStatus::Sold)?;
                boats::replace_terms(
                    conn,
                    boat_id,
                    taxonomy::BOAT_STATUS,
                    &[BoatStatus::Sold.taxonomy_term()],
                )?;
            }
        }
        affected += 1;
    }
    Ok(affected)
}
