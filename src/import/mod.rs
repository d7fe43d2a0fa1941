// src/import/mod.rs
//
// Import orchestration: fetch/read -> parse -> upsert in file order ->
// reconcile (feed only) -> run bookkeeping. Holds the shared import flag for
// the whole run so the scheduled and manual triggers can't overlap.

pub mod csv;
pub mod feed;
pub mod media;
pub mod record;
pub mod reconcile;
pub mod upsert;
pub mod xml;

use crate::config::SyncConfig;
use crate::db::{locks, runs, Database};
use crate::errors::{SyncError, SyncWarning};
use crate::import::media::{FsMediaStore, MediaStore};
use crate::import::record::ImportRecord;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub processed: usize,
    pub created: usize,
    pub reconciled: usize,
    pub warnings: Vec<SyncWarning>,
    /// Every reference touched this run, generated fallbacks included, so
    /// freshly created boats aren't immediately reconciled away.
    pub seen_references: HashSet<String>,
}

impl ImportSummary {
    /// The one-line, user-visible outcome.
    pub fn report(&self) -> String {
        format!(
            "processed {} rows, {} warnings",
            self.processed,
            self.warnings.len()
        )
    }
}

/// Import the configured remote feed, then reconcile boats that fell out of
/// it.
pub fn run_feed_import(db: &Database, config: &SyncConfig) -> Result<ImportSummary, SyncError> {
    let feed_url = config
        .feed_url
        .clone()
        .ok_or_else(|| SyncError::Config("feed_url is not configured".into()))?;

    let now = Utc::now().timestamp();
    db.with_conn(|conn| locks::acquire(conn, locks::IMPORT_LOCK, locks::DEFAULT_TTL_SECS, now))?;
    let run_id = db.with_conn(|conn| runs::start_run(conn, "import", &feed_url, now))?;

    eprintln!("🧵 Feed import started: {feed_url}");
    let media = FsMediaStore::new(&config.media_dir, config.fetch_timeout_secs)?;
    let result = feed_import_inner(db, config, &feed_url, &media);

    finish_run(db, run_id, &result);
    let _ = db.with_conn(|conn| locks::release(conn, locks::IMPORT_LOCK));
    result
}

fn feed_import_inner(
    db: &Database,
    config: &SyncConfig,
    feed_url: &str,
    media: &dyn MediaStore,
) -> Result<ImportSummary, SyncError> {
    let fetcher = feed::FeedFetcher::new(
        config.fetch_timeout_secs,
        config.feed_username.clone(),
        config.feed_password.clone(),
    )?;
    let raw = fetcher.fetch(feed_url)?;

    let (records, parse_warnings) = xml::parse_feed(&raw)?;
    dump_feed_debug(&records);

    let mut summary = apply_records(db, &records, media)?;
    let mut warnings = parse_warnings;
    warnings.append(&mut summary.warnings);
    summary.warnings = warnings;

    // Boats missing from the feed get the configured disposition.
    let seen = summary.seen_references.clone();
    summary.reconciled = db.with_conn(|conn| {
        reconcile::reconcile_missing(conn, &seen, config.sold_boat_disposition)
    })?;
    if summary.reconciled > 0 {
        eprintln!(
            "📄 {} stored boats were missing from the feed and got the configured disposition",
            summary.reconciled
        );
    }

    Ok(summary)
}

/// Import a local CSV file. No reconciliation: a CSV upload is a partial,
/// manual operation, not an authoritative listing of the whole inventory.
pub fn run_csv_import(
    db: &Database,
    config: &SyncConfig,
    path: &str,
) -> Result<ImportSummary, SyncError> {
    let now = Utc::now().timestamp();
    db.with_conn(|conn| locks::acquire(conn, locks::IMPORT_LOCK, locks::DEFAULT_TTL_SECS, now))?;
    let run_id = db.with_conn(|conn| runs::start_run(conn, "import", path, now))?;

    eprintln!("🧵 CSV import started: {path}");
    let media = FsMediaStore::new(&config.media_dir, config.fetch_timeout_secs)?;
    let result = csv_import_inner(db, path, &media);

    finish_run(db, run_id, &result);
    let _ = db.with_conn(|conn| locks::release(conn, locks::IMPORT_LOCK));
    result
}

fn csv_import_inner(
    db: &Database,
    path: &str,
    media: &dyn MediaStore,
) -> Result<ImportSummary, SyncError> {
    let raw = fs::read(path).map_err(|e| SyncError::Io(format!("Failed to read {path}: {e}")))?;
    let (records, parse_warnings) = csv::parse_csv(&raw)?;

    let mut summary = apply_records(db, &records, media)?;
    let mut warnings = parse_warnings;
    warnings.append(&mut summary.warnings);
    summary.warnings = warnings;
    Ok(summary)
}

/// Upsert records strictly in file order, one transaction each, so later
/// rows sharing a reference overwrite earlier ones and a single bad row
/// can't take the batch down.
pub fn apply_records(
    db: &Database,
    records: &[ImportRecord],
    media: &dyn MediaStore,
) -> Result<ImportSummary, SyncError> {
    let mut summary = ImportSummary::default();
    let now = Utc::now().naive_utc();

    for record in records {
        let applied = db.with_conn(|conn| {
            let tx = conn
                .transaction()
                .map_err(|e| SyncError::Db(e.to_string()))?;
            let outcome =
                upsert::upsert_record(&tx, record, media, now, &mut summary.warnings)?;
            tx.commit().map_err(|e| SyncError::Db(e.to_string()))?;
            Ok(outcome)
        });

        match applied {
            Ok(outcome) => {
                summary.processed += 1;
                if outcome.created {
                    summary.created += 1;
                }
                summary.seen_references.insert(outcome.reference);
            }
            Err(e) => {
                // Per-row failure: warn and keep going with the rest.
                summary
                    .warnings
                    .push(SyncWarning::row(record.source_row, format!("row failed: {e}")));
            }
        }
    }

    Ok(summary)
}

fn finish_run(db: &Database, run_id: i64, result: &Result<ImportSummary, SyncError>) {
    let finished = Utc::now().timestamp();
    let outcome = match result {
        Ok(summary) => {
            eprintln!("✅ Import complete: {}", summary.report());
            for w in &summary.warnings {
                eprintln!("⚠️ {w}");
            }
            db.with_conn(|conn| {
                runs::end_run(
                    conn,
                    run_id,
                    finished,
                    summary.processed,
                    summary.warnings.len(),
                    true,
                    None,
                )
            })
        }
        Err(e) => {
            eprintln!("❌ Import failed: {e}");
            db.with_conn(|conn| {
                runs::end_run(conn, run_id, finished, 0, 0, false, Some(e.to_string()))
            })
        }
    };
    if let Err(e) = outcome {
        eprintln!("⚠️ Failed to record import run: {e}");
    }
}

#[derive(Serialize)]
struct FeedDebugEntry<'a> {
    row: usize,
    reference: Option<&'a str>,
    status: Option<&'a str>,
    title: Option<&'a str>,
}

/// Parsed-feed snapshot for diagnosing mapping problems.
fn dump_feed_debug(records: &[ImportRecord]) {
    let entries: Vec<FeedDebugEntry> = records
        .iter()
        .map(|r| FeedDebugEntry {
            row: r.source_row,
            reference: r.reference.as_deref(),
            status: r.status.as_deref(),
            title: r.title.as_deref(),
        })
        .collect();
    if let Ok(json) = serde_json::to_string_pretty(&entries) {
        let _ = fs::write("feed_debug.json", json);
    }
}
