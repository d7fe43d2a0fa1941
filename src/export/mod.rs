// src/export/mod.rs
//
// Export orchestration: load published boats -> serialize -> atomic file
// swap. Holds the shared export flag so the scheduled and manual triggers
// can't overlap, and records each run.

pub mod template;
pub mod xml;

use crate::config::SyncConfig;
use crate::db::{boats, locks, runs, Database};
use crate::errors::{SyncError, SyncWarning};
use chrono::Utc;
use std::fs;
use std::path::PathBuf;

#[derive(Debug)]
pub struct ExportOutcome {
    pub boats_exported: usize,
    pub warnings: Vec<SyncWarning>,
    pub file_path: PathBuf,
    pub public_url: String,
}

impl ExportOutcome {
    pub fn report(&self) -> String {
        format!(
            "exported {} boats to {}",
            self.boats_exported,
            self.file_path.display()
        )
    }
}

/// Generate the feed file. With `only_if_due` the run is skipped (returning
/// None) when the last successful export is younger than the configured
/// frequency.
pub fn run_export(
    db: &Database,
    config: &SyncConfig,
    only_if_due: bool,
) -> Result<Option<ExportOutcome>, SyncError> {
    let now = Utc::now().timestamp();
    if only_if_due {
        let due = db.with_conn(|conn| {
            runs::export_due(conn, config.export_frequency_hours, now)
        })?;
        if !due {
            eprintln!("📄 Export not due yet, skipping");
            return Ok(None);
        }
    }

    db.with_conn(|conn| locks::acquire(conn, locks::EXPORT_LOCK, locks::DEFAULT_TTL_SECS, now))?;
    let run_id = db.with_conn(|conn| {
        runs::start_run(conn, "export", &config.export_file_name(), now)
    })?;

    eprintln!("🧵 Export started: {}", config.export_file_name());
    let result = export_inner(db, config);

    finish_run(db, run_id, &result);
    let _ = db.with_conn(|conn| locks::release(conn, locks::EXPORT_LOCK));
    result.map(Some)
}

fn export_inner(db: &Database, config: &SyncConfig) -> Result<ExportOutcome, SyncError> {
    let records =
        db.with_conn(|conn| boats::exportable_boats(conn, config.include_sold_in_export))?;

    let ctx = xml::ExportContext {
        site_name: &config.site_name,
        broker_code: &config.broker_code,
        office_id: config.default_office_id(),
        offices: &config.offices,
        generated_at: Utc::now().naive_utc(),
    };
    let (document, warnings) = xml::serialize(&records, &ctx)?;
    let exported = records.len() - warnings.len();

    let path = write_atomically(config, &document)?;
    ensure_access_file(&config.export_dir)?;

    Ok(ExportOutcome {
        boats_exported: exported,
        warnings,
        file_path: path,
        public_url: config.export_public_url(),
    })
}

/// Write to a sibling temp file, then rename over the target. Readers of the
/// published URL never see a half-written document.
fn write_atomically(config: &SyncConfig, document: &[u8]) -> Result<PathBuf, SyncError> {
    fs::create_dir_all(&config.export_dir)
        .map_err(|e| SyncError::Io(format!("Failed to create export dir: {e}")))?;

    let path = config.export_file_path();
    let tmp = path.with_extension("xml.tmp");
    fs::write(&tmp, document)
        .map_err(|e| SyncError::Io(format!("Failed to write {}: {e}", tmp.display())))?;
    fs::rename(&tmp, &path)
        .map_err(|e| SyncError::Io(format!("Failed to move export into place: {e}")))?;
    Ok(path)
}

const ACCESS_FILE_CONTENT: &str = "<FilesMatch \"\\.xml$\">\n  Require all granted\n</FilesMatch>\n";

/// Drop a .htaccess next to the export once, so the aggregator can fetch the
/// file even when the parent directory is locked down.
fn ensure_access_file(export_dir: &std::path::Path) -> Result<(), SyncError> {
    let path = export_dir.join(".htaccess");
    if path.exists() {
        return Ok(());
    }
    fs::write(&path, ACCESS_FILE_CONTENT)
        .map_err(|e| SyncError::Io(format!("Failed to write access file: {e}")))
}

fn finish_run(db: &Database, run_id: i64, result: &Result<ExportOutcome, SyncError>) {
    let finished = Utc::now().timestamp();
    let outcome = match result {
        Ok(export) => {
            eprintln!("✅ Export complete: {}", export.report());
            for w in &export.warnings {
                eprintln!("⚠️ {w}");
            }
            db.with_conn(|conn| {
                runs::end_run(
                    conn,
                    run_id,
                    finished,
                    export.boats_exported,
                    export.warnings.len(),
                    true,
                    None,
                )
            })
        }
        Err(e) => {
            eprintln!("❌ Export failed: {e}");
            db.with_conn(|conn| {
                runs::end_run(conn, run_id, finished, 0, 0, false, Some(e.to_string()))
            })
        }
    };
    if let Err(e) = outcome {
        eprintln!("⚠️ Failed to record export run: {e}");
    }
}
