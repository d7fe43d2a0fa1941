use crate::db::connection::{init_db_embedded, Database};
use crate::errors::SyncError;
use crate::import::media::MediaStore;
use crate::import::{apply_records, ImportSummary};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Initialize a fresh test DB using the production schema.
pub fn init_test_db() -> Database {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let path = std::env::temp_dir().join(format!("marinesync_test_{nanos}.sqlite"));
    let db = Database::new(path);

    init_db_embedded(&db).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));

    db
}

/// MediaStore that never touches the network; every attach succeeds.
pub struct NullMediaStore;

impl MediaStore for NullMediaStore {
    fn attach(&self, _reference: &str, url: &str) -> Result<PathBuf, SyncError> {
        Ok(PathBuf::from(url))
    }
}

/// Parse a CSV body and push it through the full upsert path, asserting the
/// parse itself was clean.
pub fn import_clean_csv(db: &Database, text: &str) -> ImportSummary {
    let (records, warnings) =
        crate::import::csv::parse_csv(text.as_bytes()).expect("CSV parse failed");
    assert!(warnings.is_empty(), "unexpected parse warnings: {warnings:?}");
    apply_records(db, &records, &NullMediaStore).expect("apply_records failed")
}
