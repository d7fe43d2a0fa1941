// errors.rs
use std::fmt;

/// Errors originating from the sync pipeline: configuration, the local
/// store (sqlite), feed fetching, wire-format parsing, and file output.
#[derive(Debug)]
pub enum SyncError {
    Config(String),
    Db(String),
    /// Feed fetch rejected before parsing: bad scheme, non-200, wrong
    /// content type, timeout.
    Feed(String),
    /// Document-level XML failure. Aborts the whole import.
    XmlParse(String),
    Csv(String),
    Io(String),
    /// A numeric/year range query with min > max.
    InvalidRange(String),
    /// Another export/import holds the running flag.
    Locked(String),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Config(msg) => write!(f, "Config error: {msg}"),
            SyncError::Db(msg) => write!(f, "Database error: {msg}"),
            SyncError::Feed(msg) => write!(f, "Feed error: {msg}"),
            SyncError::XmlParse(msg) => write!(f, "XML parse error: {msg}"),
            SyncError::Csv(msg) => write!(f, "CSV error: {msg}"),
            SyncError::Io(msg) => write!(f, "IO error: {msg}"),
            SyncError::InvalidRange(msg) => write!(f, "Invalid range: {msg}"),
            SyncError::Locked(msg) => write!(f, "Already running: {msg}"),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<std::io::Error> for SyncError {
    fn from(e: std::io::Error) -> Self {
        SyncError::Io(e.to_string())
    }
}

impl From<csv::Error> for SyncError {
    fn from(e: csv::Error) -> Self {
        SyncError::Csv(e.to_string())
    }
}

impl From<quick_xml::Error> for SyncError {
    fn from(e: quick_xml::Error) -> Self {
        SyncError::XmlParse(e.to_string())
    }
}

/// A recoverable, per-item problem. Collected into the run summary instead
/// of aborting the batch.
#[derive(Debug, Clone)]
pub struct SyncWarning {
    /// Row number ("row 7") or boat reference ("ref ABC123").
    pub context: String,
    pub message: String,
}

impl SyncWarning {
    pub fn row(row: usize, message: impl Into<String>) -> Self {
        Self {
            context: format!("row {row}"),
            message: message.into(),
        }
    }

    pub fn reference(reference: &str, message: impl Into<String>) -> Self {
        Self {
            context: format!("ref {reference}"),
            message: message.into(),
        }
    }
}

impl fmt::Display for SyncWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.message)
    }
}
