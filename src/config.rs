// src/config.rs
//
// Explicit configuration object. Everything the pipeline needs is passed in
// here; core logic never reads env vars or any other ambient state.

use crate::errors::SyncError;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    // --- feed import ---
    pub feed_url: Option<String>,
    #[serde(default)]
    pub feed_username: Option<String>,
    #[serde(default)]
    pub feed_password: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub fetch_timeout_secs: u64,

    // --- export ---
    /// 1, 12 or 24.
    #[serde(default = "default_frequency")]
    pub export_frequency_hours: u32,
    #[serde(default)]
    pub include_sold_in_export: bool,
    pub broker_code: String,
    pub site_name: String,
    /// Used in the export file name: marinesync-export-{site_slug}.xml
    pub site_slug: String,
    pub export_dir: PathBuf,
    /// Public base URL the export directory is served under.
    pub export_base_url: String,

    // --- reconciliation ---
    #[serde(default)]
    pub sold_boat_disposition: Disposition,

    // --- media ---
    pub media_dir: PathBuf,

    #[serde(default)]
    pub offices: Vec<Office>,
}

/// What happens to a stored boat whose reference no longer appears in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Disposition {
    Delete,
    Draft,
    Hide,
    #[default]
    MarkSold,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Office {
    pub id: String,
    #[serde(default)]
    pub office_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub forename: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub town: String,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub daytime_phone: String,
    #[serde(default)]
    pub evening_phone: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub fax: String,
    #[serde(default)]
    pub website: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_frequency() -> u32 {
    24
}

impl SyncConfig {
    pub fn load(path: &str) -> Result<Self, SyncError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("Failed to read {path}: {e}")))?;
        let config: SyncConfig = serde_json::from_str(&raw)
            .map_err(|e| SyncError::Config(format!("Failed to parse {path}: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if !matches!(self.export_frequency_hours, 1 | 12 | 24) {
            return Err(SyncError::Config(format!(
                "export_frequency_hours must be 1, 12 or 24, got {}",
                self.export_frequency_hours
            )));
        }
        if self.site_slug.is_empty() {
            return Err(SyncError::Config("site_slug must not be empty".into()));
        }
        Ok(())
    }

    /// The office id stamped on each advert. First configured office wins.
    pub fn default_office_id(&self) -> &str {
        self.offices.first().map(|o| o.id.as_str()).unwrap_or("1")
    }

    pub fn export_file_name(&self) -> String {
        format!("marinesync-export-{}.xml", self.site_slug)
    }

    pub fn export_file_path(&self) -> PathBuf {
        self.export_dir.join(self.export_file_name())
    }

    pub fn export_public_url(&self) -> String {
        format!(
            "{}/{}",
            self.export_base_url.trim_end_matches('/'),
            self.export_file_name()
        )
    }
}
