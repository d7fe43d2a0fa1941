// src/import/media.rs
//
// Image download-and-attach. The coordinator only sees the MediaStore trait;
// a failed download is the caller's warning, never its abort.

use crate::errors::SyncError;
use rand::Rng;
use reqwest::blocking::Client;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub trait MediaStore {
    /// Download `url` and attach it to the boat identified by `reference`.
    /// Returns the stored path.
    fn attach(&self, reference: &str, url: &str) -> Result<PathBuf, SyncError>;
}

/// Downloads into `{media_dir}/{reference}/{file name}`.
pub struct FsMediaStore {
    client: Client,
    media_dir: PathBuf,
}

const MAX_ATTEMPTS: u64 = 3;
const JITTER_MAX_SECS: u64 = 2;

impl FsMediaStore {
    pub fn new(media_dir: impl Into<PathBuf>, timeout_secs: u64) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SyncError::Feed(format!("Client build failed: {e}")))?;
        Ok(Self {
            client,
            media_dir: media_dir.into(),
        })
    }

    fn try_fetch(&self, url: &str) -> Result<Vec<u8>, SyncError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| SyncError::Feed(format!("Image fetch failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::Feed(format!("Image returned HTTP {status}")));
        }
        let body = resp
            .bytes()
            .map_err(|e| SyncError::Feed(format!("Failed to read image body: {e}")))?;
        Ok(body.to_vec())
    }

    fn fetch_with_retry(&self, url: &str) -> Result<Vec<u8>, SyncError> {
        let mut last_err = None;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.try_fetch(url) {
                Ok(body) => return Ok(body),
                Err(e) => {
                    eprintln!("⚠️ Image attempt {attempt} failed for {url}: {e}");
                    last_err = Some(e);
                    let jitter = rand::thread_rng().gen_range(0..=JITTER_MAX_SECS);
                    std::thread::sleep(Duration::from_secs(attempt + jitter));
                }
            }
        }
        Err(last_err.unwrap_or_else(|| SyncError::Feed("image retry loop failed".into())))
    }
}

impl MediaStore for FsMediaStore {
    fn attach(&self, reference: &str, url: &str) -> Result<PathBuf, SyncError> {
        let body = self.fetch_with_retry(url)?;

        let dir = self.media_dir.join(sanitize(reference));
        fs::create_dir_all(&dir)
            .map_err(|e| SyncError::Io(format!("Failed to create media dir: {e}")))?;

        let path = dir.join(file_name_from_url(url));
        fs::write(&path, body)
            .map_err(|e| SyncError::Io(format!("Failed to write image: {e}")))?;
        Ok(path)
    }
}

fn sanitize(reference: &str) -> String {
    reference
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn file_name_from_url(url: &str) -> String {
    let name = url
        .rsplit('/')
        .next()
        .unwrap_or("image")
        .split(['?', '#'])
        .next()
        .unwrap_or("image");
    let name = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image");
    if name.is_empty() {
        "image".to_string()
    } else {
        sanitize_file_name(name)
    }
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect()
}
