// src/import/feed.rs
//
// Fetches the remote broker feed. Everything here is a hard gate: bad URL
// scheme, non-200 status or a non-XML content type rejects the whole import
// before any parsing happens.

use crate::errors::SyncError;
use reqwest::blocking::Client;
use std::time::Duration;

const USER_AGENT: &str = concat!("marinesync/", env!("CARGO_PKG_VERSION"));

pub struct FeedFetcher {
    client: Client,
    username: Option<String>,
    password: Option<String>,
}

impl FeedFetcher {
    pub fn new(
        timeout_secs: u64,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, SyncError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SyncError::Feed(format!("Client build failed: {e}")))?;

        Ok(Self {
            client,
            username,
            password,
        })
    }

    /// Download the feed body. The URL must be http(s); the response must be
    /// 200 with an XML content type.
    pub fn fetch(&self, feed_url: &str) -> Result<Vec<u8>, SyncError> {
        let parsed = url::Url::parse(feed_url)
            .map_err(|e| SyncError::Feed(format!("Invalid feed URL {feed_url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SyncError::Feed(format!(
                "Unsupported feed URL scheme {:?} (need http/https)",
                parsed.scheme()
            )));
        }

        let mut request = self.client.get(parsed);
        if let Some(user) = &self.username {
            request = request.basic_auth(user, self.password.as_deref());
        }

        let resp = request
            .send()
            .map_err(|e| SyncError::Feed(format!("Feed fetch failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::Feed(format!("Feed returned HTTP {status}")));
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !is_xml_content_type(&content_type) {
            return Err(SyncError::Feed(format!(
                "Feed content type {content_type:?} is not XML"
            )));
        }

        let body = resp
            .bytes()
            .map_err(|e| SyncError::Feed(format!("Failed to read feed body: {e}")))?;
        Ok(body.to_vec())
    }
}

/// text/xml, application/xml, and the +xml suffix family all count.
pub fn is_xml_content_type(raw: &str) -> bool {
    let Ok(m) = raw.parse::<mime::Mime>() else {
        return false;
    };
    m.subtype() == mime::XML || m.suffix() == Some(mime::XML)
}
