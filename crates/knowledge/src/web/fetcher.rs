//! Page text fetching for web search results.

use crate::loader::html_to_text;
use faqbot_core::{AppError, AppResult};
use std::time::Duration;

/// Fetches a page and returns its visible text.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> AppResult<String>;
}

/// HTTP page fetcher with a per-request timeout and a text length cap.
pub struct HttpPageFetcher {
    client: reqwest::Client,
    max_chars: usize,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration, max_chars: usize) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Search(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, max_chars })
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpPageFetcher {
    /// The body is used whatever the response status.
    async fn fetch_text(&self, url: &str) -> AppResult<String> {
        let body = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Failed to fetch {}: {}", url, e)))?
            .text()
            .await
            .map_err(|e| AppError::Search(format!("Failed to read {}: {}", url, e)))?;

        Ok(truncate_chars(&html_to_text(&body), self.max_chars))
    }
}

/// Keep at most `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
