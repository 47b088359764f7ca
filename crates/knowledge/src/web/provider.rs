//! Web search providers.

use faqbot_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout for one search API request.
pub const SEARCH_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters of one search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub num: usize,
    pub country: String,
    pub location: String,
    pub language: String,
    pub api_key: String,
}

/// One organic search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub link: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
}

/// Anything that turns a query into an ordered list of result links.
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one search; results are in provider rank order.
    async fn search(&self, request: &SearchRequest) -> AppResult<Vec<SearchResult>>;
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

/// SerpApi Google search client.
pub struct SerpApiClient {
    client: reqwest::Client,
    endpoint: String,
}

impl SerpApiClient {
    pub fn new(endpoint: &str) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(SEARCH_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Search(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim().to_string(),
        })
    }

    fn query_params(request: &SearchRequest) -> Vec<(&'static str, String)> {
        vec![
            ("q", request.query.clone()),
            ("api_key", request.api_key.clone()),
            ("num", request.num.to_string()),
            ("gl", request.country.clone()),
            ("location", request.location.clone()),
            ("hl", request.language.clone()),
        ]
    }
}

#[async_trait::async_trait]
impl SearchProvider for SerpApiClient {
    async fn search(&self, request: &SearchRequest) -> AppResult<Vec<SearchResult>> {
        tracing::debug!(query = %request.query, num = request.num, "Sending search request");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&Self::query_params(request))
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(200).collect();
            return Err(AppError::Search(format!(
                "Search API error ({}): {}",
                status, snippet
            )));
        }

        let body: SerpApiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to decode search response: {}", e)))?;

        if let Some(error) = body.error {
            return Err(AppError::Search(error));
        }

        Ok(parse_organic_results(body.organic_results))
    }
}

fn parse_organic_results(results: Vec<OrganicResult>) -> Vec<SearchResult> {
    results
        .into_iter()
        .filter_map(|r| {
            let link = r.link?;
            Some(SearchResult {
                link,
                title: r.title,
                snippet: r.snippet,
            })
        })
        .collect()
}
