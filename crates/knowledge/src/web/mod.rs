//! Web fallback search.
//!
//! Used when the indexed knowledge cannot answer a question: the query is
//! sent to a search provider, the result pages are fetched, and the texts
//! that mention the target domain are returned as alternate context.

pub mod fetcher;
pub mod provider;

pub use fetcher::{HttpPageFetcher, PageFetcher};
pub use provider::{SearchProvider, SearchRequest, SearchResult, SerpApiClient};

use faqbot_core::config::SearchSettings;
use faqbot_core::{AppError, AppResult};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Separator between collected snippets.
pub const SNIPPET_SEPARATOR: &str = "\n\n";

/// Whether `text` mentions any of `keywords`, ignoring case.
pub fn is_relevant(text: &str, keywords: &[String]) -> bool {
    let lower = text.to_lowercase();
    keywords
        .iter()
        .any(|keyword| !keyword.is_empty() && lower.contains(&keyword.to_lowercase()))
}

/// Append `keyword` to `query` unless the query already mentions it.
pub fn augment_query(query: &str, keyword: &str) -> String {
    if keyword.is_empty() || query.to_lowercase().contains(&keyword.to_lowercase()) {
        query.to_string()
    } else {
        format!("{} {}", query, keyword)
    }
}

/// Search-then-fetch fallback context builder.
pub struct WebFallbackSearch {
    settings: SearchSettings,
    provider: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn PageFetcher>,
}

impl WebFallbackSearch {
    pub fn new(
        settings: &SearchSettings,
        provider: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        Self {
            settings: settings.clone(),
            provider,
            fetcher,
        }
    }

    /// Build from settings with the SerpApi provider and the HTTP fetcher.
    pub fn from_settings(settings: &SearchSettings) -> AppResult<Self> {
        let provider = SerpApiClient::new(&settings.endpoint)?;
        let fetcher = HttpPageFetcher::new(
            std::time::Duration::from_secs(settings.fetch_timeout_secs),
            settings.max_snippet_chars,
        )?;
        Ok(Self::new(settings, Arc::new(provider), Arc::new(fetcher)))
    }

    /// Configured snippet count.
    pub fn default_num_results(&self) -> usize {
        self.settings.num_results
    }

    /// Collect up to `num_results` page texts for `query`, joined by a blank
    /// line. Returns an empty string when nothing was collected.
    ///
    /// Relevant pages are taken first in rank order. If too few are found,
    /// the remaining slots are filled with other non-empty pages in rank
    /// order, skipping exact duplicates.
    ///
    /// # Errors
    /// Fails with `AppError::Config` when no search API key is configured and
    /// with `AppError::Search` when the search request itself fails. Page
    /// fetch failures only yield empty text for that page.
    pub async fn search(
        &self,
        query: &str,
        num_results: usize,
        add_domain_context: bool,
    ) -> AppResult<String> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config(format!(
                    "Search API key not configured (set {})",
                    self.settings.api_key_env
                ))
            })?;

        let query = if add_domain_context {
            augment_query(query, &self.settings.domain_keyword)
        } else {
            query.to_string()
        };

        let request = SearchRequest {
            query,
            num: num_results.saturating_mul(2),
            country: self.settings.country.clone(),
            location: self.settings.location.clone(),
            language: self.settings.language.clone(),
            api_key: api_key.to_string(),
        };

        tracing::info!("Web fallback search: {}", request.query);
        let results = self.provider.search(&request).await?;
        tracing::debug!("Search returned {} results", results.len());

        let snippets = self.collect_snippets(&results, num_results).await;
        tracing::info!("Collected {} web snippets", snippets.len());

        Ok(snippets.join(SNIPPET_SEPARATOR))
    }

    async fn collect_snippets(&self, results: &[SearchResult], limit: usize) -> Vec<String> {
        let mut snippets: Vec<String> = Vec::with_capacity(limit.min(results.len()));
        if limit == 0 || results.is_empty() {
            return snippets;
        }

        let mut fetched: Vec<Option<String>> = vec![None; results.len()];
        let concurrency = self.settings.fetch_concurrency.max(1);

        {
            let mut pages = stream::iter(results.iter().enumerate())
                .map(|(i, result)| async move { (i, self.fetch(&result.link).await) })
                .buffered(concurrency);

            while let Some((i, text)) = pages.next().await {
                if is_relevant(&text, &self.settings.relevance_keywords) {
                    snippets.push(text.clone());
                }
                fetched[i] = Some(text);
                if snippets.len() >= limit {
                    return snippets;
                }
            }
        }

        tracing::debug!(
            "Only {} relevant snippets, backfilling from remaining results",
            snippets.len()
        );

        for (i, result) in results.iter().enumerate() {
            if snippets.len() >= limit {
                break;
            }

            let text = match fetched[i].take() {
                Some(text) => text,
                None => self.fetch(&result.link).await,
            };

            if !text.is_empty() && !snippets.contains(&text) {
                snippets.push(text);
            }
        }

        snippets
    }

    async fn fetch(&self, url: &str) -> String {
        match self.fetcher.fetch_text(url).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Error fetching {}: {}", url, e);
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords() -> Vec<String> {
        vec!["rwanda".to_string(), "kigali".to_string()]
    }

    #[test]
    fn test_is_relevant_ignores_case() {
        assert!(is_relevant("Campus in KIGALI", &keywords()));
        assert!(!is_relevant("Campus in Pittsburgh", &keywords()));
        assert!(!is_relevant("", &keywords()));
        assert!(!is_relevant("anything", &[String::new()]));
    }

    #[test]
    fn test_augment_query() {
        assert_eq!(augment_query("tuition fees", "cmu-africa"), "tuition fees cmu-africa");
        assert_eq!(augment_query("CMU-Africa tuition", "cmu-africa"), "CMU-Africa tuition");
        assert_eq!(augment_query("tuition", ""), "tuition");
    }
}
