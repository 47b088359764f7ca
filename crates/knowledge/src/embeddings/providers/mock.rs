//! Offline embedding provider built from hashed word trigrams.

use crate::embeddings::provider::EmbeddingProvider;
use faqbot_core::AppResult;
use std::collections::HashMap;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "when", "where", "how", "does", "do",
];

/// Deterministic provider for tests and offline development.
///
/// Each word outside the stop list contributes its character trigrams and its
/// whole-word hash to fixed dimensions; the result is scaled to unit length.
/// Texts sharing vocabulary score high under cosine similarity.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
}

impl MockProvider {
    /// Create a new mock provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, token: &str, seed: u64) -> usize {
        let hash = token
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(seed).wrapping_add(b as u64));
        (hash % self.dimensions as u64) as usize
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .filter(|w| w.chars().count() > 1 && !STOP_WORDS.contains(w))
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                embedding[self.bucket(&trigram, 37)] += (*freq as f32).sqrt();
            }
            embedding[self.bucket(word, 31)] += *freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_mock_provider_unit_length() {
        let provider = MockProvider::new(384);
        let embedding = provider.embed("Kigali campus admissions").await.unwrap();

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_mock_provider_deterministic() {
        let provider = MockProvider::new(128);
        let a = provider.embed("application deadline").await.unwrap();
        let b = provider.embed("application deadline").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_mock_provider_shared_vocabulary_scores_higher() {
        let provider = MockProvider::new(256);
        let query = provider.embed("When is the application deadline?").await.unwrap();
        let related = provider
            .embed("The application deadline for fall admission is March 1.")
            .await
            .unwrap();
        let unrelated = provider
            .embed("The cafeteria serves lunch from noon.")
            .await
            .unwrap();

        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_mock_provider_empty_text_is_zero() {
        let provider = MockProvider::new(64);
        let embedding = provider.embed("").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_mock_provider_batch_order() {
        let provider = MockProvider::new(64);
        let texts = vec!["tuition".to_string(), "housing".to_string()];
        let batch = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(batch[1], provider.embed("housing").await.unwrap());
    }
}
