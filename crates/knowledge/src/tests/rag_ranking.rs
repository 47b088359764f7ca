//! Ranking behavior of the persisted vector index.

use crate::index::MemoryIndex;
use crate::types::{DocumentMetadata, IndexedChunk};
use crate::vector_index::VectorIndex;
use tempfile::TempDir;

/// Helper to create a chunk with a given embedding.
fn create_test_chunk(id: &str, text: &str, embedding: Vec<f32>) -> IndexedChunk {
    IndexedChunk {
        id: id.to_string(),
        position: 0,
        text: text.to_string(),
        metadata: DocumentMetadata {
            source: "faq.txt".to_string(),
            source_type: "file".to_string(),
            length: text.chars().count(),
        },
        embedding,
    }
}

/// Helper to create a normalized embedding.
fn normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

/// Build, save and reload so ranking is checked on the persisted form.
fn persisted(chunks: Vec<IndexedChunk>) -> (TempDir, MemoryIndex) {
    let temp = TempDir::new().unwrap();
    MemoryIndex::build(chunks).unwrap().save(temp.path()).unwrap();
    let index = MemoryIndex::load(temp.path()).unwrap();
    (temp, index)
}

#[test]
fn test_relevant_query_returns_high_scores() {
    let (_temp, index) = persisted(vec![
        create_test_chunk(
            "chunk1",
            "Tuition is paid at the start of each semester",
            normalize(&[1.0, 0.5, 0.2, 0.1]),
        ),
        create_test_chunk(
            "chunk2",
            "The cafeteria serves lunch from noon",
            normalize(&[-0.3, -0.8, 0.4, -0.2]),
        ),
    ]);

    let results = index.search(&normalize(&[0.9, 0.4, 0.3, 0.1]), 5).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0.id, "chunk1", "Most relevant chunk should be first");
    assert!(results[0].1 > 0.8, "Relevant chunk score should be high: {}", results[0].1);
    assert!(results[0].1 > results[1].1, "Scores should be ordered");
}

#[test]
fn test_scores_are_ordered_descending() {
    let (_temp, index) = persisted(vec![
        create_test_chunk("chunk1", "Text A", normalize(&[1.0, 0.0, 0.0])),
        create_test_chunk("chunk2", "Text B", normalize(&[0.7, 0.7, 0.0])),
        create_test_chunk("chunk3", "Text C", normalize(&[0.0, 1.0, 0.0])),
        create_test_chunk("chunk4", "Text D", normalize(&[-1.0, 0.0, 0.0])),
    ]);

    let results = index.search(&normalize(&[1.0, 0.0, 0.0]), 10).unwrap();

    for pair in results.windows(2) {
        assert!(
            pair[0].1 >= pair[1].1,
            "Scores should be ordered: {} >= {}",
            pair[0].1,
            pair[1].1
        );
    }
    assert_eq!(results[0].0.id, "chunk1");
    assert!(results[0].1 > 0.99, "Perfect match should have score near 1.0");
    assert_eq!(results[3].0.id, "chunk4");
    assert!(results[3].1 < -0.9, "Opposite vectors should be near -1.0");
}

#[test]
fn test_equal_scores_keep_insertion_order() {
    let (_temp, index) = persisted(vec![
        create_test_chunk("first", "Text A", normalize(&[0.0, 1.0])),
        create_test_chunk("second", "Text B", normalize(&[0.0, 1.0])),
    ]);

    let results = index.search(&normalize(&[0.0, 1.0]), 2).unwrap();
    assert_eq!(results[0].0.id, "first");
    assert_eq!(results[1].0.id, "second");
}

#[test]
fn test_top_k_limit_respected() {
    let chunks = (1..=10)
        .map(|i| {
            create_test_chunk(
                &format!("chunk{}", i),
                &format!("Text {}", i),
                normalize(&[i as f32 / 10.0, 1.0, 0.0]),
            )
        })
        .collect();
    let (_temp, index) = persisted(chunks);

    let results = index.search(&normalize(&[1.0, 0.0, 0.0]), 3).unwrap();

    assert_eq!(results.len(), 3, "Should return exactly top_k results");
    assert_eq!(results[0].0.id, "chunk10");
}
