//! Heuristic check for answers the model could not ground.

/// Phrases a model uses when the retrieved context did not answer the
/// question. Matched case-insensitively as substrings.
pub const UNAVAILABLE_PHRASES: &[&str] = &[
    "not available",
    "not in the context",
    "i'm sorry",
    "i am sorry",
    "no information",
    "can't answer",
    "cannot answer",
    "insufficient context",
    "don't have information",
    "unable to find",
    "the text does not provide",
];

/// Whether `answer` signals that the grounded context was insufficient.
///
/// Any single phrase hit counts. Apologetic but correct answers are
/// misclassified; confidently wrong ones pass.
pub fn is_answer_unavailable(answer: &str) -> bool {
    let lower = answer.to_lowercase();
    UNAVAILABLE_PHRASES.iter().any(|phrase| lower.contains(phrase))
}
