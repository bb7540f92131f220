use super::keywords::{DEFAULT_TOP_N, KeywordRanker};

const POSITIVE: [&str; 3] = ["good", "great", "excellent"];
const NEGATIVE: [&str; 3] = ["bad", "terrible", "worst"];

/// Lexicon-based sentiment over extracted keywords.
///
/// Only the top keywords are looked up, each worth +1 or -1, and the sum is
/// clamped to [-1, 1].
#[derive(Debug, Clone, Copy)]
pub struct SentimentScorer {
    ranker: KeywordRanker,
    top_n: usize,
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self::new(KeywordRanker::new())
    }
}

impl SentimentScorer {
    #[must_use]
    pub fn new(ranker: KeywordRanker) -> Self {
        Self {
            ranker,
            top_n: DEFAULT_TOP_N,
        }
    }

    #[must_use]
    pub fn score(&self, text: &str) -> f64 {
        let total: f64 = self
            .ranker
            .extract_keywords(text, self.top_n)
            .iter()
            .map(|word| word_polarity(&word.to_lowercase()))
            .sum();

        total.clamp(-1.0, 1.0)
    }
}

fn word_polarity(word: &str) -> f64 {
    if POSITIVE.contains(&word) {
        1.0
    } else if NEGATIVE.contains(&word) {
        -1.0
    } else {
        0.0
    }
}
