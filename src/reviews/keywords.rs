//! Keyword extraction over a word co-occurrence graph
//!
//! Words longer than three characters become nodes; each pair of adjacent
//! words in the filtered sequence is joined by an undirected edge. Nodes are
//! ranked by degree, which stands in for a full PageRank pass.

use std::collections::{HashMap, HashSet};

pub const DEFAULT_TOP_N: usize = 5;

/// Shortest token length that survives filtering
const MIN_TOKEN_LEN: usize = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordRanker;

impl KeywordRanker {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Top `top_n` tokens by number of distinct neighbours.
    ///
    /// Tokens keep their original case and punctuation. Ties keep the order
    /// in which tokens first entered the graph.
    #[must_use]
    pub fn extract_keywords(&self, text: &str, top_n: usize) -> Vec<String> {
        let words: Vec<&str> = text
            .split_whitespace()
            .filter(|word| word.chars().count() >= MIN_TOKEN_LEN)
            .collect();

        let mut order: Vec<&str> = Vec::new();
        let mut neighbours: HashMap<&str, HashSet<&str>> = HashMap::new();

        for pair in words.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            for (node, other) in [(a, b), (b, a)] {
                neighbours
                    .entry(node)
                    .or_insert_with(|| {
                        order.push(node);
                        HashSet::new()
                    })
                    .insert(other);
            }
        }

        let mut ranked: Vec<(&str, usize)> = order
            .into_iter()
            .map(|node| (node, neighbours.get(node).map_or(0, HashSet::len)))
            .collect();
        // Stable sort keeps insertion order among equal degrees.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        ranked
            .into_iter()
            .take(top_n)
            .map(|(node, _)| node.to_string())
            .collect()
    }
}
