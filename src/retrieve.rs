//! Nearest-sentence retrieval over the training corpus.
//!
//! [`TfIdfRetriever`] weighs terms with smoothed inverse document frequency
//! (`ln((1 + n) / (1 + df)) + 1`), L2-normalizes each sentence vector and
//! ranks by cosine similarity.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Tokens of two or more word characters.
static RE_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// Picks training examples similar to a query.
pub trait SimilarityRetriever: Send + Sync {
    /// Indices of the `k` most similar corpus sentences, most similar first.
    fn nearest(&self, query: &str, k: usize) -> Vec<usize>;
}

/// Sparse, normalized term-weight vector sorted by term id.
type SparseVector = Vec<(usize, f64)>;

/// TF-IDF index over a fixed corpus of (masked) sentences.
#[derive(Debug, Clone)]
pub struct TfIdfRetriever {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    documents: Vec<SparseVector>,
}

impl TfIdfRetriever {
    pub fn new<S: AsRef<str>>(corpus: &[S]) -> Self {
        let tokenized: Vec<Vec<String>> = corpus.iter().map(|s| tokenize(s.as_ref())).collect();

        let mut vocabulary = HashMap::new();
        let mut df: Vec<usize> = Vec::new();
        for tokens in &tokenized {
            let mut seen = std::collections::HashSet::new();
            for token in tokens {
                let next_id = vocabulary.len();
                let id = *vocabulary.entry(token.clone()).or_insert(next_id);
                if id == df.len() {
                    df.push(0);
                }
                if seen.insert(id) {
                    df[id] += 1;
                }
            }
        }

        let n = corpus.len() as f64;
        let idf: Vec<f64> = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        let mut retriever = Self {
            vocabulary,
            idf,
            documents: Vec::new(),
        };
        retriever.documents = tokenized.iter().map(|t| retriever.vectorize(t)).collect();

        tracing::debug!(
            documents = retriever.documents.len(),
            terms = retriever.vocabulary.len(),
            "built tf-idf index"
        );
        retriever
    }

    fn vectorize(&self, tokens: &[String]) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokens {
            if let Some(&id) = self.vocabulary.get(token) {
                *counts.entry(id).or_default() += 1.0;
            }
        }
        let mut vector: SparseVector = counts
            .into_iter()
            .map(|(id, tf)| (id, tf * self.idf[id]))
            .collect();
        let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut vector {
                *w /= norm;
            }
        }
        vector.sort_unstable_by_key(|(id, _)| *id);
        vector
    }

    /// Cosine similarity of `query` against every corpus sentence.
    pub fn similarities(&self, query: &str) -> Vec<f64> {
        let query = self.vectorize(&tokenize(query));
        self.documents.iter().map(|doc| dot(&query, doc)).collect()
    }
}

impl SimilarityRetriever for TfIdfRetriever {
    fn nearest(&self, query: &str, k: usize) -> Vec<usize> {
        let scores = self.similarities(query);
        let mut ranked: Vec<usize> = (0..scores.len()).collect();
        // Stable sort keeps corpus order among equal scores.
        ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        ranked.truncate(k);
        ranked
    }
}

fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    RE_TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Dot product of two id-sorted sparse vectors.
fn dot(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j, mut sum) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<&'static str> {
        vec![
            "candidate ate candidate because target_pronoun was hungry.",
            "candidate did not fit in candidate because target_pronoun was too big.",
            "candidate zoomed by candidate because target_pronoun was going so fast.",
            "candidate ate candidate because target_pronoun was tasty.",
        ]
    }

    #[test]
    fn tokens_skip_single_characters() {
        assert_eq!(tokenize("A cat, a Rat!"), vec!["cat", "rat"]);
    }

    #[test]
    fn nearest_ranks_by_cosine() {
        let retriever = TfIdfRetriever::new(&corpus());
        let hits = retriever.nearest("candidate ate candidate because target_pronoun was starving.", 2);
        assert_eq!(hits.len(), 2);
        assert!(hits.contains(&0));
        assert!(hits.contains(&3));
        assert_eq!(retriever.nearest("candidate was going so fast", 1), vec![2]);
    }

    #[test]
    fn identical_sentence_scores_one() {
        let retriever = TfIdfRetriever::new(&corpus());
        let scores = retriever.similarities(corpus()[1]);
        assert!((scores[1] - 1.0).abs() < 1e-9);
        assert!(scores.iter().all(|s| *s <= 1.0 + 1e-9));
    }

    #[test]
    fn ties_keep_corpus_order() {
        let retriever = TfIdfRetriever::new(&["same words", "other words", "same words"]);
        assert_eq!(retriever.nearest("same words", 3), vec![0, 2, 1]);
    }

    #[test]
    fn unknown_terms_score_zero() {
        let retriever = TfIdfRetriever::new(&corpus());
        assert!(retriever.similarities("zebra xylophone").iter().all(|s| *s == 0.0));
        assert_eq!(retriever.nearest("zebra", 10).len(), 4);
    }
}
