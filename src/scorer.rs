//! Pluggable per-term scoring strategies.
//!
//! A [`Scorer`] turns one `(term, document)` match into a numeric
//! contribution; the retriever sums contributions across query terms.

/// Term-level scoring contract. Implementations are pure functions of the
/// corpus statistics they're given.
pub trait Scorer: Send + Sync {
    /// `tf` = term frequency in the document, `df` = number of documents
    /// containing the term, `doc_len`/`avg_doc_len` = document and corpus
    /// average lengths in tokens, `num_docs` = corpus size.
    fn score_term(&self, tf: u32, df: u32, doc_len: u32, avg_doc_len: f32, num_docs: u32) -> f32;
}

/// Okapi BM25, `k1 = 1.2`, `b = 0.75` by default.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Scorer {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Scorer {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

impl Scorer for Bm25Scorer {
    fn score_term(&self, tf: u32, df: u32, doc_len: u32, avg_doc_len: f32, num_docs: u32) -> f32 {
        if avg_doc_len == 0.0 || df == 0 {
            return 0.0;
        }
        let tf = tf as f32;
        let n = num_docs as f32;
        let df = df as f32;
        let doc_len = doc_len as f32;

        let k = self.k1 * ((1.0 - self.b) + self.b * doc_len / avg_doc_len);
        let idf = ((n - df + 0.5) / (df + 0.5)).ln();
        (tf / (k + tf)) * idf
    }
}

/// Term-frequency/inverse-document-frequency cosine-similarity variant
/// (`§4.7` pluggable scorer contract); ignores document length.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineScorer;

impl Scorer for CosineScorer {
    fn score_term(&self, tf: u32, df: u32, _doc_len: u32, _avg_doc_len: f32, num_docs: u32) -> f32 {
        if df == 0 || tf == 0 {
            return 0.0;
        }
        let tf = tf as f32;
        let n = num_docs as f32;
        let df = df as f32;
        (1.0 + tf.ln()) * (1.0 + n / df).ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bm25_matches_average_length_document_formula() {
        // 3-document corpus; doc length equals the corpus average, so
        // K collapses to k1.
        let scorer = Bm25Scorer::default();
        let score = scorer.score_term(5, 1, 10, 10.0, 3);
        // K = 1.2 * (0.25 + 0.75) = 1.2
        // idf = ln((3 - 1 + 0.5) / (1 + 0.5)) = ln(2.5/1.5)
        let expected_idf = ((3.0_f32 - 1.0 + 0.5) / (1.0 + 0.5)).ln();
        let expected = (5.0 / (1.2 + 5.0)) * expected_idf;
        assert!((score - expected).abs() < 1e-6);
    }

    #[test]
    fn bm25_is_monotonic_in_term_frequency() {
        let scorer = Bm25Scorer::default();
        let low = scorer.score_term(1, 2, 100, 100.0, 10);
        let high = scorer.score_term(5, 2, 100, 100.0, 10);
        assert!(high > low);
    }

    #[test]
    fn bm25_is_monotonic_in_document_frequency() {
        let scorer = Bm25Scorer::default();
        let rare = scorer.score_term(3, 1, 100, 100.0, 10);
        let common = scorer.score_term(3, 8, 100, 100.0, 10);
        assert!(rare > common);
    }

    #[test]
    fn zero_avg_doc_length_does_not_panic() {
        let scorer = Bm25Scorer::default();
        assert_eq!(scorer.score_term(1, 1, 0, 0.0, 1), 0.0);
    }

    #[test]
    fn cosine_scorer_rewards_rare_terms() {
        let scorer = CosineScorer;
        let rare = scorer.score_term(2, 1, 0, 0.0, 10);
        let common = scorer.score_term(2, 8, 0, 0.0, 10);
        assert!(rare > common);
    }
}
