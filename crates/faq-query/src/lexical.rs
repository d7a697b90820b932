//! Lexical index construction and scoring.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use faq_core::Corpus;

use crate::tfidf::{sparse_dot, TfidfVectorizer};

/// TF-IDF index over the questions of one corpus snapshot.
#[derive(Debug, Clone)]
pub struct LexicalIndex {
    vectorizer: TfidfVectorizer,
    /// Questions the vectorizer was fitted on, in row order.
    questions: Vec<String>,
}

impl LexicalIndex {
    /// Fit an index over every question in `corpus`.
    pub fn build(corpus: &Corpus, max_features: usize) -> Self {
        let vectorizer = TfidfVectorizer::fit(corpus.questions(), max_features);
        Self {
            vectorizer,
            questions: corpus.questions().map(str::to_string).collect(),
        }
    }

    /// Whether this index was fitted on exactly the questions of `corpus`.
    pub fn covers(&self, corpus: &Corpus) -> bool {
        self.questions.len() == corpus.len()
            && self.questions.iter().map(String::as_str).eq(corpus.questions())
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.vectorizer.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vectorizer.vocabulary_size()
    }

    /// Cosine similarity of `query` against every indexed record.
    pub fn score(&self, query: &str) -> Vec<f32> {
        let query_vec = self.vectorizer.transform(query);
        if query_vec.is_empty() {
            debug!("Query has no in-vocabulary terms");
            return vec![0.0; self.len()];
        }

        self.vectorizer
            .rows()
            .iter()
            .map(|row| sparse_dot(&query_vec, row).clamp(0.0, 1.0))
            .collect()
    }
}

/// Builds the lexical index at most once and scores queries against it.
pub struct LexicalIndexer {
    max_features: usize,
    cell: OnceCell<Arc<LexicalIndex>>,
}

impl LexicalIndexer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            cell: OnceCell::new(),
        }
    }

    /// Build the index for `corpus` unless one exists.
    ///
    /// An empty corpus leaves the index absent.
    pub async fn build(&self, corpus: &Corpus) -> Option<Arc<LexicalIndex>> {
        if let Some(index) = self.cell.get() {
            return Some(Arc::clone(index));
        }
        if corpus.is_empty() {
            warn!("No FAQs loaded; lexical index not built");
            return None;
        }

        let index = self
            .cell
            .get_or_init(|| async {
                let index = LexicalIndex::build(corpus, self.max_features);
                info!(
                    "Lexical index built: {} records, {} terms",
                    index.len(),
                    index.vocabulary_size()
                );
                Arc::new(index)
            })
            .await;
        Some(Arc::clone(index))
    }

    /// The built index, if any.
    pub fn get(&self) -> Option<Arc<LexicalIndex>> {
        self.cell.get().cloned()
    }

    /// Lexical scores for `query`, aligned to `corpus` order.
    ///
    /// Fails closed to zeros when no index can be built or when the index
    /// does not match the corpus it is asked to score.
    pub async fn score(&self, corpus: &Corpus, query: &str) -> Vec<f32> {
        match self.build(corpus).await {
            Some(index) if index.covers(corpus) => index.score(query),
            Some(index) => {
                warn!(
                    "Lexical index was built over a different corpus ({} records, now {}); scoring as zero",
                    index.len(),
                    corpus.len()
                );
                vec![0.0; corpus.len()]
            }
            None => vec![0.0; corpus.len()],
        }
    }
}
