//! Core domain types for FAQ search.

use serde::{Deserialize, Serialize};

fn default_question_id() -> String {
    "unknown".to_string()
}

fn default_category() -> String {
    "general".to_string()
}

/// A single question/answer pair in the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqRecord {
    /// FAQ identifier (e.g. `Q1.1`). Not required to be unique.
    #[serde(default = "default_question_id")]
    pub question_id: String,

    /// FAQ category.
    #[serde(default = "default_category")]
    pub category: String,

    /// The question text. This is what the lexical index is built over.
    #[serde(default)]
    pub question: String,

    /// The answer text.
    #[serde(default)]
    pub answer: String,

    /// Precomputed embedding of the question, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl FaqRecord {
    /// Create a record without an embedding.
    pub fn new(question_id: &str, category: &str, question: &str, answer: &str) -> Self {
        Self {
            question_id: question_id.to_string(),
            category: category.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            embedding: None,
        }
    }

    /// Attach a precomputed embedding.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// The ordered set of records searched against.
///
/// Record order defines the index used to align score vectors, so a corpus is
/// never mutated once built.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    records: Vec<FaqRecord>,
}

impl Corpus {
    pub fn new(records: Vec<FaqRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[FaqRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&FaqRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether at least one record carries a precomputed embedding.
    pub fn has_embeddings(&self) -> bool {
        self.records.iter().any(|r| r.embedding.is_some())
    }

    /// Number of records carrying an embedding.
    pub fn embedded_count(&self) -> usize {
        self.records.iter().filter(|r| r.embedding.is_some()).count()
    }

    /// Iterate over the question texts in corpus order.
    pub fn questions(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.question.as_str())
    }
}

impl From<Vec<FaqRecord>> for Corpus {
    fn from(records: Vec<FaqRecord>) -> Self {
        Self::new(records)
    }
}

/// Which signals contributed to a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    /// Lexical and semantic scores were fused.
    Hybrid,
    /// Semantic signal was unavailable; lexical scores only.
    Lexical,
}

impl SearchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hybrid => "hybrid",
            Self::Lexical => "lexical",
        }
    }
}

impl std::fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked search hit with score provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub question: String,
    pub answer: String,
    pub question_id: String,
    pub category: String,

    /// Combined score used for ranking.
    pub similarity_score: f32,

    /// Lexical component.
    pub lexical_score: f32,

    /// Semantic component (0.0 when the search was lexical-only).
    pub semantic_score: f32,

    pub search_method: SearchMethod,
}

/// Search results container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The original query.
    pub query: String,

    /// Total results returned.
    pub total_results: usize,

    /// Method used for this query.
    pub search_method: SearchMethod,

    /// Search latency in milliseconds.
    pub latency_ms: u64,

    /// Individual results, best first.
    pub results: Vec<RankedResult>,
}

/// Statistics about a stored corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    /// Number of records.
    pub records: u64,

    /// Number of records with an embedding.
    pub embedded: u64,

    /// Number of distinct categories.
    pub categories: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_defaults_from_sparse_json() {
        let record: FaqRecord =
            serde_json::from_str(r#"{"question": "What is ViBe?", "answer": "Our LMS"}"#).unwrap();
        assert_eq!(record.question_id, "unknown");
        assert_eq!(record.category, "general");
        assert!(record.embedding.is_none());
    }

    #[test]
    fn test_record_ignores_unknown_fields() {
        let record: FaqRecord = serde_json::from_str(
            r#"{"question_id": "Q1", "question": "q", "answer": "a", "tags": ["x"], "embedding": [0.5, 0.5]}"#,
        )
        .unwrap();
        assert_eq!(record.question_id, "Q1");
        assert_eq!(record.embedding, Some(vec![0.5, 0.5]));
    }

    #[test]
    fn test_corpus_embedding_presence() {
        let mut corpus = Corpus::new(vec![FaqRecord::new("Q1", "reg", "q", "a")]);
        assert!(!corpus.has_embeddings());

        corpus = Corpus::new(vec![
            FaqRecord::new("Q1", "reg", "q", "a"),
            FaqRecord::new("Q2", "reg", "q", "a").with_embedding(vec![1.0]),
        ]);
        assert!(corpus.has_embeddings());
        assert_eq!(corpus.embedded_count(), 1);
    }

    #[test]
    fn test_search_method_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SearchMethod::Hybrid).unwrap(),
            "\"hybrid\""
        );
        assert_eq!(SearchMethod::Lexical.to_string(), "lexical");
    }
}
