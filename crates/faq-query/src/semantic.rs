//! Dense-embedding scoring.
//!
//! A missing semantic signal is reported as [`SemanticSignal::Unavailable`]
//! rather than as a zero vector, so fusion can fall back to lexical-only
//! ranking instead of diluting lexical scores with zeros.

use std::time::Duration;

use tracing::{debug, warn};

use faq_core::{Corpus, Embedder};

/// Why semantic scores could not be produced for a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Unavailable {
    /// No record in the corpus carries an embedding.
    NoEmbeddings,
    /// The embedder returned an error.
    EmbeddingFailed(String),
    /// The embedder did not answer in time.
    Timeout(Duration),
    /// A stored embedding has a different length than the query embedding.
    DimensionMismatch {
        question_id: String,
        expected: usize,
        found: usize,
    },
}

impl std::fmt::Display for Unavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoEmbeddings => write!(f, "no record has an embedding"),
            Self::EmbeddingFailed(e) => write!(f, "query embedding failed: {}", e),
            Self::Timeout(d) => write!(f, "query embedding timed out after {:?}", d),
            Self::DimensionMismatch {
                question_id,
                expected,
                found,
            } => write!(
                f,
                "record {} has a {}-dimensional embedding, query has {}",
                question_id, found, expected
            ),
        }
    }
}

/// Outcome of semantic scoring.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticSignal {
    /// One cosine similarity per record, aligned to corpus order.
    Scored(Vec<f32>),
    Unavailable(Unavailable),
}

impl SemanticSignal {
    pub fn scores(&self) -> Option<&[f32]> {
        match self {
            Self::Scored(scores) => Some(scores),
            Self::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Scored(_))
    }
}

/// Cosine similarity between two vectors of equal length.
///
/// Returns 0.0 if either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Scores queries against precomputed record embeddings.
#[derive(Debug, Clone, Default)]
pub struct SemanticScorer {
    timeout: Option<Duration>,
}

impl SemanticScorer {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Score `query` against every record in `corpus`.
    ///
    /// Calls the embedder at most once. Records without an embedding score
    /// 0.0. Embedder failures are logged and reported as unavailable.
    pub async fn score<E>(&self, corpus: &Corpus, query: &str, embedder: &E) -> SemanticSignal
    where
        E: Embedder + ?Sized,
    {
        if !corpus.has_embeddings() {
            return SemanticSignal::Unavailable(Unavailable::NoEmbeddings);
        }

        let embedded = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, embedder.embed_query(query)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Query embedding timed out after {:?}", limit);
                    return SemanticSignal::Unavailable(Unavailable::Timeout(limit));
                }
            },
            None => embedder.embed_query(query).await,
        };

        let query_embedding = match embedded {
            Ok(v) => v,
            Err(e) => {
                warn!("Error in embedding search: {}", e);
                return SemanticSignal::Unavailable(Unavailable::EmbeddingFailed(e.to_string()));
            }
        };

        let mut scores = Vec::with_capacity(corpus.len());
        for record in corpus.records() {
            let Some(embedding) = &record.embedding else {
                scores.push(0.0);
                continue;
            };
            if embedding.len() != query_embedding.len() {
                let reason = Unavailable::DimensionMismatch {
                    question_id: record.question_id.clone(),
                    expected: query_embedding.len(),
                    found: embedding.len(),
                };
                warn!("Semantic scoring disabled for this query: {}", reason);
                return SemanticSignal::Unavailable(reason);
            }
            scores.push(cosine_similarity(&query_embedding, embedding));
        }

        debug!("Semantic scores computed for {} records", scores.len());
        SemanticSignal::Scored(scores)
    }
}
