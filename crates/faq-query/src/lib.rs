//! faq-query - Hybrid FAQ ranking engine
//!
//! This crate answers free-text questions against a fixed FAQ corpus by
//! fusing a TF-IDF lexical score with a dense-embedding semantic score.
//!
//! # Features
//!
//! - Load-once corpus cache with retry on failed loads
//! - TF-IDF index over unigrams and bigrams, built once per corpus
//! - Semantic scoring that reports a missing signal instead of zeros
//! - Weighted fusion with stable tie-breaking and zero-score filtering
//!
//! # Example
//!
//! ```rust,ignore
//! use faq_query::FaqEngine;
//! use std::sync::Arc;
//!
//! let engine = FaqEngine::new(Arc::new(source), Arc::new(embedder));
//! let results = engine.search("how do I register", 3).await;
//! ```

mod cache;
mod engine;
mod fusion;
mod lexical;
mod semantic;
mod tfidf;

#[cfg(test)]
mod test_support;

pub use cache::CorpusCache;
pub use engine::{EngineStatus, FaqEngine, QueryConfig};
pub use fusion::{select_top_k, weighted_fusion, FusionWeights};
pub use lexical::{LexicalIndex, LexicalIndexer};
pub use semantic::{cosine_similarity, SemanticScorer, SemanticSignal, Unavailable};
pub use tfidf::{Analyzer, TfidfVectorizer};

// Re-export for convenience
pub use faq_core::{RankedResult, SearchMethod, SearchResponse};
