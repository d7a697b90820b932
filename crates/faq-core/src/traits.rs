//! Core traits defining the interfaces between components.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::FaqRecord;

/// Where the corpus comes from.
///
/// Fetches are all-or-nothing: an implementation either returns every record
/// or an error.
#[async_trait]
pub trait CorpusSource: Send + Sync {
    /// Fetch every record, in a stable order.
    async fn fetch_all(&self) -> Result<Vec<FaqRecord>>;

    /// Human-readable name used in logs.
    fn name(&self) -> String;
}

/// Embedding model trait.
///
/// The engine only requires that stored record embeddings and query
/// embeddings come from the same vector space.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of document texts.
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;
}
