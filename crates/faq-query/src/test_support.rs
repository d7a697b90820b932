//! Mock collaborators shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use faq_core::{CorpusSource, Embedder, FaqError, FaqRecord, Result};

pub fn sample_records() -> Vec<FaqRecord> {
    vec![
        FaqRecord::new("Q1", "reg", "How do I register?", "Visit the portal"),
        FaqRecord::new("Q2", "platform", "What is ViBe?", "Our LMS"),
    ]
}

/// Corpus source that counts fetches.
pub struct CountingSource {
    records: Mutex<Vec<FaqRecord>>,
    fail: bool,
    fetches: AtomicUsize,
}

impl CountingSource {
    pub fn new(records: Vec<FaqRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            fail: false,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn set_records(&self, records: Vec<FaqRecord>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CorpusSource for CountingSource {
    async fn fetch_all(&self) -> Result<Vec<FaqRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.fail {
            return Err(FaqError::source_unavailable("mock", "connection refused"));
        }
        Ok(self.records.lock().unwrap().clone())
    }

    fn name(&self) -> String {
        "mock".to_string()
    }
}

/// Embedder returning a fixed vector, or failing.
pub struct FixedEmbedder {
    vector: Option<Vec<f32>>,
    calls: AtomicUsize,
}

impl FixedEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector: Some(vector),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            vector: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed_query(text).await?);
        }
        Ok(out)
    }

    async fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vector
            .clone()
            .ok_or_else(|| FaqError::embedding("provider unavailable"))
    }

    fn dimension(&self) -> usize {
        self.vector.as_ref().map_or(0, Vec::len)
    }
}

/// Embedder that never answers.
pub struct StalledEmbedder;

#[async_trait]
impl Embedder for StalledEmbedder {
    async fn embed_documents(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        std::future::pending().await
    }

    async fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
        std::future::pending().await
    }

    fn dimension(&self) -> usize {
        2
    }
}
