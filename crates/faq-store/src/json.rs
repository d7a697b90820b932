//! JSON file corpus source.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use faq_core::{CorpusSource, FaqError, FaqRecord, Result};

/// Reads a JSON array of FAQ records from a file on every fetch.
pub struct JsonFaqSource {
    path: PathBuf,
}

impl JsonFaqSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse records from a JSON string.
    pub fn parse(content: &str) -> Result<Vec<FaqRecord>> {
        Ok(serde_json::from_str(content)?)
    }
}

#[async_trait]
impl CorpusSource for JsonFaqSource {
    async fn fetch_all(&self) -> Result<Vec<FaqRecord>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FaqError::source_unavailable(self.name(), e.to_string()))?;
        let records = Self::parse(&content)
            .map_err(|e| FaqError::source_unavailable(self.name(), e.to_string()))?;
        debug!("Read {} records from {}", records.len(), self.path.display());
        Ok(records)
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}
