//! Hosted embedding APIs speaking the OpenAI `/embeddings` protocol.
//!
//! Voyage accepts the same request and response shape, so both providers
//! share one client and differ only in base URL, model, and key variable.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use faq_core::{Embedder, EmbeddingConfig, FaqError, Result};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

/// Embedder backed by an HTTP embeddings endpoint.
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
}

impl HttpEmbedder {
    /// Build a client for the configured hosted provider.
    ///
    /// The API key is read once from the environment: `api_key_env` if set,
    /// then the provider's default variables.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_base = config
            .api_base
            .as_deref()
            .or_else(|| config.provider.default_api_base())
            .ok_or_else(|| {
                FaqError::config(format!(
                    "Provider '{}' has no API base; set embedding.api_base",
                    config.provider
                ))
            })?;

        let api_key = config.resolve_api_key(|var| std::env::var(var).ok());

        Self::new(
            api_base,
            config.model_name(),
            api_key,
            config.dimension,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn new(
        api_base: &str,
        model: impl Into<String>,
        api_key: Option<String>,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("faq-search/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| FaqError::embedding(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", api_base.trim_end_matches('/')),
            model: model.into(),
            api_key,
            dimension,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn request(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Requesting {} embeddings from {} ({})",
            texts.len(),
            self.endpoint,
            self.model
        );

        let mut request = self.client.post(&self.endpoint).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FaqError::embedding(format!("Embedding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FaqError::embedding(format!(
                "Embedding API returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| FaqError::embedding(format!("Invalid embedding response: {}", e)))?;

        order_embeddings(parsed.data, texts.len())
    }
}

/// Put embeddings back in input order and check the count.
fn order_embeddings(mut data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(FaqError::embedding(format!(
            "Expected {} embeddings, got {}",
            expected,
            data.len()
        )));
    }
    if data.iter().all(|d| d.index.is_some()) {
        data.sort_by_key(|d| d.index);
    }
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.request(texts).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.request(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| FaqError::embedding("No embedding returned"))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faq_core::EmbeddingProvider;

    #[test]
    fn test_request_shape() {
        let input = ["How do I register?"];
        let body = serde_json::to_value(EmbeddingRequest {
            model: "text-embedding-3-small",
            input: &input,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "text-embedding-3-small",
                "input": ["How do I register?"]
            })
        );
    }

    #[test]
    fn test_response_reordered_by_index() {
        let response: EmbeddingResponse = serde_json::from_value(serde_json::json!({
            "object": "list",
            "data": [
                {"object": "embedding", "index": 1, "embedding": [0.0, 1.0]},
                {"object": "embedding", "index": 0, "embedding": [1.0, 0.0]}
            ],
            "model": "text-embedding-3-small"
        }))
        .unwrap();

        let ordered = order_embeddings(response.data, 2).unwrap();
        assert_eq!(ordered, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_response_count_mismatch() {
        let data = vec![EmbeddingData {
            embedding: vec![1.0],
            index: None,
        }];
        let err = order_embeddings(data, 2).unwrap_err();
        assert_eq!(err.error_code(), "EMBEDDING_ERROR");
    }

    #[test]
    fn test_from_config_presets() {
        let config = EmbeddingConfig {
            provider: EmbeddingProvider::Voyage,
            api_key_env: Some("FAQ_SEARCH_TEST_UNSET_KEY".to_string()),
            ..Default::default()
        };
        let embedder = HttpEmbedder::from_config(&config).unwrap();
        assert_eq!(embedder.endpoint(), "https://api.voyageai.com/v1/embeddings");
        assert_eq!(embedder.model(), "voyage-2");

        let config = EmbeddingConfig {
            api_base: Some("http://localhost:8080/v1/".to_string()),
            model: Some("custom".to_string()),
            ..Default::default()
        };
        let embedder = HttpEmbedder::from_config(&config).unwrap();
        assert_eq!(embedder.endpoint(), "http://localhost:8080/v1/embeddings");
        assert_eq!(embedder.model(), "custom");
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let embedder = HttpEmbedder::new(
            "http://127.0.0.1:9",
            "m",
            None,
            4,
            Duration::from_millis(100),
        )
        .unwrap();
        assert!(embedder.embed_documents(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_embedding_error() {
        let embedder = HttpEmbedder::new(
            "http://127.0.0.1:9",
            "m",
            None,
            4,
            Duration::from_millis(500),
        )
        .unwrap();
        let err = embedder.embed_query("hello").await.unwrap_err();
        assert_eq!(err.error_code(), "EMBEDDING_ERROR");
    }
}
