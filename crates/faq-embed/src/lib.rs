//! faq-embed - embedding providers for FAQ search
//!
//! Three backends implement [`Embedder`]:
//!
//! - [`HttpEmbedder`]: OpenAI-compatible hosted APIs (OpenAI, Voyage)
//! - [`OnnxEmbedder`]: a local sentence-transformer model via ONNX Runtime
//! - [`NullEmbedder`]: zero vectors, for running without any model
//!
//! The provider is picked once at startup with [`embedder_from_config`].

mod http;
mod null;
mod onnx;

use std::sync::Arc;

use tracing::info;

pub use http::HttpEmbedder;
pub use null::NullEmbedder;
pub use onnx::OnnxEmbedder;

pub use faq_core::Embedder;
use faq_core::{EmbeddingConfig, EmbeddingProvider, Result};

/// Construct the embedder selected by `config.provider`.
pub fn embedder_from_config(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    info!(
        "Using embedding provider {} (model {})",
        config.provider,
        config.model_name()
    );

    let embedder: Arc<dyn Embedder> = match config.provider {
        EmbeddingProvider::OpenAi | EmbeddingProvider::Voyage => {
            Arc::new(HttpEmbedder::from_config(config)?)
        }
        EmbeddingProvider::Local => Arc::new(OnnxEmbedder::from_config(config)?),
        EmbeddingProvider::Null => Arc::new(NullEmbedder::new(config.dimension)),
    };
    Ok(embedder)
}
