//! FAQ search tool server.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use faq_core::{
    CorpusSource, Embedder, FaqConfig, FaqError, RankedResult, SearchMethod, SearchResponse,
};
use faq_embed::embedder_from_config;
use faq_query::{EngineStatus, FaqEngine, QueryConfig};
use faq_store::SqliteFaqStore;

type DynEngine = FaqEngine<dyn CorpusSource, dyn Embedder>;

/// FAQ tool server state.
pub struct FaqMcpServer {
    name: String,
    engine: Arc<DynEngine>,
}

/// Search request parameters.
#[derive(Debug, Deserialize, Serialize)]
pub struct SearchParams {
    /// The user's question.
    pub query: String,

    /// Number of results, clamped to 1..=5 (default: 3).
    #[serde(default = "default_top_k")]
    pub top_k: i64,
}

fn default_top_k() -> i64 {
    3
}

/// Tool result.
#[derive(Debug, Serialize)]
pub struct ToolResult {
    /// Whether the operation was successful.
    pub success: bool,

    /// Result message or content.
    pub message: String,
}

impl ToolResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Per-result metadata as returned to tool callers.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct FaqMetadata {
    pub question_id: String,
    pub category: String,
    pub similarity_score: f32,
    pub lexical_score: f32,
    pub semantic_score: f32,
    pub search_method: SearchMethod,
}

/// One FAQ hit as returned to tool callers.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct FaqResult {
    pub question: String,
    pub answer: String,
    pub metadata: FaqMetadata,
}

impl From<RankedResult> for FaqResult {
    fn from(result: RankedResult) -> Self {
        Self {
            question: result.question,
            answer: result.answer,
            metadata: FaqMetadata {
                question_id: result.question_id,
                category: result.category,
                similarity_score: result.similarity_score,
                lexical_score: result.lexical_score,
                semantic_score: result.semantic_score,
                search_method: result.search_method,
            },
        }
    }
}

/// Body of a successful `search_faq` call.
#[derive(Debug, Serialize, Deserialize)]
pub struct ToolResponse {
    pub results: Vec<FaqResult>,
    pub total_results: usize,
    pub search_method: SearchMethod,
}

impl From<SearchResponse> for ToolResponse {
    fn from(response: SearchResponse) -> Self {
        Self {
            total_results: response.total_results,
            search_method: response.search_method,
            results: response.results.into_iter().map(FaqResult::from).collect(),
        }
    }
}

impl FaqMcpServer {
    /// Create a server over the configured SQLite corpus and embedding provider.
    pub fn new(config: &FaqConfig) -> Result<Self, FaqError> {
        info!(
            "Initializing FAQ tool server with database at {:?}",
            config.database.path
        );

        let store: Arc<dyn CorpusSource> = Arc::new(SqliteFaqStore::open_with_timeout(
            &config.database.path,
            config.database.busy_timeout_ms,
        )?);
        let embedder = embedder_from_config(&config.embedding)?;

        Ok(Self::with_parts(
            config.server.name.clone(),
            store,
            embedder,
            QueryConfig::from(&config.search),
        ))
    }

    /// Create a server from already-constructed collaborators.
    pub fn with_parts(
        name: impl Into<String>,
        source: Arc<dyn CorpusSource>,
        embedder: Arc<dyn Embedder>,
        config: QueryConfig,
    ) -> Self {
        Self {
            name: name.into(),
            engine: Arc::new(FaqEngine::with_config(source, embedder, config)),
        }
    }

    /// Get the server info.
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            name: self.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Hybrid keyword and semantic search over an FAQ corpus".to_string(),
        }
    }

    /// List available tools.
    pub fn tools() -> Vec<ToolInfo> {
        vec![ToolInfo {
            name: "search_faq".to_string(),
            description: "Search the FAQ database for answers to user questions. \
                Combines keyword matching with semantic similarity. \
                Arguments: query (the user's question), top_k (1-5, default 3)."
                .to_string(),
        }]
    }

    /// Warm the corpus cache and lexical index before serving.
    pub async fn initialize(&self) -> EngineStatus {
        let status = self.engine.initialize().await;
        if status.records == 0 {
            warn!("No FAQs loaded; searches return nothing until the corpus is available");
        }
        info!("Initialization complete");
        status
    }

    /// Handle a `search_faq` call.
    pub async fn search(&self, params: SearchParams) -> ToolResult {
        let query = params.query.trim();
        if query.is_empty() {
            return ToolResult::error("Query must not be empty.");
        }
        info!("Searching for: {:?}", query);

        // Negative counts clamp up to 1 inside the engine
        let top_k = usize::try_from(params.top_k).unwrap_or(0);
        let response = ToolResponse::from(self.engine.search_response(query, top_k).await);

        match serde_json::to_string_pretty(&response) {
            Ok(body) => ToolResult::success(body),
            Err(e) => ToolResult::error(format!("Failed to encode results: {}", e)),
        }
    }

    pub fn engine(&self) -> &Arc<DynEngine> {
        &self.engine
    }
}

/// Server info.
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

/// Tool info.
#[derive(Debug, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}
