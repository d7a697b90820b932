//! Configuration types for FAQ search.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::error::{FaqError, Result};

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaqConfig {
    /// Corpus database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Embedding provider configuration.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Ranking configuration.
    #[serde(default)]
    pub search: SearchConfig,

    /// Tool server configuration.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite corpus file.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            busy_timeout_ms: 5000,
        }
    }
}

/// Which embedding backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI embeddings API.
    OpenAi,
    /// Voyage embeddings API.
    Voyage,
    /// Local ONNX sentence-transformer model.
    Local,
    /// Zero vectors; semantic scores are always 0.
    Null,
}

impl EmbeddingProvider {
    /// Default model name for the provider.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "text-embedding-3-small",
            Self::Voyage => "voyage-2",
            Self::Local => "all-MiniLM-L6-v2",
            Self::Null => "null",
        }
    }

    /// Default API base URL for hosted providers.
    pub fn default_api_base(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("https://api.openai.com/v1"),
            Self::Voyage => Some("https://api.voyageai.com/v1"),
            Self::Local | Self::Null => None,
        }
    }

    /// Environment variables that may hold the API key, in lookup order.
    ///
    /// Voyage keys are also accepted under `ANTHROPIC_API_KEY`, the name used
    /// by deployments that select the provider as `anthropic`.
    pub fn api_key_envs(&self) -> &'static [&'static str] {
        match self {
            Self::OpenAi => &["OPENAI_API_KEY"],
            Self::Voyage => &["VOYAGE_API_KEY", "ANTHROPIC_API_KEY"],
            Self::Local | Self::Null => &[],
        }
    }
}

impl FromStr for EmbeddingProvider {
    type Err = FaqError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "voyage" | "anthropic" => Ok(Self::Voyage),
            "local" | "onnx" => Ok(Self::Local),
            "null" | "none" | "dummy" => Ok(Self::Null),
            other => Err(FaqError::config(format!(
                "Unknown embedding provider '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::OpenAi => "openai",
            Self::Voyage => "voyage",
            Self::Local => "local",
            Self::Null => "null",
        };
        f.write_str(s)
    }
}

/// Embedding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Backend selection.
    #[serde(default = "default_provider")]
    pub provider: EmbeddingProvider,

    /// Model name (provider default if unset).
    #[serde(default)]
    pub model: Option<String>,

    /// Embedding dimension.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// API base URL override for hosted providers.
    #[serde(default)]
    pub api_base: Option<String>,

    /// Environment variable holding the API key (provider default if unset).
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Directory holding `model.onnx` and `tokenizer.json` for the local provider.
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Whether the local model takes a `token_type_ids` input.
    #[serde(default = "default_true")]
    pub token_type_ids: bool,

    /// Number of threads for CPU inference.
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

impl EmbeddingConfig {
    /// Effective model name.
    pub fn model_name(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// First non-empty API key found through `lookup`.
    ///
    /// `api_key_env` is tried before the provider's default variables.
    pub fn resolve_api_key<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.api_key_env
            .as_deref()
            .into_iter()
            .chain(self.provider.api_key_envs().iter().copied())
            .filter_map(|var| lookup(var))
            .find(|key| !key.is_empty())
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAi,
            model: None,
            dimension: 1536,
            api_base: None,
            api_key_env: None,
            request_timeout_secs: 30,
            model_path: default_model_path(),
            token_type_ids: true,
            num_threads: 4,
        }
    }
}

/// Ranking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Weight of the lexical score in hybrid fusion.
    #[serde(default = "default_lexical_weight")]
    pub lexical_weight: f32,

    /// Weight of the semantic score in hybrid fusion.
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f32,

    /// Default number of results.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Maximum number of results; larger requests are clamped.
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,

    /// Vocabulary cap for the lexical index.
    #[serde(default = "default_max_features")]
    pub max_features: usize,

    /// Upper bound on a single query embedding call.
    #[serde(default)]
    pub embed_timeout_ms: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            lexical_weight: 0.3,
            semantic_weight: 0.7,
            default_top_k: 3,
            max_top_k: 5,
            max_features: 1000,
            embed_timeout_ms: None,
        }
    }
}

/// Tool server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server name reported to clients.
    #[serde(default = "default_server_name")]
    pub name: String,

    /// Log level for binaries (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            log_level: default_log_level(),
        }
    }
}

// Default value functions

fn default_true() -> bool {
    true
}

fn default_busy_timeout() -> u32 {
    5000
}

fn default_provider() -> EmbeddingProvider {
    EmbeddingProvider::OpenAi
}

fn default_dimension() -> usize {
    1536
}

fn default_request_timeout() -> u64 {
    30
}

fn default_num_threads() -> usize {
    4
}

fn default_lexical_weight() -> f32 {
    0.3
}

fn default_semantic_weight() -> f32 {
    0.7
}

fn default_top_k() -> usize {
    3
}

fn default_max_top_k() -> usize {
    5
}

fn default_max_features() -> usize {
    1000
}

fn default_server_name() -> String {
    "FAQ Search Server".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("faq-search")
        .join("faqs.db")
}

fn default_model_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("faq-search")
        .join("models")
        .join("all-MiniLM-L6-v2")
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| FaqError::config(format!("Invalid value for {}: {:?}", key, value)))
}

impl FaqConfig {
    /// Load configuration from file.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| FaqError::config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load configuration from default paths.
    pub fn load_default() -> Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("faq-search").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("faq-search.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Self::default())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup.
    ///
    /// An unknown `EMBEDDING_PROVIDER` selects the null embedder, so search
    /// runs lexical-only instead of refusing to start.
    /// `TFIDF_WEIGHT` and `EMBEDDING_WEIGHT` are accepted as aliases of the
    /// lexical and semantic weights; the explicit names win when both are set.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("FAQ_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(provider) = lookup("EMBEDDING_PROVIDER") {
            self.embedding.provider = provider.parse().unwrap_or_else(|e| {
                warn!("{}; falling back to the null embedder", e);
                EmbeddingProvider::Null
            });
        }
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            self.embedding.model = Some(model);
        }
        if let Some(dimension) = lookup("EMBEDDING_DIMENSION") {
            self.embedding.dimension = parse_var("EMBEDDING_DIMENSION", &dimension)?;
        }
        if let Some(base) = lookup("EMBEDDING_API_BASE") {
            self.embedding.api_base = Some(base);
        }

        for key in ["TFIDF_WEIGHT", "LEXICAL_WEIGHT"] {
            if let Some(weight) = lookup(key) {
                self.search.lexical_weight = parse_var(key, &weight)?;
            }
        }
        for key in ["EMBEDDING_WEIGHT", "SEMANTIC_WEIGHT"] {
            if let Some(weight) = lookup(key) {
                self.search.semantic_weight = parse_var(key, &weight)?;
            }
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            self.server.log_level = level.to_lowercase();
        }

        Ok(())
    }

    /// Check invariants the engine relies on.
    pub fn validate(&self) -> Result<()> {
        let search = &self.search;
        let invalid = |w: f32| w.is_nan() || w < 0.0;
        if invalid(search.lexical_weight) || invalid(search.semantic_weight) {
            return Err(FaqError::config(
                "search weights must be non-negative numbers",
            ));
        }
        if search.max_top_k == 0 {
            return Err(FaqError::config("search.max_top_k must be at least 1"));
        }
        if search.default_top_k == 0 || search.default_top_k > search.max_top_k {
            return Err(FaqError::config(format!(
                "search.default_top_k must be between 1 and {}",
                search.max_top_k
            )));
        }
        if search.max_features == 0 {
            return Err(FaqError::config("search.max_features must be at least 1"));
        }
        if self.embedding.dimension == 0 {
            return Err(FaqError::config("embedding.dimension must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = FaqConfig::default();
        assert_eq!(config.search.default_top_k, 3);
        assert_eq!(config.search.max_top_k, 5);
        assert_eq!(config.search.max_features, 1000);
        assert!((config.search.lexical_weight - 0.3).abs() < f32::EPSILON);
        assert!((config.search.semantic_weight - 0.7).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config: FaqConfig = toml::from_str(
            r#"
            [embedding]
            provider = "local"
            dimension = 384

            [search]
            semantic_weight = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.embedding.provider, EmbeddingProvider::Local);
        assert_eq!(config.embedding.model_name(), "all-MiniLM-L6-v2");
        assert_eq!(config.embedding.dimension, 384);
        assert!((config.search.semantic_weight - 0.5).abs() < f32::EPSILON);
        assert!((config.search.lexical_weight - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nlog_level = \"debug\"\n").unwrap();

        let config = FaqConfig::load(&path).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.server.name, "FAQ Search Server");
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[search\nmax_top_k = ").unwrap();

        let err = FaqConfig::load(&path).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("EMBEDDING_PROVIDER", "voyage"),
            ("TFIDF_WEIGHT", "0.4"),
            ("SEMANTIC_WEIGHT", "0.6"),
            ("LOG_LEVEL", "DEBUG"),
        ]
        .into_iter()
        .collect();

        let mut config = FaqConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.embedding.provider, EmbeddingProvider::Voyage);
        assert_eq!(config.embedding.model_name(), "voyage-2");
        assert!((config.search.lexical_weight - 0.4).abs() < f32::EPSILON);
        assert!((config.search.semantic_weight - 0.6).abs() < f32::EPSILON);
        assert_eq!(config.server.log_level, "debug");
    }

    #[test]
    fn test_override_rejects_garbage() {
        let mut config = FaqConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "EMBEDDING_WEIGHT").then(|| "heavy".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_provider_override_falls_back_to_null() {
        let mut config = FaqConfig::default();
        config
            .apply_overrides(|key| (key == "EMBEDDING_PROVIDER").then(|| "word2vec".to_string()))
            .unwrap();
        assert_eq!(config.embedding.provider, EmbeddingProvider::Null);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_anthropic_provider_reads_anthropic_key() {
        let mut config = FaqConfig::default();
        config
            .apply_overrides(|key| (key == "EMBEDDING_PROVIDER").then(|| "anthropic".to_string()))
            .unwrap();
        assert_eq!(config.embedding.provider, EmbeddingProvider::Voyage);

        let only_anthropic: HashMap<&str, &str> =
            [("ANTHROPIC_API_KEY", "sk-ant")].into_iter().collect();
        let key = config
            .embedding
            .resolve_api_key(|var| only_anthropic.get(var).map(|v| v.to_string()));
        assert_eq!(key.as_deref(), Some("sk-ant"));

        let both: HashMap<&str, &str> = [("ANTHROPIC_API_KEY", "sk-ant"), ("VOYAGE_API_KEY", "pa-voy")]
            .into_iter()
            .collect();
        let key = config
            .embedding
            .resolve_api_key(|var| both.get(var).map(|v| v.to_string()));
        assert_eq!(key.as_deref(), Some("pa-voy"));
    }

    #[test]
    fn test_api_key_resolution_order() {
        let vars: HashMap<&str, &str> = [
            ("MY_KEY", ""),
            ("OPENAI_API_KEY", "sk-openai"),
            ("CUSTOM_KEY", "sk-custom"),
        ]
        .into_iter()
        .collect();
        let lookup = |var: &str| vars.get(var).map(|v| v.to_string());

        let mut config = EmbeddingConfig::default();
        assert_eq!(config.resolve_api_key(lookup).as_deref(), Some("sk-openai"));

        config.api_key_env = Some("CUSTOM_KEY".to_string());
        assert_eq!(config.resolve_api_key(lookup).as_deref(), Some("sk-custom"));

        // Empty values are skipped
        config.api_key_env = Some("MY_KEY".to_string());
        assert_eq!(config.resolve_api_key(lookup).as_deref(), Some("sk-openai"));

        config.provider = EmbeddingProvider::Null;
        config.api_key_env = None;
        assert_eq!(config.resolve_api_key(lookup), None);
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!(
            "OpenAI".parse::<EmbeddingProvider>().unwrap(),
            EmbeddingProvider::OpenAi
        );
        assert_eq!(
            "dummy".parse::<EmbeddingProvider>().unwrap(),
            EmbeddingProvider::Null
        );
        assert!("word2vec".parse::<EmbeddingProvider>().is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = FaqConfig::default();
        config.search.default_top_k = 6;
        assert!(config.validate().is_err());

        let mut config = FaqConfig::default();
        config.search.lexical_weight = -0.1;
        assert!(config.validate().is_err());

        let mut config = FaqConfig::default();
        config.search.max_features = 0;
        assert!(config.validate().is_err());
    }
}
