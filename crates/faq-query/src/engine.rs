//! Query engine for hybrid FAQ search.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use faq_core::{
    Corpus, CorpusSource, Embedder, RankedResult, SearchConfig, SearchMethod, SearchResponse,
};

use crate::cache::CorpusCache;
use crate::fusion::{select_top_k, weighted_fusion, FusionWeights};
use crate::lexical::LexicalIndexer;
use crate::semantic::{SemanticScorer, SemanticSignal};

/// Configuration for the query engine.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Fusion weights for hybrid ranking.
    pub weights: FusionWeights,

    /// Number of results when the caller does not say.
    pub default_top_k: usize,

    /// Upper bound for `top_k`; larger requests are clamped.
    pub max_top_k: usize,

    /// Vocabulary cap for the lexical index.
    pub max_features: usize,

    /// Upper bound on the query embedding call.
    pub embed_timeout: Option<Duration>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
            default_top_k: 3,
            max_top_k: 5,
            max_features: 1000,
            embed_timeout: None,
        }
    }
}

impl From<&SearchConfig> for QueryConfig {
    fn from(config: &SearchConfig) -> Self {
        Self {
            weights: FusionWeights {
                lexical: config.lexical_weight,
                semantic: config.semantic_weight,
            },
            default_top_k: config.default_top_k,
            max_top_k: config.max_top_k.max(1),
            max_features: config.max_features,
            embed_timeout: config.embed_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// Snapshot of what the engine has loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub records: usize,
    pub embedded: usize,
    pub vocabulary: usize,
}

/// Hybrid FAQ search engine.
///
/// Owns the corpus cache and lexical index for its lifetime. Both are built
/// lazily on first use; [`FaqEngine::initialize`] warms them up front.
pub struct FaqEngine<S: ?Sized, E: ?Sized> {
    cache: CorpusCache<S>,
    indexer: LexicalIndexer,
    semantic: SemanticScorer,
    embedder: Arc<E>,
    config: QueryConfig,
}

impl<S, E> FaqEngine<S, E>
where
    S: CorpusSource + ?Sized,
    E: Embedder + ?Sized,
{
    /// Create a new engine with default configuration.
    pub fn new(source: Arc<S>, embedder: Arc<E>) -> Self {
        Self::with_config(source, embedder, QueryConfig::default())
    }

    /// Create an engine with explicit configuration.
    ///
    /// A `max_top_k` of 0 is raised to 1.
    pub fn with_config(source: Arc<S>, embedder: Arc<E>, mut config: QueryConfig) -> Self {
        config.max_top_k = config.max_top_k.max(1);
        Self {
            cache: CorpusCache::new(source),
            indexer: LexicalIndexer::new(config.max_features),
            semantic: SemanticScorer::new(config.embed_timeout),
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Load the corpus and build the lexical index ahead of the first query.
    pub async fn initialize(&self) -> EngineStatus {
        info!("Initializing FAQ search engine...");
        let corpus = self.cache.load().await;
        let vocabulary = self
            .indexer
            .build(&corpus)
            .await
            .map_or(0, |index| index.vocabulary_size());

        let status = EngineStatus {
            records: corpus.len(),
            embedded: corpus.embedded_count(),
            vocabulary,
        };
        if status.embedded > 0 {
            info!(
                "Loaded {} FAQs ({} with embeddings)",
                status.records, status.embedded
            );
        } else {
            info!("Loaded {} FAQs (lexical only)", status.records);
        }
        status
    }

    /// Clamp a requested result count into `[1, max_top_k]`.
    pub fn clamp_top_k(&self, top_k: usize) -> usize {
        top_k.clamp(1, self.config.max_top_k.max(1))
    }

    /// Search with the configured default result count.
    pub async fn search_default(&self, query: &str) -> Vec<RankedResult> {
        self.search(query, self.config.default_top_k).await
    }

    /// Rank the corpus against `query`, returning at most `top_k` results.
    pub async fn search(&self, query: &str, top_k: usize) -> Vec<RankedResult> {
        self.rank(query, top_k).await.0
    }

    /// Like [`FaqEngine::search`], with the method and timing attached.
    pub async fn search_response(&self, query: &str, top_k: usize) -> SearchResponse {
        let start = Instant::now();
        let (results, search_method) = self.rank(query, top_k).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        info!(
            "Search completed in {}ms, returned {} results ({})",
            latency_ms,
            results.len(),
            search_method
        );

        SearchResponse {
            query: query.to_string(),
            total_results: results.len(),
            search_method,
            latency_ms,
            results,
        }
    }

    async fn rank(&self, query: &str, top_k: usize) -> (Vec<RankedResult>, SearchMethod) {
        let top_k = self.clamp_top_k(top_k);
        debug!("Searching for {:?} (top_k={})", query, top_k);

        let corpus = self.cache.load().await;
        if corpus.is_empty() {
            return (Vec::new(), SearchMethod::Lexical);
        }

        let lexical = self.indexer.score(&corpus, query).await;
        let semantic = self
            .semantic
            .score(&corpus, query, self.embedder.as_ref())
            .await;
        if let SemanticSignal::Unavailable(reason) = &semantic {
            debug!("Semantic signal unavailable: {}", reason);
        }

        let (combined, method) =
            weighted_fusion(&lexical, semantic.scores(), self.config.weights);
        let selected = select_top_k(&combined, top_k);

        let results = selected
            .into_iter()
            .filter_map(|i| {
                let record = corpus.get(i)?;
                Some(RankedResult {
                    question: record.question.clone(),
                    answer: record.answer.clone(),
                    question_id: record.question_id.clone(),
                    category: record.category.clone(),
                    similarity_score: combined[i],
                    lexical_score: lexical[i],
                    semantic_score: semantic.scores().map_or(0.0, |s| s[i]),
                    search_method: method,
                })
            })
            .collect();

        (results, method)
    }

    /// The cached corpus, if loaded.
    pub fn corpus(&self) -> Option<Arc<Corpus>> {
        self.cache.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_records, CountingSource, FixedEmbedder};
    use faq_core::FaqRecord;

    fn lexical_engine() -> (Arc<CountingSource>, FaqEngine<CountingSource, FixedEmbedder>) {
        let source = Arc::new(CountingSource::new(sample_records()));
        let engine = FaqEngine::new(source.clone(), Arc::new(FixedEmbedder::new(vec![1.0])));
        (source, engine)
    }

    fn embedded_records() -> Vec<FaqRecord> {
        vec![
            FaqRecord::new("Q1", "reg", "How do I register?", "Visit the portal")
                .with_embedding(vec![1.0, 0.0]),
            FaqRecord::new("Q2", "platform", "What is ViBe?", "Our LMS")
                .with_embedding(vec![0.0, 1.0]),
            FaqRecord::new("Q3", "attendance", "How is attendance tracked?", "Via ViBe"),
        ]
    }

    #[test]
    fn test_query_config_from_search_config() {
        let mut search = SearchConfig::default();
        search.embed_timeout_ms = Some(250);
        let config = QueryConfig::from(&search);
        assert_eq!(config.max_top_k, 5);
        assert_eq!(config.embed_timeout, Some(Duration::from_millis(250)));
        assert!((config.weights.semantic - 0.7).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_lexical_example() {
        let (_, engine) = lexical_engine();
        let results = engine.search("how to register", 1).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].question_id, "Q1");
        assert_eq!(results[0].search_method, SearchMethod::Lexical);
        assert_eq!(results[0].semantic_score, 0.0);
        assert_eq!(results[0].similarity_score, results[0].lexical_score);
    }

    #[tokio::test]
    async fn test_no_overlap_returns_nothing() {
        let (_, engine) = lexical_engine();
        assert!(engine.search("unrelated nonsense xyz", 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_corpus_fetched_once() {
        let (source, engine) = lexical_engine();
        engine.search("register", 3).await;
        engine.search("vibe", 3).await;
        engine.search_response("register vibe", 3).await;
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_top_k_is_clamped() {
        let (_, engine) = lexical_engine();
        assert_eq!(engine.clamp_top_k(0), 1);
        assert_eq!(engine.clamp_top_k(50), 5);
        assert_eq!(engine.search("register vibe", 0).await.len(), 1);
        assert_eq!(engine.search("register vibe", 50).await.len(), 2);
    }

    #[tokio::test]
    async fn test_hybrid_scores_are_weighted() {
        let source = Arc::new(CountingSource::new(embedded_records()));
        let embedder = Arc::new(FixedEmbedder::new(vec![0.0, 1.0]));
        let engine = FaqEngine::new(source, embedder.clone());

        let results = engine.search("what is vibe", 5).await;
        assert_eq!(embedder.calls(), 1);
        assert!(!results.is_empty());
        assert_eq!(results[0].question_id, "Q2");
        for r in &results {
            assert_eq!(r.search_method, SearchMethod::Hybrid);
            let expected = 0.3 * r.lexical_score + 0.7 * r.semantic_score;
            assert!((r.similarity_score - expected).abs() < 1e-5);
        }
        for pair in results.windows(2) {
            assert!(pair[0].similarity_score >= pair[1].similarity_score);
        }
    }

    #[tokio::test]
    async fn test_semantic_only_match_surfaces() {
        let source = Arc::new(CountingSource::new(embedded_records()));
        let engine = FaqEngine::new(source, Arc::new(FixedEmbedder::new(vec![1.0, 0.0])));

        let results = engine.search("sign up", 3).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].question_id, "Q1");
        assert_eq!(results[0].lexical_score, 0.0);
        assert!((results[0].similarity_score - 0.7).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_failing_embedder_degrades_to_lexical() {
        let source = Arc::new(CountingSource::new(embedded_records()));
        let engine = FaqEngine::new(source, Arc::new(FixedEmbedder::failing()));

        let response = engine.search_response("attendance", 3).await;
        assert_eq!(response.search_method, SearchMethod::Lexical);
        assert_eq!(response.total_results, 1);
        assert_eq!(response.results[0].question_id, "Q3");
        assert_eq!(response.results[0].semantic_score, 0.0);
    }

    #[tokio::test]
    async fn test_unavailable_source_returns_empty() {
        let source = Arc::new(CountingSource::failing());
        let engine = FaqEngine::new(source.clone(), Arc::new(FixedEmbedder::new(vec![1.0])));

        let response = engine.search_response("register", 3).await;
        assert!(response.results.is_empty());
        assert_eq!(response.search_method, SearchMethod::Lexical);
        assert!(engine.corpus().is_none());
    }

    #[tokio::test]
    async fn test_recovers_once_source_has_records() {
        let source = Arc::new(CountingSource::new(Vec::new()));
        let engine = FaqEngine::new(source.clone(), Arc::new(FixedEmbedder::new(vec![1.0])));

        assert!(engine.search("register", 3).await.is_empty());
        source.set_records(sample_records());
        assert_eq!(engine.search("register", 3).await.len(), 1);
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn test_repeated_search_is_stable() {
        let records = vec![
            FaqRecord::new("A", "x", "Exam schedule", ""),
            FaqRecord::new("B", "x", "Exam schedule", ""),
            FaqRecord::new("C", "x", "Exam results", ""),
        ];
        let source = Arc::new(CountingSource::new(records));
        let engine = FaqEngine::new(source, Arc::new(FixedEmbedder::new(vec![1.0])));

        let first = engine.search("exam schedule", 3).await;
        let second = engine.search("exam schedule", 3).await;
        assert_eq!(first, second);
        let ids: Vec<_> = first.iter().map(|r| r.question_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_initialize_reports_status() {
        let source = Arc::new(CountingSource::new(embedded_records()));
        let engine = FaqEngine::new(source.clone(), Arc::new(FixedEmbedder::new(vec![1.0, 0.0])));

        let status = engine.initialize().await;
        assert_eq!(status.records, 3);
        assert_eq!(status.embedded, 2);
        assert!(status.vocabulary > 0);

        engine.search("vibe", 3).await;
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_queries_share_one_load() {
        let source = Arc::new(CountingSource::new(sample_records()));
        let engine = Arc::new(FaqEngine::new(
            source.clone(),
            Arc::new(FixedEmbedder::new(vec![1.0])),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.search("register", 3).await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().len(), 1);
        }
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_queries_build_one_index() {
        let engine = Arc::new(FaqEngine::new(
            Arc::new(CountingSource::new(sample_records())),
            Arc::new(FixedEmbedder::new(vec![1.0])),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    engine.search("register", 3).await;
                    engine.indexer.get()
                })
            })
            .collect();

        let mut indexes = Vec::new();
        for handle in handles {
            indexes.push(handle.await.unwrap().unwrap());
        }
        assert!(indexes.iter().all(|index| Arc::ptr_eq(index, &indexes[0])));
    }

    #[tokio::test]
    async fn test_zero_max_top_k_still_returns_one() {
        let config = QueryConfig {
            max_top_k: 0,
            ..Default::default()
        };
        let engine = FaqEngine::with_config(
            Arc::new(CountingSource::new(sample_records())),
            Arc::new(FixedEmbedder::new(vec![1.0])),
            config,
        );

        assert_eq!(engine.config().max_top_k, 1);
        assert_eq!(engine.clamp_top_k(0), 1);
        assert_eq!(engine.clamp_top_k(3), 1);
        assert_eq!(engine.search("register vibe", 3).await.len(), 1);
    }
}
