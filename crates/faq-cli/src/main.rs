//! FAQ CLI - Command-line interface for the hybrid FAQ search engine.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use faq_core::{CorpusSource, Embedder, FaqConfig, SearchResponse};
use faq_embed::embedder_from_config;
use faq_mcp::{FaqMcpServer, SearchParams};
use faq_store::{JsonFaqSource, SqliteFaqStore};

/// Records embedded per provider request during backfill.
const EMBED_BATCH_SIZE: usize = 32;

/// FAQ - hybrid keyword and semantic search over an FAQ corpus
#[derive(Parser)]
#[command(name = "faq")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: user config dir, then ./faq-search.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database path (overrides config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the FAQ corpus
    Search {
        /// The question to look up
        query: String,

        /// Number of results (clamped to the configured maximum)
        #[arg(short = 'k', long)]
        top_k: Option<i64>,

        /// Print the tool response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import FAQ records from a JSON array file
    Import {
        /// Path to the JSON file
        path: PathBuf,
    },

    /// Compute embeddings for records that have none
    Embed,

    /// Show corpus statistics
    Stats,

    /// Initialize the database
    Init,
}

fn load_config(cli: &Cli) -> Result<FaqConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => FaqConfig::load(path)?,
        None => FaqConfig::load_default()?,
    };
    config.apply_env_overrides()?;
    if let Some(path) = &cli.database {
        config.database.path = path.clone();
    }
    config.validate()?;
    Ok(config)
}

fn setup_logging(verbose: bool, configured: &str) {
    let level = if verbose {
        Level::DEBUG
    } else {
        configured.parse().unwrap_or(Level::WARN)
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    setup_logging(cli.verbose, &config.server.log_level);

    match cli.command {
        Commands::Init => {
            init_database(&config)?;
        }
        Commands::Search {
            query,
            top_k,
            json,
        } => {
            let server = get_server(&config)?;
            let top_k = top_k.unwrap_or(config.search.default_top_k as i64);
            search(&server, &query, top_k, json).await;
        }
        Commands::Import { path } => {
            import(&config, &path).await?;
        }
        Commands::Embed => {
            embed(&config).await?;
        }
        Commands::Stats => {
            stats(&config)?;
        }
    }

    Ok(())
}

fn open_store(config: &FaqConfig) -> Result<SqliteFaqStore, Box<dyn std::error::Error>> {
    Ok(SqliteFaqStore::open_with_timeout(
        &config.database.path,
        config.database.busy_timeout_ms,
    )?)
}

fn init_database(config: &FaqConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;
    println!("Initialized database at: {}", store.path().display());
    Ok(())
}

fn get_server(config: &FaqConfig) -> Result<FaqMcpServer, Box<dyn std::error::Error>> {
    if !config.database.path.exists() {
        eprintln!(
            "Database {} does not exist. Run 'faq init' and 'faq import' first, or specify a path with -d.",
            config.database.path.display()
        );
        std::process::exit(1);
    }

    Ok(FaqMcpServer::new(config)?)
}

async fn search(server: &FaqMcpServer, query: &str, top_k: i64, json: bool) {
    if json {
        let result = server
            .search(SearchParams {
                query: query.to_string(),
                top_k,
            })
            .await;
        if result.success {
            println!("{}", result.message);
        } else {
            eprintln!("Error: {}", result.message);
            std::process::exit(1);
        }
        return;
    }

    if query.trim().is_empty() {
        eprintln!("Error: Query must not be empty.");
        std::process::exit(1);
    }

    let top_k = usize::try_from(top_k).unwrap_or(0);
    let response = server.engine().search_response(query.trim(), top_k).await;
    print!("{}", format_response(&response));
}

fn format_response(response: &SearchResponse) -> String {
    if response.results.is_empty() {
        return "No matching FAQs found.\n".to_string();
    }

    let mut output = format!(
        "Found {} results in {}ms ({}):\n\n",
        response.total_results, response.latency_ms, response.search_method
    );

    for (rank, result) in response.results.iter().enumerate() {
        output.push_str(&format!(
            "---\n[{}] {} / {} (score: {:.3}, lexical: {:.3}, semantic: {:.3})\n",
            rank + 1,
            result.question_id,
            result.category,
            result.similarity_score,
            result.lexical_score,
            result.semantic_score
        ));
        output.push_str(&format!("Q: {}\nA: {}\n\n", result.question, result.answer));
    }

    output
}

async fn import(config: &FaqConfig, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = JsonFaqSource::new(path);
    let records = source.fetch_all().await?;

    if records.is_empty() {
        println!("No FAQ records found in: {}", path.display());
        return Ok(());
    }

    let store = open_store(config)?;
    let inserted = store.insert_records(&records)?;
    let embedded = records.iter().filter(|r| r.embedding.is_some()).count();

    println!(
        "Imported {} FAQs ({} with embeddings) into {}",
        inserted,
        embedded,
        store.path().display()
    );
    if embedded < inserted {
        println!("Run 'faq embed' to compute the missing embeddings.");
    }

    Ok(())
}

async fn embed(config: &FaqConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;
    let missing = store.records_missing_embeddings()?;

    if missing.is_empty() {
        println!("All FAQs already have embeddings.");
        return Ok(());
    }

    let embedder = embedder_from_config(&config.embedding)?;
    println!(
        "Embedding {} FAQs with {} ({})...",
        missing.len(),
        config.embedding.provider,
        config.embedding.model_name()
    );

    let mut done = 0;
    for batch in missing.chunks(EMBED_BATCH_SIZE) {
        let texts: Vec<&str> = batch.iter().map(|(_, q)| q.as_str()).collect();
        let vectors = embedder.embed_documents(&texts).await?;

        let updates: Vec<(i64, Vec<f32>)> = batch
            .iter()
            .map(|(id, _)| *id)
            .zip(vectors)
            .collect();
        store.set_embeddings(&updates)?;

        done += updates.len();
        info!("Embedded {}/{}", done, missing.len());
    }

    println!("Complete: {} embeddings stored", done);
    Ok(())
}

fn stats(config: &FaqConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;
    let stats = store.stats()?;

    let mut output = format!("Statistics for {}:\n\n", store.path().display());
    output.push_str(&format!("- FAQs: {}\n", stats.records));
    output.push_str(&format!("- With embeddings: {}\n", stats.embedded));
    output.push_str(&format!("- Categories: {}\n", stats.categories));
    print!("{}", output);

    Ok(())
}
