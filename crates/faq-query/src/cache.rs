//! Lazily loaded, load-once corpus cache.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use faq_core::{Corpus, CorpusSource};

/// Holds the corpus once a fetch has succeeded.
///
/// Concurrent first callers are serialised by the cell, so at most one fetch
/// is in flight. A failed or empty fetch leaves the cell empty and the next
/// `load` tries again.
pub struct CorpusCache<S: ?Sized> {
    source: Arc<S>,
    cell: OnceCell<Arc<Corpus>>,
}

impl<S> CorpusCache<S>
where
    S: CorpusSource + ?Sized,
{
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            cell: OnceCell::new(),
        }
    }

    /// Return the cached corpus, fetching it first if needed.
    ///
    /// Returns an empty corpus while the source is unavailable.
    pub async fn load(&self) -> Arc<Corpus> {
        let loaded = self
            .cell
            .get_or_try_init(|| async {
                let name = self.source.name();
                match self.source.fetch_all().await {
                    Ok(records) if records.is_empty() => {
                        warn!("Corpus source {} returned no records", name);
                        Err(())
                    }
                    Ok(records) => {
                        info!("Loaded {} FAQs from {}", records.len(), name);
                        Ok(Arc::new(Corpus::new(records)))
                    }
                    Err(e) => {
                        error!("Failed to load FAQs from {}: {}", name, e);
                        Err(())
                    }
                }
            })
            .await;

        match loaded {
            Ok(corpus) => Arc::clone(corpus),
            Err(()) => Arc::new(Corpus::default()),
        }
    }

    /// The cached corpus, without triggering a fetch.
    pub fn get(&self) -> Option<Arc<Corpus>> {
        self.cell.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}
