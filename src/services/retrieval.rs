//! Contextual retrieval: similarity search plus one-hop caller context.

use crate::context::{AppEmbedder, AppStore, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::RetrievalResult;

/// Read-only query side of the corpus.
///
/// Holds no state between calls; any number of retrievals may run
/// concurrently against the same snapshot.
#[derive(FromContext, Clone)]
pub struct ContextualRetriever {
    store: AppStore,
    embedder: AppEmbedder,
}

impl ContextualRetriever {
    /// Up to `k` functions most similar to `topic`, best first, each with
    /// the names of its direct callers.
    pub async fn retrieve(&self, topic: &str, k: usize) -> Result<Vec<RetrievalResult>, AppError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed_query(topic).await?;
        let mut hits = self.store.similarity_search(&query, k).await?;
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);

        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            let callers = self.store.callers_of(&hit.function.key()).await?;
            results.push(RetrievalResult {
                function: hit.function,
                score: hit.score,
                callers,
            });
        }

        tracing::debug!(topic, k, found = results.len(), "Retrieved");
        Ok(results)
    }
}
