//! Core trait for the function graph store.
//!
//! A backend must offer six capabilities: upsert a node, create an edge,
//! delete everything, create a similarity index, query it, and list one-hop
//! neighbours. [`GraphStore`] expresses them in domain terms.

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{CorpusStats, FunctionEntity, FunctionKey, ScoredFunction};

/// Persistent graph of `Function` nodes joined by `CALLS` edges, plus the
/// vector index over their embeddings.
///
/// Every method is a single independent write or read. Implementations must
/// make each write atomic on its own, so concurrent callers never observe a
/// half-applied upsert or a partial edge set from one `link_calls`.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Drops the similarity index and deletes every function node and edge.
    ///
    /// Idempotent: safe to call on an empty store.
    async fn reset(&self) -> Result<(), AppError>;

    /// Creates or updates the node keyed by `(name, filename)`.
    ///
    /// Docstring, code and embedding are overwritten on every call.
    async fn upsert_function(&self, function: &FunctionEntity) -> Result<(), AppError>;

    /// Links `function` to every node whose name matches one of its callees,
    /// in any file. Returns the number of edges now present from this caller.
    ///
    /// Unresolved callees produce no edge. Name collisions produce one edge
    /// per matching node.
    async fn link_calls(&self, function: &FunctionEntity) -> Result<usize, AppError>;

    /// Drops and recreates the cosine similarity index with `dimensions`.
    async fn create_vector_index(&self, dimensions: usize) -> Result<(), AppError>;

    /// Top-`k` nodes by cosine similarity to `embedding`, best first.
    async fn similarity_search(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredFunction>, AppError>;

    /// Names of nodes with a CALLS edge into `key`, sorted and deduplicated.
    async fn callers_of(&self, key: &FunctionKey) -> Result<Vec<String>, AppError>;

    /// Node and edge counts of the current snapshot.
    async fn stats(&self) -> Result<CorpusStats, AppError>;
}
