//! Function call graph and vector index persistence.
//!
//! The store owns the full node/edge lifecycle of a corpus snapshot:
//!
//! 1. [`GraphStore::reset`] drops the vector index and every function node
//! 2. [`GraphStore::upsert_function`] writes each node with its embedding
//! 3. [`GraphStore::link_calls`] adds name-resolved CALLS edges
//! 4. [`GraphStore::create_vector_index`] rebuilds the similarity index
//!
//! After that the snapshot is read-only until the next reset.
//! [`GraphStore::similarity_search`] and [`GraphStore::callers_of`] serve
//! retrieval and may run concurrently.

mod index;
mod traits;

pub mod backends;

pub use index::{
    cosine_similarity, drop_index_statement, validate_index_name, SimilarityFunction,
    VectorIndexSpec, EMBEDDING_PROPERTY, FUNCTION_LABEL,
};
pub use traits::GraphStore;
