//! Backend implementations of [`GraphStore`](crate::graph::GraphStore).
//!
//! | Backend | Module | Use |
//! |---------|--------|-----|
//! | Neo4j 5.x | [`neo4j`] | Persistent corpus shared across runs |
//! | In-process | [`memory`] | Tests and single-process `ci` runs |
//!
//! # Implementing a Backend
//!
//! Any engine that can upsert a node by key, create an edge, delete all
//! nodes, create and query a cosine similarity index, and list inbound
//! neighbours can implement the trait. Each method must be atomic on its own.

pub mod memory;
pub mod neo4j;

pub use memory::{MemoryStore, StoredEdge, StoredFunction};
pub use neo4j::Neo4jStore;
