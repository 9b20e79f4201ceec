//! In-process graph store.
//!
//! Holds one corpus snapshot behind a single `RwLock`: each write takes the
//! lock for its whole duration, so every operation sees a stable snapshot
//! and is atomic with respect to the others. Similarity search is a brute
//! force scan, which is fine for test corpora and small repositories.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::graph::index::{validate_index_name, VectorIndexSpec};
use crate::graph::GraphStore;
use crate::models::{
    CallResolution, CorpusStats, FunctionEntity, FunctionKey, FunctionNode, ScoredFunction,
};

/// A stored function node.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFunction {
    pub node: FunctionNode,
    pub embedding: Option<Vec<f32>>,
}

/// A stored CALLS edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StoredEdge {
    pub caller: FunctionKey,
    pub callee: FunctionKey,
}

#[derive(Default)]
struct Snapshot {
    nodes: BTreeMap<FunctionKey, StoredFunction>,
    edges: BTreeMap<StoredEdge, CallResolution>,
    index: Option<VectorIndexSpec>,
}

/// Graph store kept entirely in memory.
pub struct MemoryStore {
    index_name: String,
    snapshot: RwLock<Snapshot>,
}

impl MemoryStore {
    /// Creates an empty store whose vector index will be called `index_name`.
    pub fn new(index_name: &str) -> Result<Self, AppError> {
        validate_index_name(index_name)?;
        Ok(Self {
            index_name: index_name.to_string(),
            snapshot: RwLock::new(Snapshot::default()),
        })
    }

    /// All nodes, ordered by key.
    pub async fn nodes(&self) -> Vec<StoredFunction> {
        self.snapshot.read().await.nodes.values().cloned().collect()
    }

    /// All CALLS edges, ordered by (caller, callee).
    pub async fn edges(&self) -> Vec<StoredEdge> {
        self.snapshot.read().await.edges.keys().cloned().collect()
    }

    /// The current vector index, if one has been created.
    pub async fn vector_index(&self) -> Option<VectorIndexSpec> {
        self.snapshot.read().await.index.clone()
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn reset(&self) -> Result<(), AppError> {
        let mut snapshot = self.snapshot.write().await;
        *snapshot = Snapshot::default();
        Ok(())
    }

    async fn upsert_function(&self, function: &FunctionEntity) -> Result<(), AppError> {
        let mut snapshot = self.snapshot.write().await;
        snapshot.nodes.insert(
            function.key(),
            StoredFunction {
                node: FunctionNode::from(function),
                embedding: function.embedding.clone(),
            },
        );
        Ok(())
    }

    async fn link_calls(&self, function: &FunctionEntity) -> Result<usize, AppError> {
        let caller = function.key();
        let mut snapshot = self.snapshot.write().await;
        if !snapshot.nodes.contains_key(&caller) {
            return Ok(0);
        }

        let callees: Vec<FunctionKey> = snapshot
            .nodes
            .keys()
            .filter(|key| function.calls.iter().any(|name| *name == key.name))
            .cloned()
            .collect();

        for callee in callees {
            snapshot
                .edges
                .entry(StoredEdge {
                    caller: caller.clone(),
                    callee,
                })
                .or_insert(CallResolution::NameOnly);
        }

        Ok(snapshot.edges.keys().filter(|e| e.caller == caller).count())
    }

    async fn create_vector_index(&self, dimensions: usize) -> Result<(), AppError> {
        let spec = VectorIndexSpec::cosine(&self.index_name, dimensions)?;
        self.snapshot.write().await.index = Some(spec);
        Ok(())
    }

    async fn similarity_search(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredFunction>, AppError> {
        let snapshot = self.snapshot.read().await;
        let index = snapshot
            .index
            .as_ref()
            .ok_or_else(|| AppError::IndexMissing(self.index_name.clone()))?;

        if embedding.len() != index.dimensions {
            return Err(AppError::DimensionMismatch {
                expected: index.dimensions,
                actual: embedding.len(),
            });
        }

        let mut hits: Vec<ScoredFunction> = snapshot
            .nodes
            .values()
            .filter_map(|stored| {
                let vector = stored.embedding.as_deref()?;
                let score = index.score(embedding, vector)?;
                Some(ScoredFunction {
                    function: stored.node.clone(),
                    score,
                })
            })
            .collect();

        // Nodes are visited in key order, so a stable sort keeps ties deterministic
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }

    async fn callers_of(&self, key: &FunctionKey) -> Result<Vec<String>, AppError> {
        let snapshot = self.snapshot.read().await;
        let callers: BTreeSet<String> = snapshot
            .edges
            .keys()
            .filter(|edge| &edge.callee == key)
            .map(|edge| edge.caller.name.clone())
            .collect();
        Ok(callers.into_iter().collect())
    }

    async fn stats(&self) -> Result<CorpusStats, AppError> {
        let snapshot = self.snapshot.read().await;
        Ok(CorpusStats {
            functions: snapshot.nodes.len(),
            call_edges: snapshot.edges.len(),
        })
    }
}
