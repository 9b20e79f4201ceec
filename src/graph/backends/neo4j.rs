//! Neo4j backend using the `neo4rs` async driver.
//!
//! Requires Neo4j 5.x for native vector indexes
//! (`CREATE VECTOR INDEX`, `db.index.vector.queryNodes`).

use std::time::Duration;

use async_trait::async_trait;
use neo4rs::{query, Graph, Row};

use crate::config::Neo4jConfig;
use crate::error::AppError;
use crate::graph::index::{drop_index_statement, VectorIndexSpec};
use crate::graph::GraphStore;
use crate::models::{
    CallResolution, CorpusStats, FunctionEntity, FunctionKey, FunctionNode, ScoredFunction,
};

/// Seconds to wait for a freshly created vector index to come online.
const INDEX_ONLINE_TIMEOUT: Duration = Duration::from_secs(300);

/// Graph store backed by a Neo4j database.
pub struct Neo4jStore {
    graph: Graph,
    index_name: String,
}

impl Neo4jStore {
    /// Connects and verifies the server answers.
    ///
    /// An unreachable server is reported here rather than on the first write.
    pub async fn connect(config: &Neo4jConfig, index_name: &str) -> Result<Self, AppError> {
        // Fail fast on a name that can't be spliced into index DDL
        drop_index_statement(index_name)?;

        tracing::info!(uri = %config.uri, "Connecting to Neo4j");
        let graph = Graph::new(
            config.uri.as_str(),
            config.user.as_str(),
            config.password.as_deref().unwrap_or(""),
        )
        .await?;
        graph.run(query("RETURN 1")).await?;
        tracing::info!("Connected to Neo4j");

        Ok(Self::from_graph(graph, index_name))
    }

    /// Wraps an existing driver handle.
    pub fn from_graph(graph: Graph, index_name: &str) -> Self {
        Self {
            graph,
            index_name: index_name.to_string(),
        }
    }

    fn query_error(err: impl std::fmt::Display, query: &str) -> AppError {
        AppError::Query {
            message: err.to_string(),
            query: query.to_string(),
        }
    }

    fn row_to_node(row: &Row) -> Result<FunctionNode, AppError> {
        let name: String = row
            .get("name")
            .map_err(|e| Self::query_error(e, "get function name"))?;
        let filename: String = row
            .get("filename")
            .map_err(|e| Self::query_error(e, "get function filename"))?;

        Ok(FunctionNode {
            name,
            filename,
            docstring: row.get("docstring").unwrap_or_default(),
            code: row.get("code").unwrap_or_default(),
        })
    }

    async fn count(&self, cypher: &str, column: &str) -> Result<usize, AppError> {
        let mut result = self.graph.execute(query(cypher)).await?;
        let count: i64 = match result.next().await? {
            Some(row) => row.get(column).unwrap_or(0),
            None => 0,
        };
        Ok(count.max(0) as usize)
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn reset(&self) -> Result<(), AppError> {
        // Drop the index first so a dimension change can't conflict with it
        self.graph
            .run(query(&drop_index_statement(&self.index_name)?))
            .await?;
        self.graph
            .run(query("MATCH (f:Function) DETACH DELETE f"))
            .await?;
        Ok(())
    }

    async fn upsert_function(&self, function: &FunctionEntity) -> Result<(), AppError> {
        let embedding: Option<Vec<f64>> = function
            .embedding
            .as_ref()
            .map(|e| e.iter().map(|&v| v as f64).collect());

        let cypher = match embedding {
            Some(_) => {
                "MERGE (f:Function {name: $name, filename: $filename})
                 SET f.code = $code,
                     f.docstring = $docstring,
                     f.embedding = $embedding"
            }
            None => {
                "MERGE (f:Function {name: $name, filename: $filename})
                 SET f.code = $code,
                     f.docstring = $docstring
                 REMOVE f.embedding"
            }
        };

        let mut q = query(cypher)
            .param("name", function.name.as_str())
            .param("filename", function.filename.as_str())
            .param("code", function.code.as_str())
            .param("docstring", function.docstring.as_str());
        if let Some(embedding) = embedding {
            q = q.param("embedding", embedding);
        }

        self.graph.run(q).await?;
        Ok(())
    }

    async fn link_calls(&self, function: &FunctionEntity) -> Result<usize, AppError> {
        if function.calls.is_empty() {
            return Ok(0);
        }

        // One statement per caller: Neo4j runs it in its own transaction, so
        // the name match sees a single consistent snapshot.
        let mut result = self
            .graph
            .execute(
                query(
                    "MATCH (caller:Function {name: $caller_name, filename: $filename})
                     UNWIND $callees AS callee_name
                     MATCH (callee:Function {name: callee_name})
                     MERGE (caller)-[r:CALLS]->(callee)
                     ON CREATE SET r.resolution = $resolution
                     RETURN count(DISTINCT callee) AS linked",
                )
                .param("caller_name", function.name.as_str())
                .param("filename", function.filename.as_str())
                .param("callees", function.calls.clone())
                .param("resolution", CallResolution::NameOnly.as_str()),
            )
            .await?;

        let linked: i64 = match result.next().await? {
            Some(row) => row.get("linked").unwrap_or(0),
            None => 0,
        };
        Ok(linked.max(0) as usize)
    }

    async fn create_vector_index(&self, dimensions: usize) -> Result<(), AppError> {
        let spec = VectorIndexSpec::cosine(&self.index_name, dimensions)?;

        self.graph
            .run(query(&drop_index_statement(&spec.name)?))
            .await?;
        self.graph.run(query(&spec.create_statement())).await?;

        // Population is asynchronous; the index must be online before any
        // search runs against it.
        let timeout_secs = i64::try_from(INDEX_ONLINE_TIMEOUT.as_secs()).unwrap_or(i64::MAX);
        if let Err(e) = self
            .graph
            .run(
                query("CALL db.awaitIndex($name, $timeout)")
                    .param("name", spec.name.as_str())
                    .param("timeout", timeout_secs),
            )
            .await
        {
            tracing::error!(index = %spec.name, error = %e, "Vector index did not come online");
            return Err(AppError::Timeout {
                operation: "vector index population",
                after: INDEX_ONLINE_TIMEOUT,
            });
        }

        tracing::info!(index = %spec.name, dimensions, "Created vector index");
        Ok(())
    }

    async fn similarity_search(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredFunction>, AppError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let embedding: Vec<f64> = embedding.iter().map(|&v| v as f64).collect();

        let mut result = self
            .graph
            .execute(
                query(
                    "CALL db.index.vector.queryNodes($index, $k, $embedding)
                     YIELD node, score
                     RETURN node.name AS name,
                            node.filename AS filename,
                            node.docstring AS docstring,
                            node.code AS code,
                            score
                     ORDER BY score DESC",
                )
                .param("index", self.index_name.as_str())
                .param("k", k as i64)
                .param("embedding", embedding),
            )
            .await
            .map_err(|e| {
                let message = e.to_string();
                if message.contains("no such vector schema index")
                    || message.contains("There is no such index")
                {
                    AppError::IndexMissing(self.index_name.clone())
                } else {
                    AppError::Connection(e)
                }
            })?;

        let mut hits = Vec::new();
        while let Some(row) = result.next().await? {
            let score: f64 = row.get("score").unwrap_or(0.0);
            hits.push(ScoredFunction {
                function: Self::row_to_node(&row)?,
                score: score as f32,
            });
        }
        hits.truncate(k);
        Ok(hits)
    }

    async fn callers_of(&self, key: &FunctionKey) -> Result<Vec<String>, AppError> {
        let mut result = self
            .graph
            .execute(
                query(
                    "MATCH (caller:Function)-[:CALLS]->(f:Function {name: $name, filename: $filename})
                     RETURN DISTINCT caller.name AS name
                     ORDER BY name",
                )
                .param("name", key.name.as_str())
                .param("filename", key.filename.as_str()),
            )
            .await?;

        let mut callers = Vec::new();
        while let Some(row) = result.next().await? {
            let name: String = row
                .get("name")
                .map_err(|e| Self::query_error(e, "get caller name"))?;
            callers.push(name);
        }
        Ok(callers)
    }

    async fn stats(&self) -> Result<CorpusStats, AppError> {
        let functions = self
            .count("MATCH (f:Function) RETURN count(f) AS total", "total")
            .await?;
        let call_edges = self
            .count(
                "MATCH (:Function)-[r:CALLS]->(:Function) RETURN count(r) AS total",
                "total",
            )
            .await?;
        Ok(CorpusStats {
            functions,
            call_edges,
        })
    }
}
