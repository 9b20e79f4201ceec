//! Vector index definition and the similarity function it scores with.

use crate::error::AppError;

/// Node label carrying the embedding property.
pub const FUNCTION_LABEL: &str = "Function";

/// Property holding the embedding vector.
pub const EMBEDDING_PROPERTY: &str = "embedding";

/// Scoring function for the similarity index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityFunction {
    Cosine,
}

impl SimilarityFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityFunction::Cosine => "cosine",
        }
    }

    /// Score two vectors, normalized to `[0, 1]` the way Neo4j reports
    /// cosine scores (`(1 + cos) / 2`).
    ///
    /// Returns `None` on length mismatch or a zero-length vector.
    pub fn score(&self, a: &[f32], b: &[f32]) -> Option<f32> {
        match self {
            SimilarityFunction::Cosine => cosine_similarity(a, b).map(|c| (1.0 + c) / 2.0),
        }
    }
}

/// A similarity index over `Function.embedding`.
///
/// Derived and disposable: rebuilt at the end of every ingestion run, since
/// the embedding model (and so the dimension) may have changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorIndexSpec {
    pub name: String,
    pub dimensions: usize,
    pub similarity: SimilarityFunction,
}

impl VectorIndexSpec {
    /// A cosine index. Rejects names that can't be spliced into Cypher
    /// (index names are not parameterizable).
    pub fn cosine(name: &str, dimensions: usize) -> Result<Self, AppError> {
        validate_index_name(name)?;
        if dimensions == 0 {
            return Err(AppError::Validation(
                "vector index dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            dimensions,
            similarity: SimilarityFunction::Cosine,
        })
    }

    /// Cypher creating this index.
    pub fn create_statement(&self) -> String {
        format!(
            "CREATE VECTOR INDEX {name} IF NOT EXISTS
             FOR (f:{label}) ON (f.{property})
             OPTIONS {{indexConfig: {{`vector.dimensions`: {dims}, `vector.similarity_function`: '{sim}'}}}}",
            name = self.name,
            label = FUNCTION_LABEL,
            property = EMBEDDING_PROPERTY,
            dims = self.dimensions,
            sim = self.similarity.as_str(),
        )
    }

    /// Score a stored vector against a query, `None` when it doesn't fit
    /// this index.
    pub fn score(&self, query: &[f32], stored: &[f32]) -> Option<f32> {
        if stored.len() != self.dimensions {
            return None;
        }
        self.similarity.score(query, stored)
    }
}

/// Cypher dropping an index by name, tolerant of it not existing.
pub fn drop_index_statement(name: &str) -> Result<String, AppError> {
    validate_index_name(name)?;
    Ok(format!("DROP INDEX {} IF EXISTS", name))
}

/// Index names must be plain identifiers.
pub fn validate_index_name(name: &str) -> Result<(), AppError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "invalid vector index name '{}': use letters, digits and underscores",
            name
        )))
    }
}

/// Cosine similarity in `[-1, 1]`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f64, 0.0f64, 0.0f64), |(dot, na, nb), (&x, &y)| {
            let (x, y) = (x as f64, y as f64);
            (dot + x * y, na + x * x, nb + y * y)
        });

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some((dot / (norm_a.sqrt() * norm_b.sqrt())) as f32)
}
