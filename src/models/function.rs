//! Function entity model: the unit of indexing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a function node within one corpus snapshot.
///
/// Two definitions with the same name in different files are distinct
/// nodes; two definitions with the same name in the same file collapse
/// into one carrying the later definition's source and the calls of both.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FunctionKey {
    /// Function name as written in the `def` statement.
    pub name: String,
    /// Corpus-relative path of the defining file.
    pub filename: String,
}

impl FunctionKey {
    pub fn new(name: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
        }
    }
}

impl fmt::Display for FunctionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.filename, self.name)
    }
}

/// A function definition extracted from a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionEntity {
    /// Function name.
    pub name: String,
    /// Corpus-relative path of the defining file.
    pub filename: String,
    /// Cleaned docstring, empty when the function has none.
    pub docstring: String,
    /// Canonical source of the definition, rebuilt from its syntax tree.
    pub code: String,
    /// Bare-identifier call targets in the body, first occurrence order.
    pub calls: Vec<String>,
    /// Vector embedding of [`FunctionEntity::text_representation`]
    /// (internal, not serialized).
    #[serde(skip_serializing, default)]
    pub embedding: Option<Vec<f32>>,
}

impl FunctionEntity {
    /// Creates an entity without an embedding.
    pub fn new(
        name: impl Into<String>,
        filename: impl Into<String>,
        docstring: impl Into<String>,
        code: impl Into<String>,
        calls: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            docstring: docstring.into(),
            code: code.into(),
            calls,
            embedding: None,
        }
    }

    /// The node key for this entity.
    pub fn key(&self) -> FunctionKey {
        FunctionKey::new(&self.name, &self.filename)
    }

    /// Text fed to the embedding model: name, docstring, then source.
    pub fn text_representation(&self) -> String {
        format!(
            "Function Name: {}\nDocstring: {}\nSource Code:\n{}",
            self.name, self.docstring, self.code
        )
    }
}

/// A function node as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionNode {
    pub name: String,
    pub filename: String,
    pub docstring: String,
    pub code: String,
}

impl FunctionNode {
    pub fn key(&self) -> FunctionKey {
        FunctionKey::new(&self.name, &self.filename)
    }
}

impl From<&FunctionEntity> for FunctionNode {
    fn from(entity: &FunctionEntity) -> Self {
        Self {
            name: entity.name.clone(),
            filename: entity.filename.clone(),
            docstring: entity.docstring.clone(),
            code: entity.code.clone(),
        }
    }
}

/// How a CALLS edge was resolved.
///
/// Only name matching exists today: the callee is every node carrying the
/// called identifier, in any file. Stored on each edge so consumers can tell
/// approximate links from symbol-resolved ones if those are added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallResolution {
    NameOnly,
}

impl CallResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallResolution::NameOnly => "name_only",
        }
    }
}

/// Node and edge counts of the current corpus snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub functions: usize,
    pub call_edges: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_representation_order() {
        let entity = FunctionEntity::new(
            "load_user",
            "app/models.py",
            "Load a user by id.",
            "def load_user(uid):\n    return db_get(uid)",
            vec!["db_get".to_string()],
        );

        assert_eq!(
            entity.text_representation(),
            "Function Name: load_user\nDocstring: Load a user by id.\nSource Code:\ndef load_user(uid):\n    return db_get(uid)"
        );
    }

    #[test]
    fn test_key_display() {
        let key = FunctionKey::new("run", "pkg/cli.py");
        assert_eq!(key.to_string(), "pkg/cli.py::run");
    }

    #[test]
    fn test_embedding_not_serialized() {
        let mut entity = FunctionEntity::new("f", "a.py", "", "def f(): pass", vec![]);
        entity.embedding = Some(vec![0.1, 0.2]);

        let json = serde_json::to_value(&entity).unwrap();
        assert!(json.get("embedding").is_none());
        assert_eq!(json["name"], "f");
    }
}
