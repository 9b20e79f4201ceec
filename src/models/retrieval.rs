//! Query-time retrieval models. Never persisted.

use serde::{Deserialize, Serialize};

use super::FunctionNode;

/// A similarity hit from the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFunction {
    pub function: FunctionNode,
    /// Similarity score (0.0 to 1.0, higher is closer).
    pub score: f32,
}

/// A similarity hit enriched with its one-hop callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub function: FunctionNode,
    /// Similarity score (0.0 to 1.0, higher is closer).
    pub score: f32,
    /// Names of functions with a CALLS edge into this one.
    pub callers: Vec<String>,
}

impl RetrievalResult {
    /// Composite text block handed to the reasoning stage.
    ///
    /// The code excerpt is cut at `snippet_chars` characters. An empty caller
    /// list is rendered explicitly: "no known callers" is itself a signal
    /// (entry point or dead code).
    pub fn context_block(&self, snippet_chars: usize) -> String {
        let snippet: String = self.function.code.chars().take(snippet_chars).collect();
        let callers = if self.callers.is_empty() {
            "(none)".to_string()
        } else {
            self.callers.join(", ")
        };

        format!(
            "Function Name: {}\nFile: {}\nCode snippet: {}...\nCONTEXT - Callers (Who uses this?): {}",
            self.function.name, self.function.filename, snippet, callers
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(code: &str, callers: &[&str]) -> RetrievalResult {
        RetrievalResult {
            function: FunctionNode {
                name: "run_query".to_string(),
                filename: "db/raw.py".to_string(),
                docstring: String::new(),
                code: code.to_string(),
            },
            score: 0.9,
            callers: callers.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_context_block_lists_callers() {
        let block = result("def run_query(sql):\n    cursor.execute(sql)", &["index_view", "api_search"])
            .context_block(300);

        assert!(block.starts_with("Function Name: run_query\nFile: db/raw.py\n"));
        assert!(block.contains("cursor.execute(sql)..."));
        assert!(block.ends_with("CONTEXT - Callers (Who uses this?): index_view, api_search"));
    }

    #[test]
    fn test_context_block_truncates_on_char_boundary() {
        let code = "def f():\n    return 'ééééééééé'";
        let block = result(code, &[]).context_block(20);

        let expected: String = code.chars().take(20).collect();
        assert!(block.contains(&format!("Code snippet: {}...", expected)));
        assert!(block.ends_with("(none)"));
    }
}
