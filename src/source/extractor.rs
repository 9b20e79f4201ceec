//! Function-level extraction from Python source using tree-sitter.
//!
//! Every `function_definition` node in the tree becomes one
//! [`FunctionEntity`], including methods, nested functions and
//! `async def`. Only bare-identifier calls (`helper(x)`) are recorded;
//! attribute calls (`obj.helper(x)`) are not resolved.

use std::time::Duration;

use tree_sitter::{Language, Node, Parser};

use crate::error::AppError;
use crate::models::FunctionEntity;

use super::canonical::canonical_source;

const FUNCTION_DEFINITION: &str = "function_definition";
const DECORATED_DEFINITION: &str = "decorated_definition";

/// Tab stop used when measuring docstring indentation.
const TAB_WIDTH: usize = 8;

/// Parses source text into function records.
#[derive(Clone)]
pub struct FunctionExtractor {
    language: Language,
    timeout: Option<Duration>,
}

impl FunctionExtractor {
    /// Extractor for Python sources.
    pub fn python() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
            timeout: None,
        }
    }

    /// Gives up on any single parse that runs longer than `limit`.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Extractor for files with the given suffix.
    pub fn for_extension(extension: &str) -> Result<Self, AppError> {
        match extension.trim_start_matches('.') {
            "py" | "pyw" | "pyi" => Ok(Self::python()),
            other => Err(AppError::Validation(format!(
                "no grammar available for '.{other}' files"
            ))),
        }
    }

    /// Extracts every function defined in `source`, in source order.
    ///
    /// `filename` is the corpus-relative path recorded on each entity.
    /// Source with any syntax error, or whose parse outlives the timeout,
    /// yields [`AppError::Parse`] and no records at all.
    pub fn extract(&self, source: &str, filename: &str) -> Result<Vec<FunctionEntity>, AppError> {
        let parse_error = |message: String| AppError::Parse {
            path: filename.to_string(),
            message,
        };

        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| AppError::Validation(format!("grammar setup failed: {e}")))?;
        if let Some(limit) = self.timeout {
            parser.set_timeout_micros(u64::try_from(limit.as_micros()).unwrap_or(u64::MAX));
        }
        let tree = parser.parse(source, None).ok_or_else(|| match self.timeout {
            Some(limit) => parse_error(format!("parse timed out after {limit:?}")),
            None => parse_error("parser returned no tree".to_string()),
        })?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(parse_error(describe_syntax_error(root)));
        }

        let bytes = source.as_bytes();
        let mut functions = Vec::new();
        for node in preorder(root) {
            if node.kind() != FUNCTION_DEFINITION {
                continue;
            }
            let Some(name) = node
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(bytes).ok())
            else {
                continue;
            };

            // Decorators belong to the definition's source
            let span = match node.parent() {
                Some(parent) if parent.kind() == DECORATED_DEFINITION => parent,
                _ => node,
            };

            functions.push(FunctionEntity::new(
                name,
                filename,
                docstring(node, bytes),
                canonical_source(span, bytes),
                simple_calls(span, bytes),
            ));
        }

        tracing::debug!(path = %filename, count = functions.len(), "Extracted functions");
        Ok(functions)
    }
}

/// All nodes under `root` (inclusive) in document order.
fn preorder(root: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        out.push(node);
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    out
}

fn describe_syntax_error(root: Node<'_>) -> String {
    match preorder(root)
        .into_iter()
        .find(|n| n.is_error() || n.is_missing())
    {
        Some(node) => {
            let at = node.start_position();
            format!("syntax error at line {}, column {}", at.row + 1, at.column + 1)
        }
        None => "syntax error".to_string(),
    }
}

/// The cleaned docstring of a `function_definition`, or empty.
fn docstring(function: Node<'_>, bytes: &[u8]) -> String {
    let Some(body) = function.child_by_field_name("body") else {
        return String::new();
    };

    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|n| n.kind() != "comment");
    let Some(statement) = first.filter(|n| n.kind() == "expression_statement") else {
        return String::new();
    };
    if statement.named_child_count() != 1 {
        return String::new();
    }
    let Some(literal) = statement.named_child(0).filter(|n| n.kind() == "string") else {
        return String::new();
    };

    literal
        .utf8_text(bytes)
        .ok()
        .and_then(string_literal_body)
        .map(clean_docstring)
        .unwrap_or_default()
}

/// Body of a plain string literal. Byte and f-strings are not docstrings.
fn string_literal_body(literal: &str) -> Option<&str> {
    let quote_at = literal.find(['"', '\''])?;
    let prefix = literal[..quote_at].to_ascii_lowercase();
    if prefix.contains('b') || prefix.contains('f') {
        return None;
    }

    let quoted = &literal[quote_at..];
    for delim in ["\"\"\"", "'''", "\"", "'"] {
        if quoted.len() >= 2 * delim.len() && quoted.starts_with(delim) && quoted.ends_with(delim)
        {
            return Some(&quoted[delim.len()..quoted.len() - delim.len()]);
        }
    }
    None
}

/// Docstring cleanup: the first line is left-stripped, the common indentation
/// of the remaining lines is removed, and leading/trailing blank lines dropped.
fn clean_docstring(raw: &str) -> String {
    let lines: Vec<String> = raw.replace("\r\n", "\n").lines().map(expand_tabs).collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, l)| {
            if i == 0 {
                l.trim_start()
            } else {
                l.get(margin..).unwrap_or("")
            }
        })
        .collect();

    while cleaned.first().is_some_and(|l| l.trim().is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.trim().is_empty()) {
        cleaned.pop();
    }
    cleaned.join("\n")
}

fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = TAB_WIDTH - column % TAB_WIDTH;
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}

/// Names of bare-identifier callees, first occurrence order.
fn simple_calls(span: Node<'_>, bytes: &[u8]) -> Vec<String> {
    let mut calls: Vec<String> = Vec::new();
    for node in preorder(span) {
        if node.kind() != "call" {
            continue;
        }
        let Some(callee) = node
            .child_by_field_name("function")
            .filter(|f| f.kind() == "identifier")
            .and_then(|f| f.utf8_text(bytes).ok())
        else {
            continue;
        };
        if !calls.iter().any(|c| c == callee) {
            calls.push(callee.to_string());
        }
    }
    calls
}
