//! Canonical source text rebuilt from a syntax tree.
//!
//! Layout comes from the tree alone: one statement per line, four spaces
//! per block level and fixed spacing between tokens. Comments are dropped
//! and string literals are copied byte for byte, so two layouts of the
//! same definition render to the same text.

use tree_sitter::Node;

const INDENT: &str = "    ";

/// Clauses that continue a compound statement on a new line at its depth.
const CLAUSES: &[&str] = &[
    "elif_clause",
    "else_clause",
    "except_clause",
    "except_group_clause",
    "finally_clause",
];

/// Renders `node` and everything below it.
pub(crate) fn canonical_source(node: Node<'_>, bytes: &[u8]) -> String {
    let mut writer = Writer {
        bytes,
        out: String::new(),
        indent: Some(0),
        last: None,
        glue: false,
    };
    writer.node(node, 0);
    writer.out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    /// Named leaf: identifier, number, keyword constant.
    Word,
    /// String literal.
    Literal,
    /// `)`, `]` or `}`.
    Close,
    Other,
}

struct Writer<'a> {
    bytes: &'a [u8],
    out: String,
    /// Depth of the line about to start, if the next token opens one.
    indent: Option<usize>,
    last: Option<Token>,
    /// The previous token binds to the next one.
    glue: bool,
}

impl Writer<'_> {
    fn node(&mut self, node: Node<'_>, depth: usize) {
        if node.is_extra() {
            return;
        }

        match node.kind() {
            "string" => self.token(node, Token::Literal),
            "block" | "decorated_definition" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.is_extra() {
                        continue;
                    }
                    self.line(depth);
                    self.node(child, depth);
                }
            }
            _ if node.child_count() == 0 => {
                let token = if node.is_named() {
                    Token::Word
                } else if matches!(node.kind(), ")" | "]" | "}") {
                    Token::Close
                } else {
                    Token::Other
                };
                self.token(node, token);
            }
            _ => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() == "block" {
                        self.node(child, depth + 1);
                    } else if CLAUSES.contains(&child.kind()) {
                        self.line(depth);
                        self.node(child, depth);
                    } else {
                        self.node(child, depth);
                    }
                }
            }
        }
    }

    fn line(&mut self, depth: usize) {
        if self.indent.is_none() {
            self.out.push('\n');
        }
        self.indent = Some(depth);
    }

    fn token(&mut self, node: Node<'_>, token: Token) {
        let Ok(text) = node.utf8_text(self.bytes) else {
            return;
        };
        if text.trim().is_empty() {
            return;
        }
        let parent = node.parent().map_or("", |p| p.kind());
        let operator = token == Token::Other;

        match self.indent.take() {
            Some(depth) => self.out.push_str(&INDENT.repeat(depth)),
            None if self.spaced(text, parent) => self.out.push(' '),
            None => {}
        }
        self.out.push_str(text);

        self.glue = match text {
            "(" | "[" | "{" | "." => operator,
            "=" => matches!(parent, "keyword_argument" | "default_parameter"),
            ":" => parent == "slice",
            "*" | "**" => operator && parent.contains("splat"),
            "@" => parent == "decorator",
            _ => operator && parent == "unary_operator",
        };
        self.last = Some(token);
    }

    fn spaced(&self, text: &str, parent: &str) -> bool {
        if self.glue {
            return false;
        }
        match text {
            ")" | "]" | "}" | "," | "." | ";" | ":" => false,
            "(" | "[" => !matches!(
                self.last,
                Some(Token::Word | Token::Literal | Token::Close)
            ),
            "=" => !matches!(parent, "keyword_argument" | "default_parameter"),
            _ => true,
        }
    }
}
