//! Source parser: file text to syntax tree
//!
//! A tree with syntax errors is rejected as a `ParseFailure` so a single bad
//! file never aborts an indexing run.

use tree_sitter::{Node, Parser, Tree};

use super::languages;
use super::syntax::{end_line, start_line, SyntaxKind};
use crate::types::{Language, ParseFailure};

/// A comment token with its location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub start_line: u32,
    pub end_line: u32,
    pub start_byte: usize,
    pub end_byte: usize,
    pub text: String,
}

impl Comment {
    pub fn is_block(&self) -> bool {
        self.text.starts_with("/*")
    }
}

/// A successfully parsed file
pub struct ParsedSource<'a> {
    pub path: &'a str,
    pub content: &'a str,
    pub language: Language,
    pub tree: Tree,
    /// All comments in source order
    pub comments: Vec<Comment>,
}

impl<'a> ParsedSource<'a> {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }
}

/// Wraps a tree-sitter parser, switching grammars as needed
pub struct SourceParser {
    parser: Parser,
    current: Option<Language>,
}

impl SourceParser {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            current: None,
        }
    }

    pub fn parse<'a>(&mut self, path: &'a str, content: &'a str) -> Result<ParsedSource<'a>, ParseFailure> {
        let language = Language::from_path(path);
        let failure = |message: String| ParseFailure {
            path: path.to_string(),
            message,
        };

        if self.current != Some(language) {
            let Some(grammar) = languages::get_language(language) else {
                return Err(failure(format!("Unsupported language for {}", path)));
            };
            self.parser
                .set_language(&grammar)
                .map_err(|e| failure(format!("Failed to set parser language: {}", e)))?;
            self.current = Some(language);
        }

        let Some(tree) = self.parser.parse(content, None) else {
            return Err(failure("Parser produced no tree".to_string()));
        };

        let root = tree.root_node();
        if root.has_error() {
            let message = match first_error(root) {
                Some(node) if node.is_missing() => format!(
                    "missing {} at line {}, column {}",
                    node.kind(),
                    start_line(&node),
                    node.start_position().column
                ),
                Some(node) => format!(
                    "syntax error at line {}, column {}",
                    start_line(&node),
                    node.start_position().column
                ),
                None => "syntax error".to_string(),
            };
            return Err(failure(message));
        }

        let comments = collect_comments(&tree, content);
        Ok(ParsedSource {
            path,
            content,
            language,
            tree,
            comments,
        })
    }
}

impl Default for SourceParser {
    fn default() -> Self {
        Self::new()
    }
}

/// First error or missing node in document order
fn first_error(root: Node) -> Option<Node> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        // Only descend into subtrees that contain the error
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

fn collect_comments(tree: &Tree, content: &str) -> Vec<Comment> {
    let mut comments = Vec::new();
    let mut cursor = tree.walk();
    loop {
        let node = cursor.node();
        if SyntaxKind::of(&node) == SyntaxKind::Comment {
            comments.push(Comment {
                start_line: start_line(&node),
                end_line: end_line(&node),
                start_byte: node.start_byte(),
                end_byte: node.end_byte(),
                text: content
                    .get(node.start_byte()..node.end_byte())
                    .unwrap_or("")
                    .to_string(),
            });
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return comments;
            }
        }
    }
}
