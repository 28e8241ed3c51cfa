//! Starlark parser using tree-sitter-starlark

use crate::error::{Error, Result};
use tree_sitter::{Node, Parser, Tree};

/// Parser for hand-written BUILD files
pub struct StarlarkParser {
    parser: Parser,
}

impl StarlarkParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_starlark::LANGUAGE;
        parser
            .set_language(&language.into())
            .map_err(|e| Error::ParseError(format!("Failed to set Starlark language: {e}")))?;

        Ok(Self { parser })
    }

    /// Parse BUILD file content; syntax errors are reported, not recovered
    pub fn parse_build_file(&mut self, content: &str) -> Result<StarlarkAst> {
        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| Error::ParseError("Failed to parse BUILD file".to_string()))?;

        if tree.root_node().has_error() {
            return Err(Error::ParseError(
                "BUILD file contains syntax errors".to_string(),
            ));
        }

        Ok(StarlarkAst {
            tree,
            source: content.to_string(),
        })
    }
}

/// Parsed Starlark AST
pub struct StarlarkAst {
    pub tree: Tree,
    pub source: String,
}

impl StarlarkAst {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn node_text<'a>(&'a self, node: &Node) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// Value of a string literal node, quotes removed
    pub fn string_value(&self, node: &Node) -> Option<String> {
        if node.kind() != "string" {
            return None;
        }
        let text = self.node_text(node);
        let text = text.trim_start_matches(['r', 'b']);
        let inner = ["\"\"\"", "'''", "\"", "'"].iter().find_map(|quote| {
            text.strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
        })?;
        Some(inner.replace("\\\"", "\"").replace("\\'", "'"))
    }
}
