//! Extract declared targets from a parsed BUILD file

use super::starlark_parser::StarlarkAst;
use tree_sitter::{Node, TreeCursor};

/// A rule or macro call that declares a `name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCall {
    pub rule_type: String,
    pub name: String,
    pub line: usize,
}

/// Walks the AST collecting every call with a string `name` keyword argument
pub struct RuleExtractor;

impl RuleExtractor {
    pub fn extract_rules(ast: &StarlarkAst) -> Vec<RuleCall> {
        let mut rules = Vec::new();
        let mut cursor = ast.tree.walk();
        Self::visit_node(&mut cursor, ast, &mut rules);
        rules
    }

    fn visit_node(cursor: &mut TreeCursor, ast: &StarlarkAst, rules: &mut Vec<RuleCall>) {
        let node = cursor.node();

        if node.kind() == "call" {
            if let Some(rule) = Self::extract_rule_call(&node, ast) {
                rules.push(rule);
            }
        }

        if cursor.goto_first_child() {
            loop {
                Self::visit_node(cursor, ast, rules);
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
            cursor.goto_parent();
        }
    }

    fn extract_rule_call(node: &Node, ast: &StarlarkAst) -> Option<RuleCall> {
        let function_node = node.child_by_field_name("function")?;
        let rule_type = ast.node_text(&function_node);
        // `native.cc_library(...)` declares the same target as `cc_library(...)`
        let rule_type = rule_type.strip_prefix("native.").unwrap_or(rule_type);

        let arguments = node.child_by_field_name("arguments")?;
        let name = Self::name_argument(&arguments, ast)?;

        Some(RuleCall {
            rule_type: rule_type.to_string(),
            name,
            line: node.start_position().row + 1,
        })
    }

    fn name_argument(arguments: &Node, ast: &StarlarkAst) -> Option<String> {
        let mut cursor = arguments.walk();
        if !cursor.goto_first_child() {
            return None;
        }
        loop {
            let child = cursor.node();
            if child.kind() == "keyword_argument" {
                let name = child.child_by_field_name("name");
                let value = child.child_by_field_name("value");
                if let (Some(name), Some(value)) = (name, value) {
                    if ast.node_text(&name) == "name" {
                        return ast.string_value(&value);
                    }
                }
            }
            if !cursor.goto_next_sibling() {
                return None;
            }
        }
    }
}
