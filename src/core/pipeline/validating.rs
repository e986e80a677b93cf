use crate::constants::PYTHON_GRAMMAR_ERR;

/// Tokens treated as evidence of unsafe intent. Scanned
/// case-insensitively, in declaration order; the first hit aborts
/// validation. This is a coarse deterrent, not a security boundary --
/// the sandbox's resource limits are the real one.
const DENYLIST: &[&str] = &[
    "import os",
    "import sys",
    "import subprocess",
    "import socket",
    "import urllib",
    "import requests",
    "import http",
    "import ftplib",
    "import smtplib",
    "import telnetlib",
    "import webbrowser",
    "from os",
    "from sys",
    "from subprocess",
    "from socket",
    "__import__",
    "getattr",
    "setattr",
    "delattr",
    "hasattr",
    "globals()",
    "locals()",
    "vars()",
    "dir()",
    "eval(",
    "exec(",
    "compile(",
    "open(",
    "file(",
    "input(",
    "raw_input(",
    "execfile(",
    "__builtins__",
    "__globals__",
    "__locals__",
];

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Code cannot be empty")]
    Empty,

    #[error("Unsafe operation detected: {token}")]
    UnsafeOperation { token: String },

    #[error("Syntax error in code: {message}")]
    Syntax { message: String },

    #[error("Code must contain a main() function")]
    MissingMain,

    #[error("main() function must have a return statement")]
    MissingReturn,
}

/// Static pre-execution screen of a submitted script.
///
/// Pure function of the input text, the fixed denylist, and the Python
/// grammar. Checks run in order: emptiness, denylist scan, syntax
/// parse, entry-point shape. Returned expression types are not
/// inspected; that is deferred to execution inside the wrapper.
pub fn validate(script: &str) -> Result<(), ValidationError> {
    if script.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    let lowered = script.to_lowercase();
    if let Some(token) = DENYLIST.iter().copied().find(|t| lowered.contains(t)) {
        return Err(ValidationError::UnsafeOperation {
            token: token.to_string(),
        });
    }

    let tree = parse_python(script)?;
    let root = tree.root_node();
    if let Some(node) = first_error_node(root) {
        return Err(ValidationError::Syntax {
            message: describe_error(node, script),
        });
    }

    let main_fn = find_function(root, script, "main").ok_or(ValidationError::MissingMain)?;
    if !contains_return(main_fn) {
        return Err(ValidationError::MissingReturn);
    }

    Ok(())
}

fn parse_python(source: &str) -> Result<tree_sitter::Tree, ValidationError> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .expect(PYTHON_GRAMMAR_ERR);

    parser.parse(source, None).ok_or(ValidationError::Syntax {
        message: "parsing failed".to_string(),
    })
}

/// Finds the first ERROR or MISSING node in document order.
/// Tree-sitter is error-tolerant, so a tree is produced even for
/// invalid input and has to be checked for error nodes explicitly.
fn first_error_node(node: tree_sitter::Node<'_>) -> Option<tree_sitter::Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error_node(child) {
            return Some(found);
        }
    }
    None
}

fn describe_error(node: tree_sitter::Node<'_>, source: &str) -> String {
    let start = node.start_position();
    let line = start.row + 1;
    let column = start.column + 1;

    if node.is_missing() {
        return format!("missing {} at line {}, column {}", node.kind(), line, column);
    }

    let context: String = source
        .get(node.byte_range())
        .map(|text| text.trim().chars().take(40).collect())
        .unwrap_or_default();
    if context.is_empty() {
        format!("invalid syntax at line {line}, column {column}")
    } else {
        format!("invalid syntax near {context:?} at line {line}, column {column}")
    }
}

/// Walks the whole tree for a function definition with the given name,
/// so nested definitions count the same way a full AST walk would.
fn find_function<'t>(
    node: tree_sitter::Node<'t>,
    source: &str,
    name: &str,
) -> Option<tree_sitter::Node<'t>> {
    if node.kind() == "function_definition" {
        let matches = node
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(source.as_bytes()).ok())
            .is_some_and(|text| text == name);
        if matches {
            return Some(node);
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = find_function(child, source, name) {
            return Some(found);
        }
    }
    None
}

fn contains_return(node: tree_sitter::Node<'_>) -> bool {
    if node.kind() == "return_statement" {
        return true;
    }

    let mut cursor = node.walk();
    node.children(&mut cursor).any(contains_return)
}
