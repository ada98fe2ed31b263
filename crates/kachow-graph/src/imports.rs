use kachow_core::KachowError;
use tree_sitter::{Node, Parser};

use crate::walker::Language;

/// Extract raw import references from a file's source text.
///
/// For Python, every import statement anywhere in the tree contributes:
/// - `import a.b, c as d` gives `a.b` and `c`;
/// - `from m import x, y as z` gives `m`, `m.x` and `m.y`;
/// - relative imports lose their leading dots (`from .m import x` gives `m`
///   and `m.x`); `from . import x` has no module and gives nothing;
/// - `from m import *` gives only `m`.
///
/// Languages without an import grammar return an empty list.
///
/// # Errors
///
/// Returns [`KachowError::Parse`] when the text is not valid Python: a syntax
/// error anywhere in the file or NUL bytes (binary content). Callers treat
/// this as "no imports" for that file.
///
/// # Examples
///
/// ```
/// use kachow_graph::imports::extract_imports;
/// use kachow_graph::walker::Language;
///
/// let refs = extract_imports("from app.core import config\n", Language::Python).unwrap();
/// assert_eq!(refs, vec!["app.core", "app.core.config"]);
///
/// assert!(extract_imports("def broken(:\n", Language::Python).is_err());
/// assert!(extract_imports("import x from 'y';", Language::JavaScript).unwrap().is_empty());
/// ```
pub fn extract_imports(content: &str, language: Language) -> Result<Vec<String>, KachowError> {
    let Some(ts_language) = language.tree_sitter_language() else {
        return Ok(Vec::new());
    };

    if content.contains('\0') {
        return Err(KachowError::Parse("source contains NUL bytes".into()));
    }

    let mut parser = Parser::new();
    parser
        .set_language(&ts_language)
        .map_err(|e| KachowError::Parse(format!("failed to set language: {e}")))?;

    let Some(tree) = parser.parse(content, None) else {
        return Err(KachowError::Parse("parser returned no tree".into()));
    };

    let root = tree.root_node();
    if root.has_error() {
        let line = first_error(root).map_or(1, |n| n.start_position().row + 1);
        return Err(KachowError::Parse(format!("syntax error near line {line}")));
    }

    let mut refs = Vec::new();
    collect_python_imports(root, content.as_bytes(), &mut refs);
    Ok(refs)
}

fn collect_python_imports(node: Node, source: &[u8], refs: &mut Vec<String>) {
    match node.kind() {
        "import_statement" => {
            let mut cursor = node.walk();
            for child in node.children_by_field_name("name", &mut cursor) {
                if let Some(name) = imported_name(child, source) {
                    refs.push(name);
                }
            }
            return;
        }
        "import_from_statement" => {
            let Some(module) = node
                .child_by_field_name("module_name")
                .map(|m| dotted_text(&m, source))
                .map(|m| m.trim_start_matches('.').to_string())
                .filter(|m| !m.is_empty())
            else {
                return;
            };
            push_from_import(node, &module, source, refs);
            return;
        }
        "future_import_statement" => {
            push_from_import(node, "__future__", source, refs);
            return;
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_python_imports(child, source, refs);
    }
}

fn push_from_import(node: Node, module: &str, source: &[u8], refs: &mut Vec<String>) {
    refs.push(module.to_string());
    let mut cursor = node.walk();
    for child in node.children_by_field_name("name", &mut cursor) {
        if let Some(name) = imported_name(child, source) {
            refs.push(format!("{module}.{name}"));
        }
    }
}

/// Name of a `dotted_name` or the `name` half of an `aliased_import`.
fn imported_name(node: Node, source: &[u8]) -> Option<String> {
    let target = if node.kind() == "aliased_import" {
        node.child_by_field_name("name")?
    } else {
        node
    };
    let text = dotted_text(&target, source);
    (!text.is_empty()).then_some(text)
}

/// Node text with interior whitespace removed (`a . b` becomes `a.b`).
fn dotted_text(node: &Node, source: &[u8]) -> String {
    node_text(node, source).split_whitespace().collect()
}

fn node_text(node: &Node, source: &[u8]) -> String {
    let start = node.start_byte();
    let end = node.end_byte();
    if start >= source.len() || end > source.len() {
        return String::new();
    }
    String::from_utf8_lossy(&source[start..end]).to_string()
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error())
        .find_map(first_error)
}
