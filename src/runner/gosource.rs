//! Go source scanning for magefile targets
//!
//! Builds a syntax tree with tree-sitter and walks the top-level declarations.
//! Nothing is compiled or executed; signatures are checked structurally.
//!
//! A target is an exported function (or an exported method on a namespace type)
//! whose parameters are empty or a single `context.Context`, and whose result
//! is absent or `error`.

use std::path::Path;

use tree_sitter::{Language, Node, Parser};

use crate::error::DiscoveryError;

/// A target-shaped declaration found in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    /// Top-level `func Name() error`
    Function { name: String, description: String },
    /// `func (Receiver) Name() error`
    Method {
        receiver: String,
        name: String,
        description: String,
    },
}

/// Declarations and namespace types from one source file, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFile {
    pub declarations: Vec<Declaration>,
    pub namespaces: Vec<String>,
}

/// Parse Go source text and collect target declarations
///
/// # Errors
/// * `DiscoveryError::Parse` - If the tree contains a syntax error
/// * `DiscoveryError::Grammar` - If the Go grammar cannot be loaded
pub fn parse_source(path: &Path, source: &str) -> Result<SourceFile, DiscoveryError> {
    let language: Language = tree_sitter_go::LANGUAGE.into();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| DiscoveryError::Grammar(e.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| DiscoveryError::Parse {
            path: path.to_path_buf(),
            line: 1,
            column: 1,
        })?;

    let root = tree.root_node();
    if root.has_error() {
        let position = first_error(root).unwrap_or(root).start_position();
        return Err(DiscoveryError::Parse {
            path: path.to_path_buf(),
            line: position.row + 1,
            column: position.column + 1,
        });
    }

    let src = source.as_bytes();
    let mut file = SourceFile::default();
    let mut cursor = root.walk();

    for node in root.named_children(&mut cursor) {
        match node.kind() {
            "function_declaration" => {
                let Some(name) = node.child_by_field_name("name").map(|n| text(n, src)) else {
                    continue;
                };
                if is_exported(name) && has_target_signature(node, src) {
                    file.declarations.push(Declaration::Function {
                        name: name.to_string(),
                        description: description(node, src),
                    });
                }
            }
            "method_declaration" => {
                let Some(name) = node.child_by_field_name("name").map(|n| text(n, src)) else {
                    continue;
                };
                let Some(receiver) = node
                    .child_by_field_name("receiver")
                    .and_then(|r| receiver_type(r, src))
                else {
                    continue;
                };
                if is_exported(name) && has_target_signature(node, src) {
                    file.declarations.push(Declaration::Method {
                        receiver: receiver.to_string(),
                        name: name.to_string(),
                        description: description(node, src),
                    });
                }
            }
            "type_declaration" => collect_namespaces(node, src, &mut file.namespaces),
            _ => {}
        }
    }

    tracing::debug!(
        "Parsed {}: {} target declarations, {} namespaces",
        path.display(),
        file.declarations.len(),
        file.namespaces.len()
    );

    Ok(file)
}

fn text<'a>(node: Node<'_>, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or_default()
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Deepest-first search for the first error or missing node
fn first_error<'t>(node: Node<'t>) -> Option<Node<'t>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

fn has_target_signature(decl: Node<'_>, src: &[u8]) -> bool {
    if decl.child_by_field_name("type_parameters").is_some() {
        return false;
    }
    let Some(params) = decl.child_by_field_name("parameters") else {
        return false;
    };
    accepts_parameters(params, src) && accepts_result(decl.child_by_field_name("result"), src)
}

/// Parameter declarations of a `parameter_list`, skipping comments
fn parameter_declarations<'t>(list: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = list.walk();
    list.named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect()
}

/// A single `parameter_declaration` of the given type, named or not
fn is_single_param_of(decl: Node<'_>, type_text: &str, src: &[u8]) -> bool {
    if decl.kind() != "parameter_declaration" {
        return false;
    }
    let mut cursor = decl.walk();
    if decl.children_by_field_name("name", &mut cursor).count() > 1 {
        return false;
    }
    decl.child_by_field_name("type")
        .is_some_and(|t| text(t, src) == type_text)
}

fn accepts_parameters(params: Node<'_>, src: &[u8]) -> bool {
    match parameter_declarations(params).as_slice() {
        [] => true,
        [only] => is_single_param_of(*only, "context.Context", src),
        _ => false,
    }
}

fn accepts_result(result: Option<Node<'_>>, src: &[u8]) -> bool {
    let Some(result) = result else {
        return true;
    };
    match result.kind() {
        "type_identifier" => text(result, src) == "error",
        "parameter_list" => matches!(
            parameter_declarations(result).as_slice(),
            [only] if is_single_param_of(*only, "error", src)
        ),
        _ => false,
    }
}

/// Receiver type name for `(T)`, `(t T)`, `(*T)` or `(t *T)`
fn receiver_type<'a>(receiver: Node<'_>, src: &'a [u8]) -> Option<&'a str> {
    let decls = parameter_declarations(receiver);
    let [decl] = decls.as_slice() else {
        return None;
    };
    let mut ty = decl.child_by_field_name("type")?;
    if ty.kind() == "pointer_type" {
        ty = ty.named_child(0)?;
    }
    (ty.kind() == "type_identifier").then(|| text(ty, src))
}

fn collect_namespaces(decl: Node<'_>, src: &[u8], namespaces: &mut Vec<String>) {
    let mut cursor = decl.walk();
    for spec in decl.named_children(&mut cursor) {
        if !matches!(spec.kind(), "type_spec" | "type_alias") {
            continue;
        }
        let (Some(name), Some(ty)) = (
            spec.child_by_field_name("name"),
            spec.child_by_field_name("type"),
        ) else {
            continue;
        };
        let name = text(name, src);
        if is_exported(name) && is_namespace_type(ty, src) {
            namespaces.push(name.to_string());
        }
    }
}

/// `mg.Namespace` or an empty `struct{}`
fn is_namespace_type(ty: Node<'_>, src: &[u8]) -> bool {
    match ty.kind() {
        "qualified_type" => ty
            .child_by_field_name("name")
            .is_some_and(|n| text(n, src) == "Namespace"),
        "struct_type" => {
            let mut cursor = ty.walk();
            let fields = ty
                .named_children(&mut cursor)
                .find(|n| n.kind() == "field_declaration_list");
            fields.is_some_and(|list| {
                let mut cursor = list.walk();
                let has_fields = list
                    .named_children(&mut cursor)
                    .any(|n| n.kind() == "field_declaration");
                !has_fields
            })
        }
        _ => false,
    }
}

/// Text of the `//` comment on the line directly above a declaration
fn description(decl: Node<'_>, src: &[u8]) -> String {
    let Some(prev) = decl.prev_named_sibling() else {
        return String::new();
    };
    if prev.kind() != "comment" || prev.end_position().row + 1 != decl.start_position().row {
        return String::new();
    }
    text(prev, src)
        .strip_prefix("//")
        .map(|c| c.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> SourceFile {
        parse_source(Path::new("magefile.go"), source).unwrap()
    }

    const SAMPLE: &str = r#"//go:build mage

package main

import (
	"context"
	"fmt"

	"github.com/magefile/mage/mg"
)

// Deploy deploys the application
func Deploy() error {
	fmt.Println("Deploying...")
	return nil
}

// Pipeline namespace
type Pipeline mg.Namespace

// CI runs the CI pipeline
func (Pipeline) CI() error {
	return nil
}

func (p *Pipeline) Release(ctx context.Context) (err error) {
	return nil
}

func Clean() {}

func helper() error { return nil }

func WithArgs(name string) error { return nil }

func TwoResults() (string, error) { return "", nil }
"#;

    #[test]
    fn test_parse_functions_and_methods() {
        let file = parse(SAMPLE);

        assert_eq!(file.namespaces, vec!["Pipeline"]);
        assert_eq!(
            file.declarations,
            vec![
                Declaration::Function {
                    name: "Deploy".to_string(),
                    description: "Deploy deploys the application".to_string(),
                },
                Declaration::Method {
                    receiver: "Pipeline".to_string(),
                    name: "CI".to_string(),
                    description: "CI runs the CI pipeline".to_string(),
                },
                Declaration::Method {
                    receiver: "Pipeline".to_string(),
                    name: "Release".to_string(),
                    description: String::new(),
                },
                Declaration::Function {
                    name: "Clean".to_string(),
                    description: String::new(),
                },
            ]
        );
    }

    #[test]
    fn test_empty_struct_is_namespace() {
        let file = parse("package main\n\ntype Build struct{}\n\ntype Config struct {\n\tName string\n}\n");
        assert_eq!(file.namespaces, vec!["Build"]);
    }

    #[test]
    fn test_grouped_type_declaration() {
        let file = parse(
            "package main\n\nimport \"github.com/magefile/mage/mg\"\n\ntype (\n\tTest mg.Namespace\n\tlint struct{}\n\tDocs struct{}\n)\n",
        );
        assert_eq!(file.namespaces, vec!["Test", "Docs"]);
    }

    #[test]
    fn test_description_requires_adjacent_comment() {
        let file = parse("package main\n\n// Detached comment\n\nfunc Build() error { return nil }\n");
        assert_eq!(
            file.declarations,
            vec![Declaration::Function {
                name: "Build".to_string(),
                description: String::new(),
            }]
        );
    }

    #[test]
    fn test_description_uses_nearest_line() {
        let file = parse("package main\n\n// First line\n// Second line\nfunc Build() error { return nil }\n");
        match &file.declarations[0] {
            Declaration::Function { description, .. } => assert_eq!(description, "Second line"),
            other => panic!("Expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_context_parameter_accepted() {
        let file = parse(
            "package main\n\nimport \"context\"\n\nfunc Up(ctx context.Context) error { return nil }\nfunc Down(context.Context) {}\n",
        );
        assert_eq!(file.declarations.len(), 2);
    }

    #[test]
    fn test_non_target_signatures_rejected() {
        let file = parse(
            "package main\n\nfunc A(a, b int) error { return nil }\nfunc B() string { return \"\" }\nfunc C[T any]() error { return nil }\nfunc D() (a, b error) { return nil, nil }\n",
        );
        assert!(file.declarations.is_empty());
    }

    #[test]
    fn test_unexported_method_skipped() {
        let file = parse("package main\n\ntype Build struct{}\n\nfunc (Build) linux() error { return nil }\n");
        assert!(file.declarations.is_empty());
        assert_eq!(file.namespaces, vec!["Build"]);
    }

    #[test]
    fn test_syntax_error_reports_position() {
        let err = parse_source(
            Path::new("magefile.go"),
            "package main\n\nfunc Broken( {\n",
        )
        .unwrap_err();

        match err {
            DiscoveryError::Parse { path, line, .. } => {
                assert_eq!(path, Path::new("magefile.go"));
                assert!(line >= 3);
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_package() {
        let file = parse("package main\n");
        assert!(file.declarations.is_empty());
        assert!(file.namespaces.is_empty());
    }
}
