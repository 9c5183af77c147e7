//! Type annotations: spans of exported identifiers referenced from a
//! declaration, used by renderers to hyperlink declaration text.

use tree_sitter::Node;

use crate::model::TypeAnnotation;
use crate::parse::{is_exported, node_text};

/// The syntax shapes the extractor distinguishes
#[derive(Debug, Clone, Copy)]
enum AnnotationNode<'t> {
    /// `type T ...`: only the type parameters and the type
    TypeSpec(Node<'t>),
    /// Function or method declaration: signature parts only, never the body
    FuncDecl(Node<'t>),
    /// Parameter, struct field or interface method: its type or signature
    Field(Node<'t>),
    /// const/var spec: the declared type, not the values
    ValueSpec(Node<'t>),
    /// Function literal: the signature only
    FuncLit(Node<'t>),
    /// Composite literal: the literal's type only
    CompositeLit(Node<'t>),
    Ident(Node<'t>),
    /// `pkg.Name`
    QualifiedIdent { node: Node<'t>, qualifier: Node<'t>, name: Node<'t> },
    /// Anything else: descend into every named child
    Other(Node<'t>),
}

impl<'t> AnnotationNode<'t> {
    fn classify(node: Node<'t>) -> Self {
        match node.kind() {
            "type_spec" | "type_alias" => AnnotationNode::TypeSpec(node),
            "function_declaration" | "method_declaration" => AnnotationNode::FuncDecl(node),
            "parameter_declaration"
            | "variadic_parameter_declaration"
            | "type_parameter_declaration"
            | "field_declaration"
            | "method_elem"
            | "method_spec" => AnnotationNode::Field(node),
            "const_spec" | "var_spec" => AnnotationNode::ValueSpec(node),
            "func_literal" => AnnotationNode::FuncLit(node),
            "composite_literal" => AnnotationNode::CompositeLit(node),
            "identifier" | "type_identifier" | "field_identifier" => AnnotationNode::Ident(node),
            "qualified_type" => match (
                node.child_by_field_name("package"),
                node.child_by_field_name("name"),
            ) {
                (Some(qualifier), Some(name)) => AnnotationNode::QualifiedIdent { node, qualifier, name },
                _ => AnnotationNode::Other(node),
            },
            "selector_expression" => match (
                node.child_by_field_name("operand"),
                node.child_by_field_name("field"),
            ) {
                (Some(qualifier), Some(name)) if qualifier.kind() == "identifier" => {
                    AnnotationNode::QualifiedIdent { node, qualifier, name }
                }
                _ => AnnotationNode::Other(node),
            },
            _ => AnnotationNode::Other(node),
        }
    }
}

struct Extractor<'s> {
    source: &'s str,
    /// Length of the wrapper text preceding the declaration
    offset: usize,
    annotations: Vec<TypeAnnotation>,
}

impl<'s> Extractor<'s> {
    fn visit(&mut self, node: Node<'_>) {
        match AnnotationNode::classify(node) {
            AnnotationNode::TypeSpec(n) => {
                self.visit_fields(n, &["type_parameters", "type"]);
            }
            AnnotationNode::FuncDecl(n) => {
                self.visit_fields(n, &["receiver", "type_parameters", "parameters", "result"]);
            }
            AnnotationNode::Field(n) => {
                if n.child_by_field_name("type").is_some() {
                    self.visit_fields(n, &["type"]);
                } else {
                    self.visit_fields(n, &["parameters", "result"]);
                }
            }
            AnnotationNode::ValueSpec(n) => self.visit_fields(n, &["type"]),
            AnnotationNode::FuncLit(n) => self.visit_fields(n, &["parameters", "result"]),
            AnnotationNode::CompositeLit(n) => self.visit_fields(n, &["type"]),
            AnnotationNode::Ident(n) => {
                let name = node_text(n, self.source);
                if is_exported(name) {
                    self.add(n, "", name);
                }
            }
            AnnotationNode::QualifiedIdent { node, qualifier, name } => {
                let name_text = node_text(name, self.source);
                if !is_exported(name_text) {
                    return;
                }
                let qualifier_text = node_text(qualifier, self.source);
                self.add(node, qualifier_text, name_text);
            }
            AnnotationNode::Other(n) => {
                let mut cursor = n.walk();
                for child in n.named_children(&mut cursor) {
                    self.visit(child);
                }
            }
        }
    }

    fn visit_fields(&mut self, node: Node<'_>, fields: &[&str]) {
        for field in fields {
            if let Some(child) = node.child_by_field_name(field) {
                self.visit(child);
            }
        }
    }

    fn add(&mut self, node: Node<'_>, qualifier: &str, name: &str) {
        self.annotations.push(TypeAnnotation {
            start: node.start_byte().saturating_sub(self.offset),
            end: node.end_byte().saturating_sub(self.offset),
            qualifier: qualifier.to_string(),
            name: name.to_string(),
        });
    }
}

/// Collect annotations below `root`, with offsets shifted back by `offset`
/// bytes and sorted by position.
pub fn annotations(root: Node<'_>, source: &str, offset: usize) -> Vec<TypeAnnotation> {
    let mut extractor = Extractor {
        source,
        offset,
        annotations: Vec::new(),
    };
    extractor.visit(root);
    let mut annotations = extractor.annotations;
    annotations.sort_by_key(|a| a.start);
    annotations
}
