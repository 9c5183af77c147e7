//! Go source parsing on top of tree-sitter
//!
//! Files are parsed one at a time; anything that fails to read or parse
//! cleanly is logged and skipped so a package with one broken file is still
//! documented.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::warn;
use tree_sitter::{Language, Node, Parser, Tree};
use tree_sitter_language::LanguageFn;

use crate::error::CoreError;

/// Suffix identifying Go test files
pub const TEST_SUFFIX: &str = "_test.go";

const GO_LANGUAGE: LanguageFn = tree_sitter_go::LANGUAGE;

/// The tree-sitter grammar for Go
pub fn go_language() -> Language {
    Language::from(GO_LANGUAGE)
}

/// Create a parser configured for Go
pub fn new_parser() -> Result<Parser, CoreError> {
    let mut parser = Parser::new();
    parser.set_language(&go_language())?;
    Ok(parser)
}

/// Whether an identifier is visible outside its package
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Whether a path names a test file
pub fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(TEST_SUFFIX))
}

/// A successfully parsed Go file
pub struct SourceFile {
    pub path: PathBuf,
    /// Name from the package clause
    pub package: String,
    pub source: String,
    pub tree: Tree,
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("path", &self.path)
            .field("package", &self.package)
            .finish()
    }
}

impl SourceFile {
    /// Root node of the syntax tree
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source text covered by a node
    pub fn text(&self, node: Node<'_>) -> &str {
        node_text(node, &self.source)
    }

    /// Base file name
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The package clause node
    pub fn package_clause(&self) -> Option<Node<'_>> {
        let root = self.root();
        let mut cursor = root.walk();
        let clause = root
            .named_children(&mut cursor)
            .find(|n| n.kind() == "package_clause");
        clause
    }

    /// Top-level declarations in source order
    pub fn declarations(&self) -> Vec<Node<'_>> {
        let root = self.root();
        let mut cursor = root.walk();
        let decls = root
            .named_children(&mut cursor)
            .filter(|n| {
                matches!(
                    n.kind(),
                    "function_declaration"
                        | "method_declaration"
                        | "type_declaration"
                        | "const_declaration"
                        | "var_declaration"
                )
            })
            .collect();
        decls
    }
}

/// Source text covered by a node, empty if the range is not valid UTF-8
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    source.get(node.byte_range()).unwrap_or("")
}

/// Parse one file's contents. Returns `None` when the file has syntax errors
/// or no package clause.
pub fn parse_source(parser: &mut Parser, path: &Path, source: String) -> Option<SourceFile> {
    let tree = parser.parse(&source, None)?;
    if tree.root_node().has_error() {
        return None;
    }
    let package = {
        let root = tree.root_node();
        let mut cursor = root.walk();
        let clause = root
            .named_children(&mut cursor)
            .find(|n| n.kind() == "package_clause")?;
        let mut clause_cursor = clause.walk();
        let ident = clause
            .named_children(&mut clause_cursor)
            .find(|n| n.kind() == "package_identifier")?;
        node_text(ident, &source).to_string()
    };
    Some(SourceFile {
        path: path.to_path_buf(),
        package,
        source,
        tree,
    })
}

/// Files of a directory grouped by package name
#[derive(Debug, Default)]
pub struct ParsedSources {
    /// Non-test files by package name
    pub packages: BTreeMap<String, Vec<SourceFile>>,
    /// Test files, any package
    pub tests: Vec<SourceFile>,
}

/// Parse a set of files, skipping the ones that cannot be read or parsed
pub fn parse_sources(paths: &[PathBuf]) -> Result<ParsedSources, CoreError> {
    let mut parser = new_parser()?;
    let mut sorted: Vec<&PathBuf> = paths.iter().collect();
    sorted.sort();

    let mut parsed = ParsedSources::default();
    for path in sorted {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };
        let Some(file) = parse_source(&mut parser, path, source) else {
            warn!(path = %path.display(), "skipping file with syntax errors");
            continue;
        };
        if is_test_file(path) {
            parsed.tests.push(file);
        } else {
            parsed
                .packages
                .entry(file.package.clone())
                .or_default()
                .push(file);
        }
    }
    Ok(parsed)
}

/// Pick the package to document when a directory holds several.
///
/// Preference: a name the import path ends with, then any name other than
/// `main`, then whatever is left.
pub fn select_package(import_path: &str, packages: &BTreeMap<String, Vec<SourceFile>>) -> Option<String> {
    let mut best: Option<(&String, u8)> = None;
    for name in packages.keys() {
        let score = if import_path.ends_with(name.as_str()) {
            3
        } else if name != "main" {
            2
        } else {
            1
        };
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((name, score));
        }
    }
    best.map(|(name, _)| name.clone())
}

/// Doc comment directly above a node: the run of adjacent comments ending on
/// the line before it.
pub fn doc_comment(node: Node<'_>, source: &str) -> String {
    let mut comments = Vec::new();
    let mut next_row = node.start_position().row;
    let mut current = node.prev_named_sibling();

    while let Some(prev) = current {
        if prev.kind() != "comment" || prev.end_position().row + 1 != next_row {
            break;
        }
        // a comment trailing code on the same line belongs to that code
        if let Some(before) = prev.prev_named_sibling() {
            if before.kind() != "comment" && before.end_position().row == prev.start_position().row {
                break;
            }
        }
        comments.push(node_text(prev, source));
        next_row = prev.start_position().row;
        current = prev.prev_named_sibling();
    }

    comments.reverse();
    comment_text(&comments)
}

/// Text of a comment group with the comment markers removed
pub fn comment_text(comments: &[&str]) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for comment in comments {
        if let Some(rest) = comment.strip_prefix("//") {
            if is_directive(rest) {
                continue;
            }
            lines.push(rest.strip_prefix(' ').unwrap_or(rest).trim_end());
        } else if let Some(body) = comment
            .strip_prefix("/*")
            .and_then(|c| c.strip_suffix("*/"))
        {
            lines.extend(body.split('\n').map(str::trim_end));
        }
    }

    let mut out: Vec<&str> = Vec::new();
    for line in lines {
        if line.is_empty() && out.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }

    if out.is_empty() {
        return String::new();
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

fn is_directive(comment: &str) -> bool {
    comment.starts_with("go:") || comment.starts_with("line ")
}

/// Name of the type an expression refers to, and whether it is imported.
/// Pointers, generics and parentheses are looked through.
pub fn base_type_name<'a>(node: Node<'_>, source: &'a str) -> Option<(&'a str, bool)> {
    match node.kind() {
        "type_identifier" | "identifier" => Some((node_text(node, source), false)),
        "qualified_type" => {
            let name = node.child_by_field_name("name")?;
            Some((node_text(name, source), true))
        }
        "generic_type" => base_type_name(node.child_by_field_name("type")?, source),
        "pointer_type" | "parenthesized_type" => base_type_name(node.named_child(0)?, source),
        _ => None,
    }
}
