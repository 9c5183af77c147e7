//! Declaration printer
//!
//! Re-renders syntax nodes as normalized Go source: indentation is four
//! spaces per open bracket that ends a line, whitespace runs collapse to a
//! single space, statement semicolons at line ends are dropped and at most
//! one blank line survives. In declaration mode function bodies are left out
//! and unexported struct fields and interface methods are filtered, the way
//! documentation readers show them.

use std::borrow::Cow;
use std::collections::HashSet;

use tracing::warn;
use tree_sitter::{Node, Parser};

use crate::annotate;
use crate::error::CoreError;
use crate::model::Decl;
use crate::parse::{base_type_name, is_exported, new_parser};

/// Header that makes a printed declaration parse as a complete file
pub const PACKAGE_WRAPPER: &str = "package p\n";

const INDENT: &str = "    ";

/// Which parts of a node get printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    /// Exported surface only, no function bodies
    Declaration,
    /// Everything, verbatim structure
    Full,
}

#[derive(Debug)]
struct Token<'s> {
    text: Cow<'s, str>,
    start_row: usize,
    end_row: usize,
    /// Whitespace separated this token from the previous one in the source
    space_before: bool,
    /// Line breaks to emit before this token regardless of source rows
    force_break: Option<usize>,
}

struct Collector<'s> {
    source: &'s str,
    mode: PrintMode,
    tokens: Vec<Token<'s>>,
    last_end: Option<usize>,
    /// Nesting depth of value expressions and bodies, where nothing is filtered
    unfiltered: usize,
    skip: HashSet<usize>,
    /// A filtered node was just passed over
    after_skip: bool,
}

impl<'s> Collector<'s> {
    fn new(source: &'s str, mode: PrintMode) -> Self {
        Self {
            source,
            mode,
            tokens: Vec::new(),
            last_end: None,
            unfiltered: 0,
            skip: HashSet::new(),
            after_skip: false,
        }
    }

    fn filtering(&self) -> bool {
        self.mode == PrintMode::Declaration && self.unfiltered == 0
    }

    fn collect(&mut self, node: Node<'_>) -> Result<(), CoreError> {
        if node.is_missing() {
            return Ok(());
        }
        if self.skip.contains(&node.id()) {
            self.after_skip = true;
            return Ok(());
        }
        let kind = node.kind();
        if node.child_count() == 0 || is_atomic(kind) {
            return self.push_node(node);
        }

        if self.filtering() {
            match kind {
                "field_declaration_list" => return self.collect_members(node, "fields"),
                "interface_type" => return self.collect_members(node, "methods"),
                "const_declaration" | "var_declaration" | "var_spec_list" => self.mark_hidden_specs(node),
                _ => {}
            }
        }

        let opens_values = matches!(kind, "expression_list" | "block" | "literal_value");
        if opens_values {
            self.unfiltered += 1;
        }
        let mut cursor = node.walk();
        let mut result = Ok(());
        for child in node.children(&mut cursor) {
            result = self.collect(child);
            if result.is_err() {
                break;
            }
        }
        if opens_values {
            self.unfiltered -= 1;
        }
        result
    }

    /// Collect a struct field list or interface body, dropping unexported
    /// members and marking the gap.
    fn collect_members(&mut self, list: Node<'_>, what: &str) -> Result<(), CoreError> {
        let mut filtered = false;
        let mut cursor = list.walk();
        let children: Vec<Node<'_>> = list.children(&mut cursor).collect();

        for child in &children {
            if is_member(child.kind()) && !member_is_exported(*child, self.source) {
                filtered = true;
                self.skip.insert(child.id());
                self.skip_attached_comments(*child);
            }
        }

        for child in children {
            if child.kind() == "{" && filtered {
                self.collect(child)?;
                if let Some(open) = self.tokens.last_mut() {
                    open.space_before = true;
                }
                continue;
            }
            if child.kind() == "}" && filtered {
                let row = self.tokens.last().map_or(0, |t| t.end_row);
                self.tokens.push(Token {
                    text: Cow::Owned(format!("// contains filtered or unexported {}", what)),
                    start_row: row,
                    end_row: row,
                    space_before: true,
                    force_break: Some(1),
                });
                self.collect(child)?;
                if let Some(close) = self.tokens.last_mut() {
                    close.force_break = Some(1);
                }
                continue;
            }
            if child.kind() == "field_declaration" && self.filtering() && !self.skip.contains(&child.id()) {
                self.collect_field(child)?;
                continue;
            }
            self.collect(child)?;
        }
        Ok(())
    }

    /// Mark specs of a const/var group that declare no exported name
    fn mark_hidden_specs(&mut self, decl: Node<'_>) {
        let mut cursor = decl.walk();
        let specs: Vec<Node<'_>> = decl
            .named_children(&mut cursor)
            .filter(|n| matches!(n.kind(), "const_spec" | "var_spec"))
            .collect();
        for spec in specs {
            if !spec_is_exported(spec, self.source) {
                self.skip.insert(spec.id());
                self.skip_attached_comments(spec);
            }
        }
    }

    /// Mark the doc comment above and the comment trailing a dropped member
    fn skip_attached_comments(&mut self, member: Node<'_>) {
        let mut next_row = member.start_position().row;
        let mut prev = member.prev_named_sibling();
        while let Some(comment) = prev {
            if comment.kind() != "comment" || comment.end_position().row + 1 != next_row {
                break;
            }
            self.skip.insert(comment.id());
            next_row = comment.start_position().row;
            prev = comment.prev_named_sibling();
        }
        if let Some(next) = member.next_named_sibling() {
            if next.kind() == "comment" && next.start_position().row == member.end_position().row {
                self.skip.insert(next.id());
            }
        }
    }

    /// A struct field whose name list may need thinning: `A, b int` keeps `A int`
    fn collect_field(&mut self, field: Node<'_>) -> Result<(), CoreError> {
        let mut cursor = field.walk();
        let names: Vec<Node<'_>> = field.children_by_field_name("name", &mut cursor).collect();
        if names.iter().all(|n| is_exported(self.text(*n))) {
            return self.collect(field);
        }

        let name_ids: HashSet<usize> = names.iter().map(|n| n.id()).collect();
        let mut emitted = 0;
        let mut in_names = true;
        let mut cursor = field.walk();
        for child in field.children(&mut cursor) {
            if name_ids.contains(&child.id()) {
                if is_exported(self.text(child)) {
                    if emitted > 0 {
                        self.push_synthetic(",", false);
                    }
                    self.push_node(child)?;
                    emitted += 1;
                }
                continue;
            }
            if in_names && child.kind() == "," {
                continue;
            }
            in_names = false;
            self.collect(child)?;
        }
        Ok(())
    }

    fn text(&self, node: Node<'_>) -> &'s str {
        self.source.get(node.byte_range()).unwrap_or("")
    }

    fn push_node(&mut self, node: Node<'_>) -> Result<(), CoreError> {
        let text = node
            .utf8_text(self.source.as_bytes())
            .map_err(|e| CoreError::Print(format!("{} at byte {}", e, node.start_byte())))?;
        // statement terminators are re-derived from line structure
        if text.trim().is_empty() {
            return Ok(());
        }
        let text = if node.kind() == "comment" { text.trim_end() } else { text };

        let mut force_break = None;
        if self.after_skip {
            self.after_skip = false;
            if self
                .tokens
                .last()
                .is_some_and(|prev| node.start_position().row > prev.end_row)
            {
                force_break = Some(1);
            }
        }

        let space_before = match self.last_end {
            Some(end) => self
                .source
                .get(end..node.start_byte())
                .map_or(true, |gap| gap.chars().any(char::is_whitespace)),
            None => true,
        };
        self.tokens.push(Token {
            text: Cow::Borrowed(text),
            start_row: node.start_position().row,
            end_row: node.end_position().row,
            space_before,
            force_break,
        });
        self.last_end = Some(node.end_byte());
        Ok(())
    }

    fn push_synthetic(&mut self, text: &'static str, space_before: bool) {
        let row = self.tokens.last().map_or(0, |t| t.end_row);
        self.tokens.push(Token {
            text: Cow::Borrowed(text),
            start_row: row,
            end_row: row,
            space_before,
            force_break: None,
        });
    }

    fn finish(self) -> String {
        emit(drop_line_semicolons(self.tokens))
    }
}

fn is_atomic(kind: &str) -> bool {
    matches!(
        kind,
        "interpreted_string_literal" | "raw_string_literal" | "rune_literal" | "comment"
    )
}

fn is_member(kind: &str) -> bool {
    matches!(
        kind,
        "field_declaration" | "method_elem" | "method_spec" | "type_elem" | "constraint_elem"
    )
}

/// Whether a struct field or interface element survives export filtering
fn member_is_exported(member: Node<'_>, source: &str) -> bool {
    let text = |n: Node<'_>| source.get(n.byte_range()).unwrap_or("");
    match member.kind() {
        "field_declaration" => {
            let mut cursor = member.walk();
            let names: Vec<Node<'_>> = member.children_by_field_name("name", &mut cursor).collect();
            if names.is_empty() {
                // embedded field: visible when the embedded type is
                return member
                    .child_by_field_name("type")
                    .and_then(|t| base_type_name(t, source))
                    .map_or(true, |(name, _)| is_exported(name));
            }
            names.iter().any(|n| is_exported(text(*n)))
        }
        "method_elem" | "method_spec" => member
            .child_by_field_name("name")
            .map_or(true, |n| is_exported(text(n))),
        _ => {
            if member.named_child_count() != 1 {
                return true;
            }
            member
                .named_child(0)
                .and_then(|t| base_type_name(t, source))
                .map_or(true, |(name, _)| is_exported(name))
        }
    }
}

/// Whether a const or var spec declares at least one exported name
pub fn spec_is_exported(spec: Node<'_>, source: &str) -> bool {
    let mut cursor = spec.walk();
    let exported = spec
        .children_by_field_name("name", &mut cursor)
        .any(|n| is_exported(source.get(n.byte_range()).unwrap_or("")));
    exported
}

/// Drop `;` tokens that end a line; they only separated statements
fn drop_line_semicolons(tokens: Vec<Token<'_>>) -> Vec<Token<'_>> {
    let mut kept = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter().peekable();
    while let Some(tok) = iter.next() {
        if tok.text == ";" {
            let ends_line = iter
                .peek()
                .map_or(true, |next| next.force_break.is_some() || next.start_row > tok.end_row);
            if ends_line {
                continue;
            }
        }
        kept.push(tok);
    }
    kept
}

fn is_opener(text: &str) -> bool {
    matches!(text, "(" | "[" | "{")
}

fn is_closer(text: &str) -> bool {
    matches!(text, ")" | "]" | "}")
}

fn needs_space(prev: &Token<'_>, cur: &Token<'_>) -> bool {
    let (p, c) = (prev.text.as_ref(), cur.text.as_ref());
    if c.starts_with("//") || c.starts_with("/*") {
        return true;
    }
    if p == "," || p == ";" {
        return true;
    }
    if matches!(p, "(" | "[" | ".") || matches!(c, ")" | "]" | "," | ";" | ":" | "." | "++" | "--") {
        return false;
    }
    cur.space_before
}

/// Lay tokens out into lines
fn emit(tokens: Vec<Token<'_>>) -> String {
    let mut out = String::new();
    // one flag per open bracket: whether it raised the indentation level
    let mut stack: Vec<bool> = Vec::new();
    let mut line_openers: Vec<usize> = Vec::new();
    let mut level = 0usize;
    let mut at_line_start = true;
    let mut prev: Option<&Token<'_>> = None;

    for tok in &tokens {
        if let Some(p) = prev {
            let breaks = tok
                .force_break
                .unwrap_or_else(|| tok.start_row.saturating_sub(p.end_row).min(2));
            if breaks > 0 {
                if let Some(&idx) = line_openers.last() {
                    stack[idx] = true;
                    level += 1;
                }
                line_openers.clear();
                for _ in 0..breaks {
                    out.push('\n');
                }
                at_line_start = true;
            } else if needs_space(p, tok) {
                out.push(' ');
            }
        }

        if is_closer(&tok.text) {
            if let Some(raised) = stack.pop() {
                if line_openers.last() == Some(&stack.len()) {
                    line_openers.pop();
                }
                if raised {
                    level = level.saturating_sub(1);
                }
            }
        }
        if at_line_start {
            for _ in 0..level {
                out.push_str(INDENT);
            }
            at_line_start = false;
        }
        out.push_str(&tok.text);
        if is_opener(&tok.text) {
            stack.push(false);
            line_openers.push(stack.len() - 1);
        }
        prev = Some(tok);
    }
    out
}

/// Render a node as normalized source
pub fn print_node(node: Node<'_>, source: &str, mode: PrintMode) -> Result<String, CoreError> {
    let mut collector = Collector::new(source, mode);
    match node.kind() {
        // split out of a `type (...)` group, so the keyword is supplied here
        "type_spec" | "type_alias" => {
            collector.push_synthetic("type", false);
            collector.collect(node)?;
        }
        "function_declaration" | "method_declaration" if mode == PrintMode::Declaration => {
            let body = node.child_by_field_name("body").map(|b| b.id());
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if Some(child.id()) != body {
                    collector.collect(child)?;
                }
            }
        }
        _ => collector.collect(node)?,
    }
    Ok(collector.finish())
}

/// Prints declarations and annotates the printed text
pub struct DeclPrinter {
    parser: Parser,
}

impl DeclPrinter {
    pub fn new() -> Result<Self, CoreError> {
        Ok(Self {
            parser: new_parser()?,
        })
    }

    /// Print one declaration with its annotations.
    ///
    /// A printing failure degrades to the error message as text; a printed
    /// text that does not re-parse keeps no annotations.
    pub fn print_decl(&mut self, node: Node<'_>, source: &str) -> Decl {
        let text = match print_node(node, source, PrintMode::Declaration) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "declaration could not be printed");
                return Decl {
                    text: e.to_string(),
                    annotations: Vec::new(),
                };
            }
        };

        let wrapped = format!("{}{}", PACKAGE_WRAPPER, text);
        let annotations = match self.parser.parse(&wrapped, None) {
            Some(tree) if !tree.root_node().has_error() => {
                annotate::annotations(tree.root_node(), &wrapped, PACKAGE_WRAPPER.len())
            }
            _ => Vec::new(),
        };
        Decl { text, annotations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{parse_source, SourceFile};
    use std::path::Path;

    fn parse(src: &str) -> SourceFile {
        let mut parser = new_parser().unwrap();
        parse_source(&mut parser, Path::new("x.go"), src.to_string()).unwrap()
    }

    fn print_first(src: &str) -> String {
        let file = parse(src);
        let decl = file.declarations()[0];
        print_node(decl, &file.source, PrintMode::Declaration).unwrap()
    }

    #[test]
    fn test_function_body_is_dropped() {
        let text = print_first("package p\n\nfunc   Add(a,b int)   int {\n\treturn a+b\n}\n");
        assert_eq!(text, "func Add(a, b int) int");
    }

    #[test]
    fn test_method_signature() {
        let text = print_first("package p\n\nfunc (s *Server) Start( ctx Context ) error { return nil }\n");
        assert_eq!(text, "func (s *Server) Start(ctx Context) error");
    }

    #[test]
    fn test_struct_indentation_is_normalized() {
        let text = print_first("package p\n\ntype Config struct {\n\tName string\n\t\tPort   int `json:\"port\"`\n}\n");
        assert_eq!(text, "type Config struct {\n    Name string\n    Port int `json:\"port\"`\n}");
    }

    #[test]
    fn test_unexported_fields_are_filtered() {
        let src = "package p\n\ntype T struct {\n\tA int\n\t// hidden docs\n\tb string // trailing\n\tC, d bool\n}\n";
        let text = print_first(src);
        assert_eq!(
            text,
            "type T struct {\n    A int\n    C bool\n    // contains filtered or unexported fields\n}"
        );
    }

    #[test]
    fn test_single_line_struct_with_hidden_fields() {
        let text = print_first("package p\n\ntype T struct{ x int }\n");
        assert_eq!(text, "type T struct {\n    // contains filtered or unexported fields\n}");
    }

    #[test]
    fn test_unexported_interface_methods_are_filtered() {
        let src = "package p\n\ntype Handler interface {\n\tHandle() error\n\tclose()\n}\n";
        let text = print_first(src);
        assert_eq!(
            text,
            "type Handler interface {\n    Handle() error\n    // contains filtered or unexported methods\n}"
        );
    }

    #[test]
    fn test_const_group() {
        let src = "package p\n\nconst (\n\tA = iota\n\n\n\tB\n)\n";
        assert_eq!(print_first(src), "const (\n    A = iota\n\n    B\n)");
    }

    #[test]
    fn test_values_keep_unexported_literal_fields() {
        let src = "package p\n\nvar Default = struct{ name string }{name: \"x\"}\n";
        assert_eq!(print_first(src), "var Default = struct{ name string }{name: \"x\"}");
    }

    #[test]
    fn test_full_mode_keeps_body() {
        let file = parse("package p\n\nfunc Example() {\n\tx := 1; y := 2\n\tfmt.Println(x, y)\n\t// Output: 1 2\n}\n");
        let decl = file.declarations()[0];
        let body = decl.child_by_field_name("body").unwrap();
        let text = print_node(body, &file.source, PrintMode::Full).unwrap();
        assert_eq!(text, "{\n    x := 1; y := 2\n    fmt.Println(x, y)\n    // Output: 1 2\n}");
    }

    #[test]
    fn test_nested_closure_indentation() {
        let file = parse("package p\n\nfunc Example() {\n\trun(func() {\n\t\tstep()\n\t})\n}\n");
        let body = file.declarations()[0].child_by_field_name("body").unwrap();
        let text = print_node(body, &file.source, PrintMode::Full).unwrap();
        assert_eq!(text, "{\n    run(func() {\n        step()\n    })\n}");
    }

    #[test]
    fn test_printing_is_deterministic() {
        let src = "package p\n\n// Widget docs.\ntype Widget struct {\n\tParts []*Part\n\tcount int\n}\n";
        let file = parse(src);
        let decl = file.declarations()[0];
        let mut printer = DeclPrinter::new().unwrap();
        let first = printer.print_decl(decl, &file.source);
        let second = printer.print_decl(decl, &file.source);
        assert_eq!(first.text, second.text);
        assert_eq!(first.annotations, second.annotations);
    }

    #[test]
    fn test_print_decl_annotates_printed_text() {
        let file = parse("package p\n\nfunc F(x   Widget) *pkg.Gadget { return nil }\n");
        let mut printer = DeclPrinter::new().unwrap();
        let decl = printer.print_decl(file.declarations()[0], &file.source);
        assert_eq!(decl.text, "func F(x Widget) *pkg.Gadget");
        let spans: Vec<&str> = decl
            .annotations
            .iter()
            .map(|a| &decl.text[a.start..a.end])
            .collect();
        assert_eq!(spans, vec!["Widget", "pkg.Gadget"]);
    }
}
