//! Example functions from test files
//!
//! `func ExampleFoo()` documents `Foo`, `func ExampleFoo_Bar()` documents
//! method `Bar` of `Foo`, `func Example()` documents the package. A trailing
//! lowercase suffix (`ExampleFoo_second`) only distinguishes samples.

use std::sync::OnceLock;

use regex::Regex;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor};

use crate::error::CoreError;
use crate::model::Example;
use crate::parse::{comment_text, doc_comment, go_language, node_text, SourceFile};
use crate::printer::{print_node, PrintMode};

const EXAMPLE_PREFIX: &str = "Example";

const EXAMPLE_QUERY: &str = r#"
(function_declaration
  name: (identifier) @name
  parameters: (parameter_list) @params
  body: (block) @body) @definition
"#;

/// An example function as found in a test file
#[derive(Debug, Clone)]
pub struct RawExample {
    /// Function name without the `Example` prefix
    pub name: String,
    pub doc: String,
    /// Printed body including the braces
    pub code: String,
    /// Expected output from the trailing `// Output:` comment
    pub output: String,
}

fn output_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^[[:space:]]*output:").expect("output prefix pattern is valid"))
}

fn output_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)//[[:space:]]*output:").expect("output marker pattern is valid"))
}

fn starts_with_uppercase(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_uppercase)
}

/// `Example`, or `Example` followed by anything but a lowercase letter
pub fn is_example_name(name: &str) -> bool {
    match name.strip_prefix(EXAMPLE_PREFIX) {
        Some(rest) => rest.chars().next().map_or(true, |c| !c.is_lowercase()),
        None => false,
    }
}

/// Collect the example functions of one test file
pub fn collect_examples(file: &SourceFile) -> Result<Vec<RawExample>, CoreError> {
    let language = go_language();
    let query = Query::new(&language, EXAMPLE_QUERY)?;
    let name_idx = query.capture_index_for_name("name");
    let params_idx = query.capture_index_for_name("params");
    let body_idx = query.capture_index_for_name("body");
    let def_idx = query.capture_index_for_name("definition");

    let mut cursor = QueryCursor::new();
    let mut examples = Vec::new();
    let mut matches = cursor.matches(&query, file.root(), file.source.as_bytes());
    while let Some(m) = matches.next() {
        let find = |idx: Option<u32>| {
            idx.and_then(|i| m.captures.iter().find(|c| c.index == i).map(|c| c.node))
        };
        let (Some(name), Some(params), Some(body), Some(def)) =
            (find(name_idx), find(params_idx), find(body_idx), find(def_idx))
        else {
            continue;
        };

        let name = file.text(name);
        if !is_example_name(name) || params.named_child_count() > 0 || def.child_by_field_name("result").is_some() {
            continue;
        }

        examples.push(RawExample {
            name: name[EXAMPLE_PREFIX.len()..].to_string(),
            doc: doc_comment(def, &file.source),
            code: print_node(body, &file.source, PrintMode::Full)?,
            output: example_output(body, &file.source),
        });
    }

    examples.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(examples)
}

/// Expected output: the text after `Output:` in the body's last comment group
fn example_output(body: Node<'_>, source: &str) -> String {
    let mut comments = Vec::new();
    gather_comments(body, &mut comments);

    let Some(last) = comments.last() else {
        return String::new();
    };
    let mut group = vec![*last];
    for comment in comments.iter().rev().skip(1) {
        let first = group[group.len() - 1];
        if comment.end_position().row + 1 != first.start_position().row {
            break;
        }
        group.push(*comment);
    }
    group.reverse();

    let texts: Vec<&str> = group.iter().map(|c| node_text(*c, source)).collect();
    let text = comment_text(&texts);
    match output_prefix().find(&text) {
        Some(m) => text[m.end()..].trim().to_string(),
        None => String::new(),
    }
}

fn gather_comments<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "comment" {
            out.push(child);
        } else {
            gather_comments(child, out);
        }
    }
}

/// Examples documenting `key`: `""` for the package, `Name` for functions
/// and types, `Type_Method` for methods.
pub fn examples_for(examples: &[RawExample], key: &str) -> Vec<Example> {
    let mut docs = Vec::new();
    for e in examples {
        let mut n = e.name.as_str();
        if let Some(i) = n.rfind('_') {
            if i < n.len() - 1 && !starts_with_uppercase(&n[i + 1..]) {
                n = &n[..i];
            }
        }
        if n != key {
            continue;
        }

        let (code, output) = display_code(&e.code, &e.output);
        docs.push(Example {
            name: e.name.clone(),
            doc: e.doc.clone(),
            code,
            output,
        });
    }
    docs
}

/// Code shown for an example and the output field that goes with it
fn display_code(code: &str, output: &str) -> (String, String) {
    let Some(inner) = code.strip_prefix('{').and_then(|c| c.strip_suffix('}')) else {
        // the output comment stays visible in the code itself
        return (code.to_string(), String::new());
    };
    let mut body = inner.replace("\n    ", "\n");
    if let Some(m) = output_marker().find(&body) {
        body.truncate(m.start());
    }
    (body.trim().to_string(), output.to_string())
}
