//! Formatting helpers for renderers of the documentation model

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{Decl, TypeAnnotation};

/// Escape text for HTML element content and attribute values.
///
/// Escapes: `& < > " '`
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\b(?:https?|ftp)://[^\s<>"']*[^\s<>"'.,:;!?)]"#).expect("url pattern is valid")
    })
}

/// Escape a line of comment text, turning URLs into links
fn linkify(line: &str) -> String {
    let mut out = String::new();
    let mut last = 0;
    for m in url_pattern().find_iter(line) {
        out.push_str(&escape_html(&line[last..m.start()]));
        let url = escape_html(m.as_str());
        out.push_str(&format!("<a href=\"{}\">{}</a>", url, url));
        last = m.end();
    }
    out.push_str(&escape_html(&line[last..]));
    out
}

#[derive(Debug, PartialEq, Eq)]
enum Block<'a> {
    Paragraph(Vec<&'a str>),
    Code(Vec<&'a str>),
}

fn is_indented(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t')
}

fn blocks(text: &str) -> Vec<Block<'_>> {
    let lines: Vec<&str> = text.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if lines[i].trim().is_empty() {
            i += 1;
            continue;
        }
        let start = i;
        if is_indented(lines[i]) {
            // a code block runs on across blank lines while indentation continues
            let mut end = i;
            while i < lines.len() && (is_indented(lines[i]) || lines[i].trim().is_empty()) {
                if !lines[i].trim().is_empty() {
                    end = i + 1;
                }
                i += 1;
            }
            i = end;
            blocks.push(Block::Code(lines[start..end].to_vec()));
        } else {
            while i < lines.len() && !lines[i].trim().is_empty() && !is_indented(lines[i]) {
                i += 1;
            }
            blocks.push(Block::Paragraph(lines[start..i].to_vec()));
        }
    }
    blocks
}

/// Whether a line reads like a section heading
fn is_heading(line: &str) -> bool {
    let line = line.trim();
    if !line.chars().next().is_some_and(char::is_uppercase) {
        return false;
    }
    if !line.chars().last().is_some_and(char::is_alphanumeric) {
        return false;
    }
    if line.chars().any(|c| ";:!?+*/=[]{}_^°&§~%#@<\">\\".contains(c)) {
        return false;
    }
    // an apostrophe is only allowed as a possessive
    let mut rest = line;
    while let Some(i) = rest.find('\'') {
        rest = &rest[i + 1..];
        if !(rest.starts_with("s ") || rest == "s") {
            return false;
        }
    }
    true
}

fn heading_id(line: &str) -> String {
    let mut id = String::from("hdr-");
    let mut gap = false;
    for c in line.trim().chars() {
        if c.is_alphanumeric() {
            if gap {
                id.push('_');
                gap = false;
            }
            id.push(c);
        } else {
            gap = true;
        }
    }
    id
}

fn common_indent<'a>(lines: &[&'a str]) -> &'a str {
    let mut prefix: Option<&str> = None;
    for line in lines.iter().filter(|l| !l.trim().is_empty()) {
        let indent = &line[..line.len() - line.trim_start().len()];
        prefix = Some(match prefix {
            None => indent,
            Some(p) => {
                let shared = p
                    .char_indices()
                    .zip(indent.chars())
                    .find(|((_, a), b)| a != b)
                    .map_or(p.len().min(indent.len()), |((i, _), _)| i);
                &p[..shared]
            }
        });
    }
    prefix.unwrap_or("")
}

/// Convert doc comment text to HTML.
///
/// Blank-line separated runs of text become paragraphs, indented runs become
/// preformatted blocks, and a lone capitalized line between two paragraphs
/// becomes a heading.
pub fn comment_html(text: &str) -> String {
    let blocks = blocks(text);
    let mut out = String::new();
    for (i, block) in blocks.iter().enumerate() {
        match block {
            Block::Paragraph(lines) => {
                let heading = lines.len() == 1
                    && i > 0
                    && matches!(blocks.get(i - 1), Some(Block::Paragraph(_)))
                    && matches!(blocks.get(i + 1), Some(Block::Paragraph(_)))
                    && is_heading(lines[0]);
                if heading {
                    let title = lines[0].trim();
                    out.push_str(&format!(
                        "<h3 id=\"{}\">{}</h3>\n",
                        escape_html(&heading_id(title)),
                        escape_html(title)
                    ));
                    continue;
                }
                out.push_str("<p>\n");
                for line in lines {
                    out.push_str(&linkify(line));
                    out.push('\n');
                }
                out.push_str("</p>\n");
            }
            Block::Code(lines) => {
                let indent = common_indent(lines);
                out.push_str("<pre>");
                for line in lines {
                    out.push_str(&escape_html(line.strip_prefix(indent).unwrap_or(line.trim_start())));
                    out.push('\n');
                }
                out.push_str("</pre>\n");
            }
        }
    }
    out
}

/// Render declaration text as HTML, wrapping each annotated span the
/// resolver knows a target for in a link.
pub fn decl_html<F>(decl: &Decl, link: F) -> String
where
    F: Fn(&TypeAnnotation) -> Option<String>,
{
    let text = decl.text.as_str();
    let mut out = String::new();
    let mut last = 0;
    for a in &decl.annotations {
        // overlapping or stale spans are rendered as plain text
        if a.start < last || a.end > text.len() || a.start >= a.end {
            continue;
        }
        let (Some(before), Some(span)) = (text.get(last..a.start), text.get(a.start..a.end)) else {
            continue;
        };
        out.push_str(&escape_html(before));
        match link(a) {
            Some(href) => out.push_str(&format!(
                "<a href=\"{}\">{}</a>",
                escape_html(&href),
                escape_html(span)
            )),
            None => out.push_str(&escape_html(span)),
        }
        last = a.end;
    }
    out.push_str(&escape_html(text.get(last..).unwrap_or("")));
    out
}

/// Link resolver for identifiers declared in the same package
pub fn local_link(annotation: &TypeAnnotation) -> Option<String> {
    if annotation.qualifier.is_empty() {
        Some(format!("#{}", annotation.name))
    } else {
        None
    }
}

/// Command name for an import path: its last element
pub fn cmd_name(import_path: &str) -> &str {
    import_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(import_path)
}
