//! Builds the documentation model of a package from its source files

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, info};
use tree_sitter::Node;

use crate::error::CoreError;
use crate::examples::{collect_examples, examples_for, RawExample};
use crate::model::{File, Func, Package, Type, Value};
use crate::parse::{base_type_name, doc_comment, is_exported, parse_sources, select_package, SourceFile};
use crate::printer::{spec_is_exported, DeclPrinter};

/// Share of a group's specs that must name one type for the group to be
/// listed under that type
const TYPED_VALUE_THRESHOLD: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Const,
    Var,
}

struct ValueDecl<'a> {
    node: Node<'a>,
    source: &'a str,
    kind: ValueKind,
    order: usize,
}

struct FuncDecl<'a> {
    node: Node<'a>,
    source: &'a str,
    name: String,
    recv: String,
}

struct TypeDecl<'a> {
    spec: Node<'a>,
    source: &'a str,
    doc: String,
    consts: Vec<ValueDecl<'a>>,
    vars: Vec<ValueDecl<'a>>,
    funcs: Vec<FuncDecl<'a>>,
    methods: Vec<FuncDecl<'a>>,
}

/// Holds the state used while building one package's documentation
struct Builder<'a> {
    printer: DeclPrinter,
    examples: Vec<RawExample>,
    types: BTreeMap<String, TypeDecl<'a>>,
    values: Vec<ValueDecl<'a>>,
    funcs: Vec<FuncDecl<'a>>,
}

/// Build documentation for the package found among `files`.
///
/// Files that fail to parse are left out. Fails only when no package can be
/// parsed at all.
pub fn build_package(import_path: &str, files: &[PathBuf]) -> Result<Package, CoreError> {
    let parsed = parse_sources(files)?;
    let name = select_package(import_path, &parsed.packages)
        .ok_or_else(|| CoreError::PackageNotFound(import_path.to_string()))?;
    let sources = parsed
        .packages
        .get(&name)
        .ok_or_else(|| CoreError::PackageNotFound(import_path.to_string()))?;

    info!(import_path, package = %name, files = sources.len(), "building documentation");

    let mut builder = Builder::new()?;
    for file in sources {
        builder.read_file(file);
    }
    builder.associate();

    let test_package = format!("{}_test", name);
    for test in parsed
        .tests
        .iter()
        .filter(|t| t.package == name || t.package == test_package)
    {
        builder.examples.extend(collect_examples(test)?);
    }
    builder.examples.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(examples = builder.examples.len(), "collected examples");

    let mut files: Vec<File> = sources
        .iter()
        .map(|f| File { name: f.file_name() })
        .collect();
    files.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(builder.finish(import_path, &name, package_doc(sources), files))
}

/// Package comments of all files, in file order
fn package_doc(sources: &[SourceFile]) -> String {
    let docs: Vec<String> = sources
        .iter()
        .filter_map(|f| f.package_clause().map(|c| doc_comment(c, &f.source)))
        .filter(|d| !d.is_empty())
        .collect();
    docs.join("\n").trim_end().to_string()
}

impl<'a> Builder<'a> {
    fn new() -> Result<Self, CoreError> {
        Ok(Self {
            printer: DeclPrinter::new()?,
            examples: Vec::new(),
            types: BTreeMap::new(),
            values: Vec::new(),
            funcs: Vec::new(),
        })
    }

    /// Record the exported declarations of one file
    fn read_file(&mut self, file: &'a SourceFile) {
        let source = file.source.as_str();
        for decl in file.declarations() {
            match decl.kind() {
                "function_declaration" => {
                    let Some(name) = decl.child_by_field_name("name") else { continue };
                    let name = file.text(name);
                    if is_exported(name) {
                        self.funcs.push(FuncDecl {
                            node: decl,
                            source,
                            name: name.to_string(),
                            recv: String::new(),
                        });
                    }
                }
                "method_declaration" => {
                    let Some(name) = decl.child_by_field_name("name") else { continue };
                    let name = file.text(name);
                    if let (true, Some(recv)) = (is_exported(name), receiver(decl, source)) {
                        self.funcs.push(FuncDecl {
                            node: decl,
                            source,
                            name: name.to_string(),
                            recv,
                        });
                    }
                }
                "type_declaration" => {
                    let group_doc = doc_comment(decl, source);
                    let mut cursor = decl.walk();
                    for spec in decl.named_children(&mut cursor) {
                        if !matches!(spec.kind(), "type_spec" | "type_alias") {
                            continue;
                        }
                        let Some(name) = spec.child_by_field_name("name") else { continue };
                        let name = file.text(name);
                        if !is_exported(name) || self.types.contains_key(name) {
                            continue;
                        }
                        let mut doc = doc_comment(spec, source);
                        if doc.is_empty() {
                            doc = group_doc.clone();
                        }
                        self.types.insert(
                            name.to_string(),
                            TypeDecl {
                                spec,
                                source,
                                doc,
                                consts: Vec::new(),
                                vars: Vec::new(),
                                funcs: Vec::new(),
                                methods: Vec::new(),
                            },
                        );
                    }
                }
                "const_declaration" | "var_declaration" => {
                    if value_specs(decl).iter().any(|s| spec_is_exported(*s, source)) {
                        let kind = if decl.kind() == "const_declaration" {
                            ValueKind::Const
                        } else {
                            ValueKind::Var
                        };
                        let order = self.values.len();
                        self.values.push(ValueDecl {
                            node: decl,
                            source,
                            kind,
                            order,
                        });
                    }
                }
                _ => {}
            }
        }
    }

    /// Move values, constructors and methods under the types they belong to
    fn associate(&mut self) {
        let values = std::mem::take(&mut self.values);
        for value in values {
            match dominant_type(&value).and_then(|name| self.types.get_mut(&name)) {
                Some(typ) if value.kind == ValueKind::Const => typ.consts.push(value),
                Some(typ) => typ.vars.push(value),
                None => self.values.push(value),
            }
        }

        let funcs = std::mem::take(&mut self.funcs);
        for func in funcs {
            if !func.recv.is_empty() {
                let base = func.recv.trim_start_matches('*').to_string();
                // methods of unexported or foreign types are not documented
                if let Some(typ) = self.types.get_mut(&base) {
                    typ.methods.push(func);
                }
                continue;
            }
            match result_type(func.node, func.source).and_then(|name| self.types.get_mut(&name)) {
                Some(typ) => typ.funcs.push(func),
                None => self.funcs.push(func),
            }
        }
    }

    fn finish(mut self, import_path: &str, name: &str, doc: String, files: Vec<File>) -> Package {
        let values = std::mem::take(&mut self.values);
        let (consts, vars): (Vec<_>, Vec<_>) = values.into_iter().partition(|v| v.kind == ValueKind::Const);
        let consts = self.values_doc(consts);
        let vars = self.values_doc(vars);
        let funcs = std::mem::take(&mut self.funcs);
        let funcs = self.funcs_doc(funcs);

        let types = std::mem::take(&mut self.types);
        let types = types
            .into_iter()
            .map(|(type_name, t)| Type {
                doc: t.doc,
                decl: self.printer.print_decl(t.spec, t.source),
                consts: self.values_doc(t.consts),
                vars: self.values_doc(t.vars),
                funcs: self.funcs_doc(t.funcs),
                methods: self.funcs_doc(t.methods),
                examples: examples_for(&self.examples, &type_name),
                name: type_name,
            })
            .collect();

        Package {
            import_path: import_path.to_string(),
            name: name.to_string(),
            doc,
            updated: Utc::now(),
            consts,
            funcs,
            types,
            vars,
            examples: examples_for(&self.examples, ""),
            files,
        }
    }

    fn values_doc(&mut self, mut values: Vec<ValueDecl<'a>>) -> Vec<Value> {
        values.sort_by(|a, b| {
            sorting_name(a)
                .cmp(&sorting_name(b))
                .then(a.order.cmp(&b.order))
        });
        values
            .into_iter()
            .map(|v| Value {
                decl: self.printer.print_decl(v.node, v.source),
                doc: doc_comment(v.node, v.source),
            })
            .collect()
    }

    fn funcs_doc(&mut self, mut funcs: Vec<FuncDecl<'a>>) -> Vec<Func> {
        funcs.sort_by(|a, b| a.name.cmp(&b.name));
        funcs
            .into_iter()
            .map(|f| {
                let example_name = match f.recv.strip_prefix('*') {
                    _ if f.recv.is_empty() => f.name.clone(),
                    Some(base) => format!("{}_{}", base, f.name),
                    None => format!("{}_{}", f.recv, f.name),
                };
                Func {
                    decl: self.printer.print_decl(f.node, f.source),
                    doc: doc_comment(f.node, f.source),
                    examples: examples_for(&self.examples, &example_name),
                    name: f.name,
                    recv: f.recv,
                }
            })
            .collect()
    }
}

fn value_specs(decl: Node<'_>) -> Vec<Node<'_>> {
    let mut specs = Vec::new();
    let mut cursor = decl.walk();
    for child in decl.named_children(&mut cursor) {
        match child.kind() {
            "const_spec" | "var_spec" => specs.push(child),
            "var_spec_list" => specs.extend(value_specs(child)),
            _ => {}
        }
    }
    specs
}

/// Receiver type as written, `T` or `*T`
fn receiver(method: Node<'_>, source: &str) -> Option<String> {
    let list = method.child_by_field_name("receiver")?;
    let mut cursor = list.walk();
    let param = list
        .named_children(&mut cursor)
        .find(|n| n.kind() == "parameter_declaration")?;
    let typ = param.child_by_field_name("type")?;
    let (name, imported) = base_type_name(typ, source)?;
    if imported {
        return None;
    }
    if typ.kind() == "pointer_type" {
        Some(format!("*{}", name))
    } else {
        Some(name.to_string())
    }
}

/// Local type named by a function's first result, if there is exactly one
/// result name or none
fn result_type(func: Node<'_>, source: &str) -> Option<String> {
    let result = func.child_by_field_name("result")?;
    let typ = if result.kind() == "parameter_list" {
        let mut cursor = result.walk();
        let first = result
            .named_children(&mut cursor)
            .find(|n| matches!(n.kind(), "parameter_declaration" | "variadic_parameter_declaration"))?;
        let mut name_cursor = first.walk();
        if first.children_by_field_name("name", &mut name_cursor).count() > 1 {
            return None;
        }
        first.child_by_field_name("type")?
    } else {
        result
    };
    match base_type_name(typ, source)? {
        (name, false) => Some(name.to_string()),
        (_, true) => None,
    }
}

/// The single local type a const/var group is declared with, when enough of
/// its exported specs use it. Untyped consts without values inherit the type
/// of the line before them.
fn dominant_type(value: &ValueDecl<'_>) -> Option<String> {
    let mut dominant: Option<&str> = None;
    let mut frequency = 0usize;
    let mut exported = 0usize;
    let mut prev: Option<&str> = None;
    for spec in value_specs(value.node) {
        let name = match spec.child_by_field_name("type") {
            Some(typ) => match base_type_name(typ, value.source) {
                Some((n, false)) => Some(n),
                _ => None,
            },
            None if value.kind == ValueKind::Const && spec.child_by_field_name("value").is_none() => prev,
            None => None,
        };
        prev = name;
        if !spec_is_exported(spec, value.source) {
            continue;
        }
        exported += 1;
        if let Some(n) = name {
            if dominant.is_some_and(|d| d != n) {
                return None;
            }
            dominant = Some(n);
            frequency += 1;
        }
    }

    let dominant = dominant?;
    if is_exported(dominant) && frequency as f64 >= exported as f64 * TYPED_VALUE_THRESHOLD {
        Some(dominant.to_string())
    } else {
        None
    }
}

/// Sort key of a value group: its only name, or empty for groups
fn sorting_name(value: &ValueDecl<'_>) -> String {
    let specs: Vec<Node<'_>> = value_specs(value.node)
        .into_iter()
        .filter(|s| spec_is_exported(*s, value.source))
        .collect();
    if let [spec] = specs.as_slice() {
        let mut cursor = spec.walk();
        let names: Vec<Node<'_>> = spec.children_by_field_name("name", &mut cursor).collect();
        if let [name] = names.as_slice() {
            return value.source.get(name.byte_range()).unwrap_or("").to_string();
        }
    }
    String::new()
}
