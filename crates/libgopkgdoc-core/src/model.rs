//! Documentation model handed to renderers
//!
//! Everything here is plain data: a `Package` is built once and never
//! mutated afterwards, so it can be shared between readers behind an `Arc`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to an exported identifier inside a declaration's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeAnnotation {
    /// Byte offset of the first byte of the reference
    pub start: usize,
    /// Byte offset one past the reference
    pub end: usize,
    /// Package qualifier (`""` for local identifiers)
    pub qualifier: String,
    /// Referenced identifier
    pub name: String,
}

/// Normalized source text of a declaration with its identifier spans
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decl {
    pub text: String,
    /// Sorted ascending by `start`
    pub annotations: Vec<TypeAnnotation>,
}

/// A const or var group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Value {
    pub decl: Decl,
    pub doc: String,
}

/// A usage sample harvested from a test file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    /// Name without the `Example` prefix (`""`, `Foo`, `Foo_Bar`, ...)
    pub name: String,
    pub doc: String,
    pub code: String,
    pub output: String,
}

/// A function or method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Func {
    pub decl: Decl,
    pub doc: String,
    pub name: String,
    /// Receiver type (`T` or `*T`), empty for plain functions
    pub recv: String,
    pub examples: Vec<Example>,
}

/// A type with the declarations grouped under it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Type {
    pub doc: String,
    pub name: String,
    pub decl: Decl,
    pub consts: Vec<Value>,
    pub vars: Vec<Value>,
    /// Functions returning this type
    pub funcs: Vec<Func>,
    pub methods: Vec<Func>,
    pub examples: Vec<Example>,
}

/// A non-test source file of the package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub name: String,
}

/// Documentation of one package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// The import path for this package.
    pub import_path: String,

    /// Package name from the package clause.
    pub name: String,

    /// Package documentation, trailing whitespace removed.
    pub doc: String,

    /// The time this object was built.
    pub updated: DateTime<Utc>,

    // Top-level declarations.
    pub consts: Vec<Value>,
    pub funcs: Vec<Func>,
    pub types: Vec<Type>,
    pub vars: Vec<Value>,

    /// Package-level examples.
    pub examples: Vec<Example>,

    /// Non-test files.
    pub files: Vec<File>,
}

impl Package {
    /// Find a top-level type by name
    pub fn find_type(&self, name: &str) -> Option<&Type> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Find a top-level function by name
    pub fn find_func(&self, name: &str) -> Option<&Func> {
        self.funcs.iter().find(|f| f.name == name)
    }
}
