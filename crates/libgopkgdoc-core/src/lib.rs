//! Core library for Go package documentation
//!
//! Parses Go sources with tree-sitter, re-prints declarations in a normalized
//! style and builds the `Package` model that renderers consume.

pub mod annotate;
pub mod build;
pub mod config;
pub mod error;
pub mod examples;
pub mod model;
pub mod parse;
pub mod printer;
pub mod render;

pub use build::build_package;
pub use config::{load_config, save_config, DocsConfig, VcsBackend, DEFAULT_REFRESH_COOLDOWN_SECS};
pub use error::CoreError;
pub use model::{Decl, Example, File, Func, Package, Type, TypeAnnotation, Value};
pub use printer::{DeclPrinter, PrintMode, PACKAGE_WRAPPER};
