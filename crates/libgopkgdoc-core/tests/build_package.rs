//! End-to-end documentation builds over package directories on disk

use std::fs;
use std::path::PathBuf;

use libgopkgdoc_core::render::{decl_html, local_link};
use libgopkgdoc_core::{build_package, CoreError};
use tempfile::{tempdir, TempDir};

fn package_dir(files: &[(&str, &str)]) -> (TempDir, Vec<PathBuf>) {
    let dir = tempdir().unwrap();
    let mut paths = Vec::new();
    for (name, src) in files {
        let path = dir.path().join(name);
        fs::write(&path, src).unwrap();
        paths.push(path);
    }
    (dir, paths)
}

const SERVER: &str = r#"// Package server serves requests.
package server

import (
	"net/http"
	"time"
)

// Option configures a Server.
type Option func(*Server)

// Server handles requests.
type Server struct {
	Addr    string
	Timeout time.Duration
	mux     *http.ServeMux
}

// Handler responds to a request.
type Handler interface {
	Serve(w http.ResponseWriter, r *http.Request) error
	internal()
}

// New creates a server.
func New(addr string, opts ...Option) *Server {
	s := &Server{Addr: addr}
	for _, o := range opts {
		o(s)
	}
	return s
}

// WithTimeout sets the timeout.
func WithTimeout(d time.Duration) Option {
	return func(s *Server) { s.Timeout = d }
}

// Handle registers h.
func (s *Server) Handle(pattern string, h Handler) {}
"#;

#[test]
fn test_declarations_are_annotated() {
    let (_dir, paths) = package_dir(&[("server.go", SERVER)]);
    let pkg = build_package("example.com/server", &paths).unwrap();

    let server = pkg.find_type("Server").unwrap();
    let new = &server.funcs[0];
    assert_eq!(new.decl.text, "func New(addr string, opts ...Option) *Server");
    let names: Vec<&str> = new.decl.annotations.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Option", "Server"]);
    for a in &new.decl.annotations {
        assert_eq!(&new.decl.text[a.start..a.end], a.name);
    }

    let handle = &server.methods[0];
    assert_eq!(
        decl_html(&handle.decl, local_link),
        "func (s *<a href=\"#Server\">Server</a>) Handle(pattern string, h <a href=\"#Handler\">Handler</a>)"
    );

    let option = pkg.find_type("Option").unwrap();
    assert_eq!(option.funcs[0].name, "WithTimeout");

    let handler = pkg.find_type("Handler").unwrap();
    assert!(handler.decl.text.contains("// contains filtered or unexported methods"));
    assert!(!handler.decl.text.contains("internal"));
    let qualified: Vec<(&str, &str)> = handler
        .decl
        .annotations
        .iter()
        .map(|a| (a.qualifier.as_str(), a.name.as_str()))
        .collect();
    assert_eq!(qualified, vec![("http", "ResponseWriter"), ("http", "Request")]);
}

#[test]
fn test_rebuild_is_stable() {
    let (_dir, paths) = package_dir(&[("server.go", SERVER)]);
    let first = build_package("example.com/server", &paths).unwrap();
    let second = build_package("example.com/server", &paths).unwrap();

    for (a, b) in first.types.iter().zip(&second.types) {
        assert_eq!(a.decl, b.decl);
    }
    assert!(second.updated >= first.updated);
}

#[test]
fn test_only_test_files_is_not_a_package() {
    let (_dir, paths) = package_dir(&[("x_test.go", "package x\n\nfunc ExampleX() {}\n")]);
    assert!(matches!(
        build_package("example.com/x", &paths),
        Err(CoreError::PackageNotFound(_))
    ));
}
