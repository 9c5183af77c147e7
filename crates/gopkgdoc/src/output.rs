use gopkgdoc::DocsError;
use libgopkgdoc_core::render::cmd_name;
use libgopkgdoc_core::{Func, Package, Value};
use serde::Serialize;

use crate::Cli;

/// JSON response envelope
#[derive(Serialize)]
pub struct JsonResponse<'a> {
    pub schema_version: u32,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<&'a Package>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonError>,
}

#[derive(Serialize)]
pub struct JsonError {
    pub code: String,
    pub message: String,
}

fn print_json(response: &JsonResponse<'_>, to_stderr: bool) {
    match serde_json::to_string_pretty(response) {
        Ok(text) if to_stderr => eprintln!("{}", text),
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("error: failed to encode output: {}", e),
    }
}

/// Output loaded documentation
pub fn output_package(cli: &Cli, pkg: &Package) {
    if cli.json {
        print_json(
            &JsonResponse {
                schema_version: 1,
                ok: true,
                data: Some(pkg),
                error: None,
            },
            false,
        );
    } else {
        print!("{}", summary(pkg));
    }
}

/// Output an error
pub fn output_error(cli: &Cli, err: &DocsError) {
    if cli.json {
        print_json(
            &JsonResponse {
                schema_version: 1,
                ok: false,
                data: None,
                error: Some(JsonError {
                    code: err.error_code().to_string(),
                    message: err.to_string(),
                }),
            },
            true,
        );
    } else {
        eprintln!("error: {}", err);
    }
}

fn first_line(doc: &str) -> &str {
    doc.lines().next().unwrap_or("")
}

fn push_values(out: &mut String, heading: &str, values: &[Value], indent: &str) {
    if values.is_empty() {
        return;
    }
    out.push_str(&format!("{}{}\n", indent, heading));
    for v in values {
        for line in v.decl.text.lines() {
            out.push_str(&format!("{}    {}\n", indent, line));
        }
    }
}

fn push_funcs(out: &mut String, funcs: &[Func], indent: &str) {
    for f in funcs {
        out.push_str(&format!("{}{}\n", indent, f.decl.text));
        let doc = first_line(&f.doc);
        if !doc.is_empty() {
            out.push_str(&format!("{}    {}\n", indent, doc));
        }
    }
}

/// Human-readable overview of a package
pub fn summary(pkg: &Package) -> String {
    let mut out = String::new();
    if pkg.name == "main" {
        out.push_str(&format!("command {} // import \"{}\"\n", cmd_name(&pkg.import_path), pkg.import_path));
    } else {
        out.push_str(&format!("package {} // import \"{}\"\n", pkg.name, pkg.import_path));
    }
    if !pkg.doc.is_empty() {
        out.push('\n');
        out.push_str(&pkg.doc);
        out.push('\n');
    }
    out.push('\n');

    push_values(&mut out, "CONSTANTS", &pkg.consts, "");
    push_values(&mut out, "VARIABLES", &pkg.vars, "");
    if !pkg.funcs.is_empty() {
        out.push_str("FUNCTIONS\n");
        push_funcs(&mut out, &pkg.funcs, "    ");
    }
    if !pkg.types.is_empty() {
        out.push_str("TYPES\n");
        for t in &pkg.types {
            let header = t.decl.text.lines().next().unwrap_or("");
            out.push_str(&format!("    {}\n", header));
            push_values(&mut out, "constants:", &t.consts, "        ");
            push_values(&mut out, "variables:", &t.vars, "        ");
            push_funcs(&mut out, &t.funcs, "        ");
            push_funcs(&mut out, &t.methods, "        ");
        }
    }

    let files: Vec<&str> = pkg.files.iter().map(|f| f.name.as_str()).collect();
    out.push_str(&format!("\nfiles: {}\n", files.join(" ")));
    out.push_str(&format!("built: {}\n", pkg.updated.to_rfc3339()));
    out
}
