mod build;
mod deps;

pub(crate) use build::cmd_build;
pub(crate) use deps::cmd_deps;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use btrpsl_core::ast::Stmt;
use btrpsl_core::{lexer, parser, BuildError, PathBasedIncludes, Script, ScriptBuilder};

use crate::OutputFormat;

/// A builder searching the `-I` directories first, then the directory
/// the script's namespace is rooted at.
fn builder_for(file: &Path, include: &[PathBuf]) -> ScriptBuilder {
    let mut paths = include.to_vec();
    paths.push(script_root(file));
    tracing::debug!(?paths, "include path");
    ScriptBuilder::new().with_includes(Arc::new(PathBasedIncludes::new(paths)))
}

/// `dc/web.btrp` declaring `namespace dc.web` is rooted above `dc/`.
/// Only trailing directories matching the namespace are stripped.
fn script_root(file: &Path) -> PathBuf {
    let mut root = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let Some(id) = declared_namespace(file) else {
        return root;
    };
    let mut packages: Vec<&str> = id.split('.').collect();
    packages.pop();
    if packages.is_empty() {
        return root;
    }
    root = fs::canonicalize(&root).unwrap_or(root);
    for package in packages.iter().rev() {
        if root.file_name().and_then(|n| n.to_str()) != Some(*package) {
            break;
        }
        root = match root.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
    }
    root
}

/// The name in the leading `namespace` statement, if `file` reads and
/// parses that far. Errors are left for the build to report.
fn declared_namespace(file: &Path) -> Option<String> {
    let src = fs::read_to_string(file).ok()?;
    let name = file.display().to_string();
    let tokens = lexer::lex(&src, &name).ok()?;
    let (stmts, _) = parser::parse(&tokens, &name);
    match stmts.into_iter().next()? {
        Stmt::Namespace { name, .. } => Some(name),
        _ => None,
    }
}

/// Build `file`, or print the failure and exit 1.
pub(crate) fn build_or_exit(
    file: &Path,
    include: &[PathBuf],
    output: OutputFormat,
    quiet: bool,
) -> Arc<Script> {
    match builder_for(file, include).build_file(file) {
        Ok(script) => script,
        Err(e) => {
            report_failure(&e, output, quiet);
            process::exit(1);
        }
    }
}

fn report_failure(e: &BuildError, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            let value = match e {
                BuildError::Diagnostics(diagnostics) => serde_json::json!({
                    "diagnostics": diagnostics
                        .iter()
                        .map(|d| d.to_json_value())
                        .collect::<Vec<_>>(),
                }),
                BuildError::Io { .. } => serde_json::json!({ "error": e.to_string() }),
            };
            let pretty = serde_json::to_string_pretty(&value)
                .unwrap_or_else(|_| format!("{{\"error\": \"{}\"}}", e));
            eprintln!("{}", pretty);
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("{}", e);
            }
        }
    }
}
