use std::collections::HashSet;
use std::path::{Path, PathBuf};

use btrpsl_core::Script;

use super::build_or_exit;
use crate::OutputFormat;

pub(crate) fn cmd_deps(file: &Path, include: &[PathBuf], output: OutputFormat, quiet: bool) {
    let script = build_or_exit(file, include, output, quiet);
    match output {
        OutputFormat::Json => {
            let pretty = serde_json::to_string_pretty(&tree(&script))
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text if quiet => {
            let mut seen = HashSet::new();
            for id in imported_ids(&script, &mut seen) {
                println!("{}", id);
            }
        }
        OutputFormat::Text => print!("{}", script.pretty_dependencies()),
    }
}

/// Every script reachable through imports, once each, depth first.
fn imported_ids<'a>(script: &'a Script, seen: &mut HashSet<&'a str>) -> Vec<&'a str> {
    let mut out = Vec::new();
    for dep in script.dependencies() {
        if seen.insert(dep.id()) {
            out.push(dep.id());
            out.extend(imported_ids(dep, seen));
        }
    }
    out
}

fn tree(script: &Script) -> serde_json::Value {
    serde_json::json!({
        "id": script.id(),
        "dependencies": script
            .dependencies()
            .iter()
            .map(|d| tree(d))
            .collect::<Vec<_>>(),
    })
}
