use std::path::{Path, PathBuf};

use btrpsl_core::{interchange, Script};

use super::build_or_exit;
use crate::OutputFormat;

pub(crate) fn cmd_build(file: &Path, include: &[PathBuf], output: OutputFormat, quiet: bool) {
    let script = build_or_exit(file, include, output, quiet);
    match output {
        OutputFormat::Json => {
            let pretty = serde_json::to_string_pretty(&interchange::to_json(&script))
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            if quiet {
                println!("{}", script.id());
            } else {
                print!("{}", summary(&script));
            }
        }
    }
}

fn summary(script: &Script) -> String {
    let mut out = format!("script {}\n", script.id());
    out.push_str(&format!("  VMs: {}\n", script.vms().len()));
    out.push_str(&format!("  nodes: {}\n", script.nodes().len()));
    out.push_str(&format!("  constraints: {}\n", script.constraints().len()));
    for c in script.constraints() {
        let marker = if c.is_continuous() { ">>" } else { "" };
        out.push_str(&format!(
            "    {}{} ({} VMs, {} nodes)\n",
            marker,
            c.name(),
            c.involved_vms().len(),
            c.involved_nodes().len()
        ));
    }
    let exports: Vec<&str> = script.exported_labels().collect();
    if !exports.is_empty() {
        out.push_str(&format!("  exports: {}\n", exports.join(", ")));
    }
    if !script.dependencies().is_empty() {
        let deps: Vec<&str> = script.dependencies().iter().map(|d| d.id()).collect();
        out.push_str(&format!("  imports: {}\n", deps.join(", ")));
    }
    out
}
