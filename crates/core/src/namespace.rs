//! Export scopes and import resolution.
//!
//! An exported value is visible from a namespace when it was exported
//! without restriction, or when the namespace matches one of its scopes:
//! `a.b` matches exactly, `a.b.*` matches every namespace starting with
//! `a.b.`, and `*` alone matches everything.

use crate::operand::{BtrpSet, Operand, OperandType};
use crate::script::Script;
use crate::symbols::SymbolsTable;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportScope {
    Exact(String),
    /// The text before the `*`, trailing dot included
    Prefix(String),
}

impl ExportScope {
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix('*') {
            Some(prefix) => ExportScope::Prefix(prefix.to_owned()),
            None => ExportScope::Exact(pattern.to_owned()),
        }
    }

    pub fn matches(&self, namespace: &str) -> bool {
        match self {
            ExportScope::Exact(ns) => ns == namespace,
            ExportScope::Prefix(prefix) => namespace.starts_with(prefix.as_str()),
        }
    }
}

impl fmt::Display for ExportScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportScope::Exact(ns) => write!(f, "{}", ns),
            ExportScope::Prefix(prefix) => write!(f, "{}*", prefix),
        }
    }
}

/// Whether `namespace` is allowed by `scopes`; `None` allows everything.
pub fn in_scope(scopes: Option<&[ExportScope]>, namespace: &str) -> bool {
    match scopes {
        None => true,
        Some(scopes) => scopes.iter().any(|s| s.matches(namespace)),
    }
}

/// Bind in `symbols` what the dependencies of `import <id>;` make visible
/// to the namespace `importer`.
///
/// For every dependency, each importable exported label is declared
/// immutable, unless it is already bound: the existing binding is then
/// removed. A dependency importable as a whole is bound to `$<its id>`.
/// A wildcard import also binds `$<prefix>` to the union of those VMs.
pub fn resolve_import(
    id: &str,
    dependencies: &[Arc<Script>],
    importer: &str,
    symbols: &mut SymbolsTable,
) -> Result<(), String> {
    let wildcard = id.strip_suffix(".*");
    if dependencies.is_empty() {
        return match wildcard {
            Some(_) => Ok(()),
            None => Err(format!("unable to locate '{}'", id)),
        };
    }
    let mut union = BtrpSet::new(OperandType::Vm, 1);
    for dep in dependencies {
        for (label, value) in dep.importable_exports(importer) {
            if symbols.is_declared(label) {
                symbols.remove(label);
            } else {
                symbols.declare_immutable(label, value.clone())?;
            }
        }
        if dep.can_import_script(importer) {
            let vms = dep.vm_set();
            for vm in &vms {
                union.insert(vm.clone())?;
            }
            symbols.declare_immutable(&format!("${}", dep.id()), Operand::Set(vms))?;
        }
    }
    if let Some(prefix) = wildcard {
        if !union.is_empty() {
            symbols.declare_immutable(&format!("${}", prefix), Operand::Set(union))?;
        }
    }
    Ok(())
}
