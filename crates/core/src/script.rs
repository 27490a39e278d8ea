//! The result of a successful build.
//!
//! A script is identified by its fully-qualified name `ns.local`. It owns
//! the VMs and nodes it declares, its constraints and the values it
//! exports, and references the scripts it imports.

use crate::constraint::Constraint;
use crate::model::{Element, ElementKind};
use crate::namespace::{in_scope, ExportScope};
use crate::operand::{BtrpSet, Operand};
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Exported {
    pub value: Operand,
    /// `None` when visible from every namespace
    pub scopes: Option<Vec<ExportScope>>,
}

#[derive(Debug, Clone, Default)]
pub struct Script {
    fqn: String,
    vms: Vec<Element>,
    nodes: Vec<Element>,
    constraints: Vec<Constraint>,
    exports: BTreeMap<String, Exported>,
    global_scope: Option<Vec<ExportScope>>,
    dependencies: Vec<Arc<Script>>,
    attributes: BTreeMap<String, BTreeMap<String, String>>,
    /// VMs and nodes above, for constant-time duplicate checks
    declared: HashSet<Element>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fqn(&mut self, fqn: &str) {
        self.fqn = fqn.to_owned();
    }

    /// The fully-qualified name.
    pub fn id(&self) -> &str {
        &self.fqn
    }

    /// Everything before the last `.`; empty for a top-level script.
    pub fn namespace(&self) -> &str {
        self.fqn.rsplit_once('.').map_or("", |(ns, _)| ns)
    }

    pub fn local_name(&self) -> &str {
        self.fqn.rsplit_once('.').map_or(self.fqn.as_str(), |(_, local)| local)
    }

    // ── Elements ─────────────────────────────────────────────────────

    /// Returns `false` if the VM was already declared here.
    pub fn add_vm(&mut self, vm: Element) -> bool {
        if !self.declared.insert(vm.clone()) {
            return false;
        }
        self.vms.push(vm);
        true
    }

    pub fn add_node(&mut self, node: Element) -> bool {
        if !self.declared.insert(node.clone()) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    pub fn add_element(&mut self, element: Element) -> bool {
        match element.kind() {
            ElementKind::Vm => self.add_vm(element),
            ElementKind::Node => self.add_node(element),
        }
    }

    pub fn vms(&self) -> &[Element] {
        &self.vms
    }

    pub fn nodes(&self) -> &[Element] {
        &self.nodes
    }

    pub fn vm_set(&self) -> BtrpSet {
        BtrpSet::of_elements(ElementKind::Vm, &self.vms)
    }

    /// Attributes of an element, keyed by its displayed name.
    pub fn set_attributes(&mut self, element: &Element, attrs: BTreeMap<String, String>) {
        self.attributes.insert(element.to_string(), attrs);
    }

    pub fn attributes(&self, element: &Element) -> Option<&BTreeMap<String, String>> {
        self.attributes.get(&element.to_string())
    }

    pub fn all_attributes(&self) -> &BTreeMap<String, BTreeMap<String, String>> {
        &self.attributes
    }

    // ── Constraints ──────────────────────────────────────────────────

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    // ── Exports ──────────────────────────────────────────────────────

    pub fn add_exportable(&mut self, label: &str, value: Operand, scopes: Option<Vec<ExportScope>>) {
        self.exports
            .insert(label.to_owned(), Exported { value, scopes });
    }

    pub fn exported(&self, label: &str) -> Option<&Exported> {
        self.exports.get(label)
    }

    pub fn exported_labels(&self) -> impl Iterator<Item = &str> {
        self.exports.keys().map(String::as_str)
    }

    /// Whether `label` is exported to `namespace`.
    pub fn can_import(&self, label: &str, namespace: &str) -> bool {
        self.exports
            .get(label)
            .is_some_and(|e| in_scope(e.scopes.as_deref(), namespace))
    }

    /// The exported values visible from `namespace`, by label.
    pub fn importable_exports<'a>(
        &'a self,
        namespace: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Operand)> + 'a {
        self.exports
            .iter()
            .filter(move |(_, e)| in_scope(e.scopes.as_deref(), namespace))
            .map(|(label, e)| (label.as_str(), &e.value))
    }

    /// Scope of `export $me`: who may import the whole script.
    pub fn set_global_scope(&mut self, scopes: Option<Vec<ExportScope>>) {
        self.global_scope = scopes;
    }

    pub fn global_scope(&self) -> Option<&[ExportScope]> {
        self.global_scope.as_deref()
    }

    pub fn can_import_script(&self, namespace: &str) -> bool {
        in_scope(self.global_scope.as_deref(), namespace)
    }

    // ── Dependencies ─────────────────────────────────────────────────

    pub fn add_dependency(&mut self, dep: Arc<Script>) {
        if !self.dependencies.iter().any(|d| d.id() == dep.id()) {
            self.dependencies.push(dep);
        }
    }

    pub fn dependencies(&self) -> &[Arc<Script>] {
        &self.dependencies
    }

    /// The import tree, one script per line.
    ///
    /// ```text
    /// a
    /// |- b
    ///    \- in.titi
    /// \- c
    /// ```
    pub fn pretty_dependencies(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.id());
        self.write_dependencies(&mut out, "");
        out
    }

    fn write_dependencies(&self, out: &mut String, indent: &str) {
        let last = self.dependencies.len().saturating_sub(1);
        for (i, dep) in self.dependencies.iter().enumerate() {
            let branch = if i == last { "\\- " } else { "|- " };
            let _ = writeln!(out, "{}{}{}", indent, branch, dep.id());
            dep.write_dependencies(out, &format!("{}   ", indent));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::Number;

    fn named(fqn: &str) -> Script {
        let mut s = Script::new();
        s.set_fqn(fqn);
        s
    }

    fn with_deps(fqn: &str, deps: Vec<Script>) -> Script {
        let mut s = named(fqn);
        for d in deps {
            s.add_dependency(Arc::new(d));
        }
        s
    }

    #[test]
    fn identity() {
        let s = named("datacenter.clients.web");
        assert_eq!(s.namespace(), "datacenter.clients");
        assert_eq!(s.local_name(), "web");
        assert_eq!(s.id(), format!("{}.{}", s.namespace(), s.local_name()));
        let top = named("web");
        assert_eq!(top.namespace(), "");
        assert_eq!(top.id(), top.local_name());
    }

    #[test]
    fn export_visibility() {
        let mut s = named("lib");
        let scopes = ["foo", "bar", "foo.*"].iter().map(|p| ExportScope::parse(p)).collect();
        s.add_exportable("$x", Number::int(1).into(), Some(scopes));
        assert!(s.can_import("$x", "foo.bar.fii"));
        assert!(!s.can_import("$x", "zog"));
        assert!(s.can_import("$x", "bar"));
        assert!(!s.can_import("$y", "bar"));
        assert!(s.can_import_script("zog"));
        s.set_global_scope(Some(vec![ExportScope::parse("ops")]));
        assert!(!s.can_import_script("zog"));
        assert_eq!(s.importable_exports("zog").count(), 0);
    }

    #[test]
    fn pretty_dependencies_tree() {
        let b = with_deps("b", vec![named("in.titi"), named("in.toto")]);
        let c = with_deps("c", vec![named("out.foo"), named("out.bar")]);
        let a = with_deps("a", vec![b, c]);
        assert_eq!(
            a.pretty_dependencies(),
            "a\n|- b\n   |- in.titi\n   \\- in.toto\n\\- c\n   |- out.foo\n   \\- out.bar\n"
        );
    }

    #[test]
    fn elements_are_declared_once() {
        let mut s = named("app");
        let vm = Element::new(ElementKind::Vm, 1, "app.VM1");
        assert!(s.add_element(vm.clone()));
        assert!(!s.add_vm(vm.clone()));
        assert_eq!(s.vm_set().len(), 1);
        let mut attrs = BTreeMap::new();
        attrs.insert("template".to_owned(), "tiny".to_owned());
        s.set_attributes(&vm, attrs);
        assert_eq!(s.attributes(&vm).unwrap()["template"], "tiny");
    }
}
