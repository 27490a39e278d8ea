//! Placement constraints, their parameters and the catalog of builders.
//!
//! Constraints are only built here, never solved.

mod builtins;
mod catalog;
mod param;

pub use builtins::default_catalog;
pub use catalog::{ConstraintBuilder, ConstraintsCatalog};
pub use param::{ArgValue, ParamSpec};

use crate::model::Element;
use serde_json::{json, Value};
use std::collections::HashSet;

/// One constraint variant per builtin keyword, plus `Other` for builders
/// registered by callers.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKind {
    Ban { vms: Vec<Element>, nodes: Vec<Element> },
    Fence { vms: Vec<Element>, nodes: Vec<Element> },
    Spread { vms: Vec<Element> },
    Among { vms: Vec<Element>, groups: Vec<Vec<Element>> },
    Split { groups: Vec<Vec<Element>> },
    SplitAmong { vms: Vec<Vec<Element>>, nodes: Vec<Vec<Element>> },
    Lonely { vms: Vec<Element> },
    Gather { vms: Vec<Element> },
    Root { vms: Vec<Element> },
    Killed { vms: Vec<Element> },
    Ready { vms: Vec<Element> },
    Running { vms: Vec<Element> },
    Sleeping { vms: Vec<Element> },
    Offline { nodes: Vec<Element> },
    Online { nodes: Vec<Element> },
    Quarantine { nodes: Vec<Element> },
    Preserve { vms: Vec<Element>, resource: String, amount: u64 },
    CumulatedResourceCapacity { nodes: Vec<Element>, resource: String, amount: u64 },
    SingleResourceCapacity { nodes: Vec<Element>, resource: String, amount: u64 },
    CumulatedRunningCapacity { nodes: Vec<Element>, amount: u64 },
    SingleRunningCapacity { nodes: Vec<Element>, amount: u64 },
    Seq { vms: Vec<Element> },
    Other { name: String, vms: Vec<Element>, nodes: Vec<Element> },
}

impl ConstraintKind {
    pub fn name(&self) -> &str {
        match self {
            ConstraintKind::Ban { .. } => "ban",
            ConstraintKind::Fence { .. } => "fence",
            ConstraintKind::Spread { .. } => "spread",
            ConstraintKind::Among { .. } => "among",
            ConstraintKind::Split { .. } => "split",
            ConstraintKind::SplitAmong { .. } => "splitAmong",
            ConstraintKind::Lonely { .. } => "lonely",
            ConstraintKind::Gather { .. } => "gather",
            ConstraintKind::Root { .. } => "root",
            ConstraintKind::Killed { .. } => "killed",
            ConstraintKind::Ready { .. } => "ready",
            ConstraintKind::Running { .. } => "running",
            ConstraintKind::Sleeping { .. } => "sleeping",
            ConstraintKind::Offline { .. } => "offline",
            ConstraintKind::Online { .. } => "online",
            ConstraintKind::Quarantine { .. } => "quarantine",
            ConstraintKind::Preserve { .. } => "preserve",
            ConstraintKind::CumulatedResourceCapacity { .. } => "cumulatedResourceCapacity",
            ConstraintKind::SingleResourceCapacity { .. } => "singleResourceCapacity",
            ConstraintKind::CumulatedRunningCapacity { .. } => "cumulatedRunningCapacity",
            ConstraintKind::SingleRunningCapacity { .. } => "singleRunningCapacity",
            ConstraintKind::Seq { .. } => "seq",
            ConstraintKind::Other { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    kind: ConstraintKind,
    continuous: bool,
}

impl Constraint {
    pub fn new(kind: ConstraintKind, continuous: bool) -> Self {
        Constraint { kind, continuous }
    }

    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Declared with the `>>` prefix.
    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    /// Every VM the constraint mentions, in order, without duplicates.
    pub fn involved_vms(&self) -> Vec<Element> {
        use ConstraintKind::*;
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        match &self.kind {
            Ban { vms, .. }
            | Fence { vms, .. }
            | Spread { vms }
            | Among { vms, .. }
            | Lonely { vms }
            | Gather { vms }
            | Root { vms }
            | Killed { vms }
            | Ready { vms }
            | Running { vms }
            | Sleeping { vms }
            | Preserve { vms, .. }
            | Seq { vms }
            | Other { vms, .. } => push_unique(&mut out, &mut seen, vms),
            Split { groups } | SplitAmong { vms: groups, .. } => {
                for g in groups {
                    push_unique(&mut out, &mut seen, g);
                }
            }
            Offline { .. }
            | Online { .. }
            | Quarantine { .. }
            | CumulatedResourceCapacity { .. }
            | SingleResourceCapacity { .. }
            | CumulatedRunningCapacity { .. }
            | SingleRunningCapacity { .. } => {}
        }
        out
    }

    /// Every node the constraint mentions, in order, without duplicates.
    pub fn involved_nodes(&self) -> Vec<Element> {
        use ConstraintKind::*;
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        match &self.kind {
            Ban { nodes, .. }
            | Fence { nodes, .. }
            | Offline { nodes }
            | Online { nodes }
            | Quarantine { nodes }
            | CumulatedResourceCapacity { nodes, .. }
            | SingleResourceCapacity { nodes, .. }
            | CumulatedRunningCapacity { nodes, .. }
            | SingleRunningCapacity { nodes, .. }
            | Other { nodes, .. } => push_unique(&mut out, &mut seen, nodes),
            Among { groups, .. } | SplitAmong { nodes: groups, .. } => {
                for g in groups {
                    push_unique(&mut out, &mut seen, g);
                }
            }
            Spread { .. }
            | Split { .. }
            | Lonely { .. }
            | Gather { .. }
            | Root { .. }
            | Killed { .. }
            | Ready { .. }
            | Running { .. }
            | Sleeping { .. }
            | Preserve { .. }
            | Seq { .. } => {}
        }
        out
    }

    pub fn to_json_value(&self) -> Value {
        use ConstraintKind::*;
        let mut v = json!({
            "kind": self.name(),
            "continuous": self.continuous,
        });
        let fields = match &self.kind {
            Ban { vms, nodes } | Fence { vms, nodes } => {
                json!({ "vms": names(vms), "nodes": names(nodes) })
            }
            Spread { vms } | Lonely { vms } | Gather { vms } | Root { vms } | Killed { vms }
            | Ready { vms } | Running { vms } | Sleeping { vms } | Seq { vms } => {
                json!({ "vms": names(vms) })
            }
            Among { vms, groups } => json!({ "vms": names(vms), "nodes": group_names(groups) }),
            Split { groups } => json!({ "vms": group_names(groups) }),
            SplitAmong { vms, nodes } => {
                json!({ "vms": group_names(vms), "nodes": group_names(nodes) })
            }
            Offline { nodes } | Online { nodes } | Quarantine { nodes } => {
                json!({ "nodes": names(nodes) })
            }
            Preserve { vms, resource, amount } => {
                json!({ "vms": names(vms), "resource": resource, "amount": amount })
            }
            CumulatedResourceCapacity { nodes, resource, amount }
            | SingleResourceCapacity { nodes, resource, amount } => {
                json!({ "nodes": names(nodes), "resource": resource, "amount": amount })
            }
            CumulatedRunningCapacity { nodes, amount } | SingleRunningCapacity { nodes, amount } => {
                json!({ "nodes": names(nodes), "amount": amount })
            }
            Other { vms, nodes, .. } => json!({ "vms": names(vms), "nodes": names(nodes) }),
        };
        if let (Some(obj), Value::Object(extra)) = (v.as_object_mut(), fields) {
            obj.extend(extra);
        }
        v
    }
}

fn push_unique<'a>(
    out: &mut Vec<Element>,
    seen: &mut HashSet<&'a Element>,
    elements: &'a [Element],
) {
    for e in elements {
        if seen.insert(e) {
            out.push(e.clone());
        }
    }
}

fn names(elements: &[Element]) -> Vec<String> {
    elements.iter().map(|e| e.to_string()).collect()
}

fn group_names(groups: &[Vec<Element>]) -> Vec<Vec<String>> {
    groups.iter().map(|g| names(g)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ElementKind;

    fn vm(id: u32) -> Element {
        Element::new(ElementKind::Vm, id, &format!("app.VM{}", id))
    }

    fn node(id: u32) -> Element {
        Element::new(ElementKind::Node, 100 + id, &format!("N{}", id))
    }

    #[test]
    fn involved_elements_flatten_groups() {
        let c = Constraint::new(
            ConstraintKind::SplitAmong {
                vms: vec![vec![vm(1), vm(2)], vec![vm(3)]],
                nodes: vec![vec![node(1)], vec![node(2), node(1)]],
            },
            false,
        );
        assert_eq!(c.involved_vms(), vec![vm(1), vm(2), vm(3)]);
        assert_eq!(c.involved_nodes(), vec![node(1), node(2)]);
    }

    #[test]
    fn json_view() {
        let c = Constraint::new(
            ConstraintKind::Preserve {
                vms: vec![vm(1)],
                resource: "cpu".into(),
                amount: 4,
            },
            true,
        );
        assert_eq!(
            c.to_json_value(),
            json!({
                "kind": "preserve",
                "continuous": true,
                "vms": ["app.VM1"],
                "resource": "cpu",
                "amount": 4,
            })
        );
        assert!(c.involved_nodes().is_empty());
    }
}
