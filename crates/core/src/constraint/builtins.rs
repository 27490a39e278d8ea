//! The constraints every catalog ships with.

use super::catalog::{ConstraintBuilder, ConstraintsCatalog};
use super::param::{ArgValue, ParamSpec};
use super::ConstraintKind;
use crate::model::Element;
use crate::operand::OperandType;
use std::collections::HashSet;
use std::sync::Arc;

type Make = fn(Args) -> Result<ConstraintKind, String>;

struct Builtin {
    keyword: &'static str,
    params: Vec<ParamSpec>,
    make: Make,
}

impl ConstraintBuilder for Builtin {
    fn keyword(&self) -> &str {
        self.keyword
    }

    fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    fn build(&self, args: Vec<ArgValue>) -> Result<ConstraintKind, String> {
        (self.make)(Args(args.into_iter()))
    }
}

/// Positional access to converted arguments.
struct Args(std::vec::IntoIter<ArgValue>);

impl Args {
    fn next(&mut self) -> Result<ArgValue, String> {
        self.0.next().ok_or_else(|| "missing argument".to_owned())
    }

    fn elements(&mut self) -> Result<Vec<Element>, String> {
        self.next()?.into_elements()
    }

    fn groups(&mut self) -> Result<Vec<Vec<Element>>, String> {
        self.next()?.into_groups()
    }

    fn text(&mut self) -> Result<String, String> {
        self.next()?.into_text()
    }

    fn amount(&mut self, param: &str) -> Result<u64, String> {
        self.next()?.into_amount(param)
    }
}

fn disjoint(groups: &[Vec<Element>], what: &str) -> Result<(), String> {
    let mut seen = HashSet::new();
    for e in groups.iter().flatten() {
        if !seen.insert(e) {
            return Err(format!("{} groups must be disjoint, '{}' belongs to several", what, e));
        }
    }
    Ok(())
}

fn vms() -> ParamSpec {
    ParamSpec::set("vms", OperandType::Vm)
}

fn nodes() -> ParamSpec {
    ParamSpec::set("nodes", OperandType::Node)
}

fn vm_rule(keyword: &'static str, make: Make) -> Builtin {
    Builtin {
        keyword,
        params: vec![vms()],
        make,
    }
}

fn node_rule(keyword: &'static str, make: Make) -> Builtin {
    Builtin {
        keyword,
        params: vec![nodes()],
        make,
    }
}

fn resource_rule(keyword: &'static str, make: Make) -> Builtin {
    Builtin {
        keyword,
        params: vec![
            nodes(),
            ParamSpec::string("resource"),
            ParamSpec::number("amount"),
        ],
        make,
    }
}

fn running_rule(keyword: &'static str, make: Make) -> Builtin {
    Builtin {
        keyword,
        params: vec![nodes(), ParamSpec::number("amount")],
        make,
    }
}

fn builtins() -> Vec<Builtin> {
    use ConstraintKind as K;
    vec![
        Builtin {
            keyword: "ban",
            params: vec![vms(), nodes()],
            make: |mut a| {
                Ok(K::Ban {
                    vms: a.elements()?,
                    nodes: a.elements()?,
                })
            },
        },
        Builtin {
            keyword: "fence",
            params: vec![vms(), nodes()],
            make: |mut a| {
                Ok(K::Fence {
                    vms: a.elements()?,
                    nodes: a.elements()?,
                })
            },
        },
        vm_rule("spread", |mut a| Ok(K::Spread { vms: a.elements()? })),
        Builtin {
            keyword: "among",
            params: vec![vms(), ParamSpec::groups("nodes", OperandType::Node)],
            make: |mut a| {
                let vms = a.elements()?;
                let mut groups = a.groups()?;
                if groups.len() == 1 {
                    let nodes = groups.remove(0);
                    return Ok(K::Fence { vms, nodes });
                }
                disjoint(&groups, "node")?;
                Ok(K::Among { vms, groups })
            },
        },
        Builtin {
            keyword: "split",
            params: vec![ParamSpec::groups("vms", OperandType::Vm)],
            make: |mut a| {
                let groups = a.groups()?;
                disjoint(&groups, "VM")?;
                Ok(K::Split { groups })
            },
        },
        Builtin {
            keyword: "splitAmong",
            params: vec![
                ParamSpec::groups("vms", OperandType::Vm),
                ParamSpec::groups("nodes", OperandType::Node),
            ],
            make: |mut a| {
                let vms = a.groups()?;
                let nodes = a.groups()?;
                disjoint(&vms, "VM")?;
                disjoint(&nodes, "node")?;
                if vms.len() > nodes.len() {
                    return Err(format!(
                        "{} VM groups cannot be split among {} node groups",
                        vms.len(),
                        nodes.len()
                    ));
                }
                Ok(K::SplitAmong { vms, nodes })
            },
        },
        vm_rule("lonely", |mut a| Ok(K::Lonely { vms: a.elements()? })),
        vm_rule("gather", |mut a| Ok(K::Gather { vms: a.elements()? })),
        vm_rule("root", |mut a| Ok(K::Root { vms: a.elements()? })),
        vm_rule("killed", |mut a| Ok(K::Killed { vms: a.elements()? })),
        vm_rule("ready", |mut a| Ok(K::Ready { vms: a.elements()? })),
        vm_rule("running", |mut a| Ok(K::Running { vms: a.elements()? })),
        vm_rule("sleeping", |mut a| Ok(K::Sleeping { vms: a.elements()? })),
        node_rule("offline", |mut a| Ok(K::Offline { nodes: a.elements()? })),
        node_rule("online", |mut a| Ok(K::Online { nodes: a.elements()? })),
        node_rule("quarantine", |mut a| Ok(K::Quarantine { nodes: a.elements()? })),
        Builtin {
            keyword: "preserve",
            params: vec![
                vms(),
                ParamSpec::string("resource"),
                ParamSpec::number("amount"),
            ],
            make: |mut a| {
                Ok(K::Preserve {
                    vms: a.elements()?,
                    resource: a.text()?,
                    amount: a.amount("amount")?,
                })
            },
        },
        resource_rule("cumulatedResourceCapacity", |mut a| {
            Ok(K::CumulatedResourceCapacity {
                nodes: a.elements()?,
                resource: a.text()?,
                amount: a.amount("amount")?,
            })
        }),
        resource_rule("singleResourceCapacity", |mut a| {
            Ok(K::SingleResourceCapacity {
                nodes: a.elements()?,
                resource: a.text()?,
                amount: a.amount("amount")?,
            })
        }),
        running_rule("cumulatedRunningCapacity", |mut a| {
            Ok(K::CumulatedRunningCapacity {
                nodes: a.elements()?,
                amount: a.amount("amount")?,
            })
        }),
        running_rule("singleRunningCapacity", |mut a| {
            Ok(K::SingleRunningCapacity {
                nodes: a.elements()?,
                amount: a.amount("amount")?,
            })
        }),
        Builtin {
            keyword: "seq",
            params: vec![ParamSpec::list("vms", OperandType::Vm)],
            make: |mut a| Ok(K::Seq { vms: a.elements()? }),
        },
    ]
}

/// A catalog holding every builtin constraint.
pub fn default_catalog() -> ConstraintsCatalog {
    let mut catalog = ConstraintsCatalog::new();
    for builtin in builtins() {
        catalog.register(Arc::new(builtin));
    }
    catalog
}
