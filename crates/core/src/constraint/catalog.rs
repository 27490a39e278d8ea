use super::param::{ArgValue, ParamSpec};
use super::{Constraint, ConstraintKind};
use crate::operand::Operand;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Validates the arguments of one constraint keyword and builds it.
pub trait ConstraintBuilder: Send + Sync {
    fn keyword(&self) -> &str;

    fn params(&self) -> &[ParamSpec];

    /// Build from arguments already converted by the parameters. Business
    /// rules (disjoint groups, integral amounts) are checked here.
    fn build(&self, args: Vec<ArgValue>) -> Result<ConstraintKind, String>;

    /// `ban(vms: set<VM>, nodes: set<node>)`
    fn signature(&self) -> String {
        let params: Vec<String> = self
            .params()
            .iter()
            .map(|p| format!("{}: {}", p.name, p.pretty_type()))
            .collect();
        format!("{}({})", self.keyword(), params.join(", "))
    }
}

/// Registry of constraint builders, by keyword.
#[derive(Default, Clone)]
pub struct ConstraintsCatalog {
    builders: BTreeMap<String, Arc<dyn ConstraintBuilder>>,
}

impl ConstraintsCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a builder. The first registration of a keyword wins:
    /// returns `false` when the keyword is already taken.
    pub fn register(&mut self, builder: Arc<dyn ConstraintBuilder>) -> bool {
        let keyword = builder.keyword().to_owned();
        if self.builders.contains_key(&keyword) {
            return false;
        }
        self.builders.insert(keyword, builder);
        true
    }

    pub fn get(&self, keyword: &str) -> Option<&Arc<dyn ConstraintBuilder>> {
        self.builders.get(keyword)
    }

    /// Registered keywords, sorted.
    pub fn keywords(&self) -> Vec<&str> {
        self.builders.keys().map(String::as_str).collect()
    }

    /// Check `args` against the signature of `keyword`, then build the
    /// constraint. Any failure is described by exactly one message.
    pub fn build(
        &self,
        keyword: &str,
        args: &[Operand],
        continuous: bool,
    ) -> Result<Constraint, String> {
        let builder = self
            .get(keyword)
            .ok_or_else(|| format!("unknown constraint '{}'", keyword))?;
        let params = builder.params();
        let conforms = params.len() == args.len()
            && params.iter().zip(args).all(|(p, a)| p.is_compatible_with(a));
        if !conforms {
            return Err(format!(
                "unable to call {} with '{}'",
                builder.signature(),
                pretty_call(keyword, args)
            ));
        }
        let values = params
            .iter()
            .zip(args)
            .map(|(p, a)| p.transform(a))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("{}: {}", builder.signature(), e))?;
        let kind = builder
            .build(values)
            .map_err(|e| format!("{}: {}", builder.signature(), e))?;
        Ok(Constraint::new(kind, continuous))
    }
}

/// `ban(set<VM>, number)`
fn pretty_call(keyword: &str, args: &[Operand]) -> String {
    let types: Vec<String> = args.iter().map(|a| a.pretty_type()).collect();
    format!("{}({})", keyword, types.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::default_catalog;
    use crate::model::{Element, ElementKind};
    use crate::operand::{BtrpSet, Number, OperandType};

    struct Noop;

    impl ConstraintBuilder for Noop {
        fn keyword(&self) -> &str {
            "ban"
        }

        fn params(&self) -> &[ParamSpec] {
            &[]
        }

        fn build(&self, _: Vec<ArgValue>) -> Result<ConstraintKind, String> {
            Err("never".into())
        }
    }

    fn vms(ids: &[u32]) -> Operand {
        let elements: Vec<Element> = ids
            .iter()
            .map(|i| Element::new(ElementKind::Vm, *i, &format!("VM{}", i)))
            .collect();
        BtrpSet::of_elements(ElementKind::Vm, &elements).into()
    }

    fn nodes(ids: &[u32]) -> Operand {
        let elements: Vec<Element> = ids
            .iter()
            .map(|i| Element::new(ElementKind::Node, 100 + *i, &format!("N{}", i)))
            .collect();
        BtrpSet::of_elements(ElementKind::Node, &elements).into()
    }

    #[test]
    fn first_registration_wins() {
        let mut catalog = default_catalog();
        assert!(!catalog.register(Arc::new(Noop)));
        assert!(catalog.keywords().contains(&"ban"));
        let mut empty = ConstraintsCatalog::new();
        assert!(empty.register(Arc::new(Noop)));
        assert_eq!(empty.keywords(), vec!["ban"]);
    }

    #[test]
    fn wrong_arity_names_the_signature() {
        let catalog = default_catalog();
        let err = catalog.build("ban", &[vms(&[1])], false).unwrap_err();
        assert_eq!(
            err,
            "unable to call ban(vms: set<VM>, nodes: set<node>) with 'ban(set<VM>)'"
        );
    }

    #[test]
    fn mismatched_types_name_the_signature() {
        let catalog = default_catalog();
        let err = catalog
            .build("ban", &[vms(&[1]), Number::int(3).into()], false)
            .unwrap_err();
        assert!(err.contains("ban(vms: set<VM>, nodes: set<node>)"));
        assert!(err.ends_with("'ban(set<VM>, number)'"));
    }

    #[test]
    fn scalars_are_promoted_to_singletons() {
        let catalog = default_catalog();
        let vm = Element::new(ElementKind::Vm, 1, "VM1");
        let c = catalog.build("ban", &[Operand::from(vm.clone()), nodes(&[1])], true).unwrap();
        assert_eq!(c.involved_vms(), vec![vm]);
        assert!(c.is_continuous());
    }

    #[test]
    fn empty_sets_are_rejected_by_transform() {
        let catalog = default_catalog();
        let empty: Operand = BtrpSet::new(OperandType::Vm, 1).into();
        let err = catalog.build("spread", &[empty], false).unwrap_err();
        assert_eq!(err, "spread(vms: set<VM>): 'vms' expects a non-empty set");
    }

    #[test]
    fn unknown_keyword() {
        assert_eq!(
            ConstraintsCatalog::new().build("foo", &[], false).unwrap_err(),
            "unknown constraint 'foo'"
        );
    }
}
