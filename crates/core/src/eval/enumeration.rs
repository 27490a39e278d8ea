use super::{Eval, Evaluator};
use crate::ast::{EnumKind, Enumeration, RangeItem};
use crate::error::Reported;
use crate::operand::{BtrpSet, Operand};
use crate::range;

impl<'b> Evaluator<'b> {
    /// The raw candidates of `head[R1, R2]tail`, unresolved.
    pub(super) fn expand_enumeration(&mut self, en: &Enumeration) -> Eval<Vec<String>> {
        let mut parts = Vec::new();
        let mut failed = false;
        for item in &en.items {
            match self.expand_range_item(item) {
                Ok(p) => parts.extend(p),
                Err(Reported) => failed = true,
            }
        }
        if failed {
            return Err(Reported);
        }
        Ok(range::compose(&en.head, &parts, &en.tail))
    }

    fn expand_range_item(&mut self, item: &RangeItem) -> Eval<Vec<String>> {
        match item {
            RangeItem::Single(expr) => {
                let value = self.eval_expr(expr)?;
                let rendered = range::render_single(&value).map(|s| vec![s]);
                self.check(expr.pos(), rendered)
            }
            RangeItem::Interval { from, to } => {
                let lo = self.eval_expr(from);
                let hi = self.eval_expr(to);
                let (lo, hi) = (lo?, hi?);
                let expanded = range::expand_interval(&lo, &hi);
                self.check(from.pos(), expanded)
            }
        }
    }

    /// Resolve every candidate: variables in the symbol table, VMs and
    /// nodes in the naming service. Each miss is reported.
    pub(super) fn eval_enumeration(&mut self, en: &Enumeration) -> Eval<Operand> {
        let names = self.expand_enumeration(en)?;
        let mut found = Vec::with_capacity(names.len());
        let mut failed = false;
        for name in &names {
            let hit = match en.kind {
                EnumKind::Var => self.symbols.get(name).cloned(),
                EnumKind::Vm => self.resolve_vm(name).map(Operand::Element),
                EnumKind::Node => self.resolve_node(name).map(Operand::Element),
            };
            match hit {
                Some(value) => found.push(value),
                None => {
                    let what = match en.kind {
                        EnumKind::Var => "variable",
                        EnumKind::Vm => "VM",
                        EnumKind::Node => "node",
                    };
                    self.report(en.pos, format!("unknown {} '{}'", what, name));
                    failed = true;
                }
            }
        }
        if failed {
            return Err(Reported);
        }
        let (ty, degree) = match found.first() {
            Some(first) => (first.ty(), first.degree()),
            None => return self.fail(en.pos, "the enumeration is empty"),
        };
        let mut set = BtrpSet::new(ty, degree + 1);
        for value in found {
            let inserted = set.insert(value);
            self.check(en.pos, inserted)?;
        }
        Ok(Operand::Set(set))
    }
}
