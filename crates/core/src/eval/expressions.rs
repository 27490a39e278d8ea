use super::{Eval, Evaluator};
use crate::ast::{Expr, Pos};
use crate::error::Reported;
use crate::model::{Element, ElementKind};
use crate::operand::{ops, BtrpSet, Number, Operand};

impl<'b> Evaluator<'b> {
    pub(super) fn eval_expr(&mut self, expr: &Expr) -> Eval<Operand> {
        match expr {
            Expr::Number { raw, pos } => {
                let parsed = Number::parse(raw);
                self.check(*pos, parsed).map(Operand::Number)
            }
            Expr::Str { value, .. } => Ok(Operand::String(value.clone())),
            Expr::Var { label, pos } => match self.symbols.get(label) {
                Some(value) => Ok(value.clone()),
                None => self.fail(*pos, format!("unknown variable '{}'", label)),
            },
            Expr::Vm { name, pos } => match self.resolve_vm(name) {
                Some(vm) => Ok(Operand::Element(vm)),
                None => self.fail(*pos, format!("unknown VM '{}'", name)),
            },
            Expr::Node { name, pos } => match self.resolve_node(name) {
                Some(node) => Ok(Operand::Element(node)),
                None => self.fail(*pos, format!("unknown node '{}'", name)),
            },
            Expr::Enum(en) => self.eval_enumeration(en),
            Expr::SetLiteral { items, pos } => self.eval_set_literal(items, *pos),
            Expr::Binary { op, lhs, rhs, pos } => {
                let l = self.eval_expr(lhs);
                let r = self.eval_expr(rhs);
                let (l, r) = (l?, r?);
                let result = ops::apply_binary(*op, &l, &r);
                self.check(*pos, result)
            }
            Expr::Unary { op, operand, pos } => {
                let value = self.eval_expr(operand)?;
                let result = ops::apply_unary(*op, &value);
                self.check(*pos, result)
            }
        }
    }

    /// `{a, b, c}`: every item shares one type and degree, no duplicates.
    fn eval_set_literal(&mut self, items: &[Expr], pos: Pos) -> Eval<Operand> {
        let mut values = Vec::with_capacity(items.len());
        let mut failed = false;
        for item in items {
            match self.eval_expr(item) {
                Ok(v) => values.push(v),
                Err(Reported) => failed = true,
            }
        }
        if failed {
            return Err(Reported);
        }
        let (ty, degree) = match values.first() {
            Some(first) => (first.ty(), first.degree()),
            None => return self.fail(pos, "empty sets are not allowed"),
        };
        let mut set = BtrpSet::new(ty, degree + 1);
        for (item, value) in items.iter().zip(values) {
            let shown = value.to_string();
            match set.insert(value) {
                Ok(true) => {}
                Ok(false) => {
                    self.report(item.pos(), format!("'{}' is already in the set", shown));
                    failed = true;
                }
                Err(message) => {
                    self.report(item.pos(), message);
                    failed = true;
                }
            }
        }
        if failed {
            return Err(Reported);
        }
        Ok(Operand::Set(set))
    }

    /// A VM name as written in the script: relative to the script, or
    /// fully qualified.
    pub(super) fn resolve_vm(&self, name: &str) -> Option<Element> {
        let naming = self.builder.naming();
        naming
            .resolve(ElementKind::Vm, &self.qualify(name))
            .or_else(|| naming.resolve(ElementKind::Vm, name))
    }

    pub(super) fn resolve_node(&self, name: &str) -> Option<Element> {
        let bare = name.strip_prefix('@').unwrap_or(name);
        self.builder.naming().resolve(ElementKind::Node, bare)
    }

    pub(super) fn qualify(&self, name: &str) -> String {
        match self.script.id() {
            "" => name.to_owned(),
            fqn => format!("{}.{}", fqn, name),
        }
    }
}
