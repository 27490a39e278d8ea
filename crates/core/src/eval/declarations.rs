use super::{Eval, Evaluator, ME};
use crate::ast::{EnumKind, Expr, Pos, TemplateOption};
use crate::error::Reported;
use crate::model::ElementKind;
use crate::namespace::{self, ExportScope};
use crate::operand::{BtrpSet, Operand, OperandType};
use std::collections::BTreeMap;

impl<'b> Evaluator<'b> {
    pub(super) fn eval_namespace(&mut self, name: &str, pos: Pos) -> Eval<()> {
        if self.namespace_seen {
            let message = if self.script.id().is_empty() {
                "the namespace must be declared by the first statement"
            } else {
                "the namespace is already declared"
            };
            return self.fail(pos, message);
        }
        self.namespace_seen = true;
        let builder = self.builder;
        let guard = match builder.enter(name) {
            Some(guard) => guard,
            None => return self.fail(pos, format!("cyclic import: '{}' imports itself", name)),
        };
        self.guard = Some(guard);
        self.script.set_fqn(name);
        builder.naming().release(name);
        let me = Operand::Set(BtrpSet::new(OperandType::Vm, 1));
        let declared = self.symbols.declare_immutable(ME, me);
        self.check(pos, declared)?;
        if let Some(expected) = self.expected_local.clone() {
            let local = self.script.local_name().to_owned();
            if local != expected {
                self.report(
                    pos,
                    format!(
                        "the script '{}' must be stored in '{}.btrp', not '{}.btrp'",
                        name, local, expected
                    ),
                );
            }
        }
        Ok(())
    }

    pub(super) fn eval_import(&mut self, id: &str, pos: Pos) -> Eval<()> {
        let builder = self.builder;
        if !id.ends_with(".*") && builder.is_in_progress(id) {
            return self.fail(pos, format!("cyclic import of '{}'", id));
        }
        let deps = match builder.includes().get_scripts(id, builder) {
            Ok(deps) => deps,
            Err(e) => {
                let cause = e.to_string().replace('\n', "; ");
                return self.fail(pos, format!("unable to import '{}': {}", id, cause));
            }
        };
        tracing::debug!(importer = self.script.id(), id, count = deps.len(), "import resolved");
        for dep in &deps {
            self.script.add_dependency(dep.clone());
        }
        let importer = self.script.namespace().to_owned();
        let resolved = namespace::resolve_import(id, &deps, &importer, &mut self.symbols);
        self.check(pos, resolved)
    }

    pub(super) fn eval_export(
        &mut self,
        targets: &[Expr],
        scopes: Option<&[String]>,
        pos: Pos,
    ) -> Eval<()> {
        let scopes: Option<Vec<ExportScope>> =
            scopes.map(|s| s.iter().map(|p| ExportScope::parse(p)).collect());
        let mut failed = false;
        for target in targets {
            match target {
                Expr::Var { label, .. } if label == ME => {
                    self.script.set_global_scope(scopes.clone());
                }
                Expr::Var { label, pos } => failed |= self.export_label(label, *pos, &scopes).is_err(),
                Expr::Enum(en) if en.kind == EnumKind::Var => {
                    let labels = match self.expand_enumeration(en) {
                        Ok(labels) => labels,
                        Err(Reported) => {
                            failed = true;
                            continue;
                        }
                    };
                    for label in labels {
                        failed |= self.export_label(&label, en.pos, &scopes).is_err();
                    }
                }
                other => {
                    self.report(other.pos(), "only variables can be exported");
                    failed = true;
                }
            }
        }
        if failed {
            return Err(Reported);
        }
        tracing::trace!(line = pos.line, count = targets.len(), "exported");
        Ok(())
    }

    fn export_label(
        &mut self,
        label: &str,
        pos: Pos,
        scopes: &Option<Vec<ExportScope>>,
    ) -> Eval<()> {
        match self.symbols.get(label).cloned() {
            Some(value) => {
                self.script.add_exportable(label, value, scopes.clone());
                Ok(())
            }
            None => self.fail(pos, format!("unknown variable '{}'", label)),
        }
    }

    pub(super) fn eval_template_assign(
        &mut self,
        target: &Expr,
        template: &str,
        options: &[TemplateOption],
        pos: Pos,
    ) -> Eval<()> {
        let builder = self.builder;
        let tpl = match builder.templates().template(template) {
            Some(tpl) => tpl,
            None => return self.fail(pos, format!("unknown template '{}'", template)),
        };
        let options = self.eval_options(options)?;
        let mut targets = Vec::new();
        self.collect_targets(target, &mut targets)?;

        let owner = self.script.id().to_owned();
        let mut failed = false;
        let mut new_vms = false;
        for (kind, name, tpos) in targets {
            if kind != tpl.kind() {
                let shown = match kind {
                    ElementKind::Vm => name.clone(),
                    ElementKind::Node => format!("@{}", name),
                };
                self.report(
                    tpos,
                    format!(
                        "template '{}' builds {}s, it cannot declare the {} '{}'",
                        template,
                        tpl.kind(),
                        kind,
                        shown
                    ),
                );
                failed = true;
                continue;
            }
            let registered = match kind {
                ElementKind::Vm => self.qualify(&name),
                ElementKind::Node => name,
            };
            match tpl.build(builder.naming(), &registered, &owner, &options) {
                Ok((element, attrs)) => {
                    self.script.set_attributes(&element, attrs);
                    new_vms |= self.script.add_element(element) && kind == ElementKind::Vm;
                }
                Err(message) => {
                    self.report(tpos, message);
                    failed = true;
                }
            }
        }
        if new_vms {
            let me = Operand::Set(self.script.vm_set());
            self.symbols.overwrite(ME, me);
        }
        if failed {
            Err(Reported)
        } else {
            Ok(())
        }
    }

    /// `key` alone stands for `key=true`.
    fn eval_options(&mut self, options: &[TemplateOption]) -> Eval<BTreeMap<String, String>> {
        let mut out = BTreeMap::new();
        let mut failed = false;
        for opt in options {
            let value = match &opt.value {
                None => "true".to_owned(),
                Some(expr) => match self.eval_expr(expr) {
                    Ok(Operand::String(s)) => s,
                    Ok(other) => other.to_string(),
                    Err(Reported) => {
                        failed = true;
                        continue;
                    }
                },
            };
            out.insert(opt.key.clone(), value);
        }
        if failed {
            return Err(Reported);
        }
        Ok(out)
    }

    /// Flatten the left-hand side of a template assignment into the
    /// names to declare. Node names lose their `@`.
    fn collect_targets(
        &mut self,
        target: &Expr,
        out: &mut Vec<(ElementKind, String, Pos)>,
    ) -> Eval<()> {
        match target {
            Expr::Vm { name, pos } => {
                out.push((ElementKind::Vm, name.clone(), *pos));
                Ok(())
            }
            Expr::Node { name, pos } => {
                out.push((ElementKind::Node, strip_node(name), *pos));
                Ok(())
            }
            Expr::Enum(en) if en.kind != EnumKind::Var => {
                let names = self.expand_enumeration(en)?;
                for name in names {
                    match en.kind {
                        EnumKind::Node => out.push((ElementKind::Node, strip_node(&name), en.pos)),
                        _ => out.push((ElementKind::Vm, name, en.pos)),
                    }
                }
                Ok(())
            }
            Expr::SetLiteral { items, .. } => {
                let mut failed = false;
                for item in items {
                    failed |= self.collect_targets(item, out).is_err();
                }
                if failed {
                    Err(Reported)
                } else {
                    Ok(())
                }
            }
            other => self.fail(
                other.pos(),
                "only VM identifiers and node names can be declared",
            ),
        }
    }
}

fn strip_node(name: &str) -> String {
    name.strip_prefix('@').unwrap_or(name).to_owned()
}
