//! Tree-walking evaluator.
//!
//! Turns the statements of one script into a [`Script`] and a list of
//! diagnostics. Evaluation never stops at the first error: a failing
//! statement reports once, returns [`Reported`], and its siblings still
//! run.

mod declarations;
mod enumeration;
mod expressions;

use crate::ast::{AssignOp, BinaryOp, Block, Expr, Pos, Stmt};
use crate::builder::{InProgress, ScriptBuilder};
use crate::error::{Diagnostic, Reported};
use crate::operand::{ops, BtrpSet, Operand, OperandType};
use crate::script::Script;
use crate::symbols::SymbolsTable;

/// The set of every VM declared by the script.
pub const ME: &str = "$me";

pub(crate) type Eval<T> = Result<T, Reported>;

pub(crate) struct Evaluator<'b> {
    builder: &'b ScriptBuilder,
    file: String,
    /// File stem the local name must match, for file builds
    expected_local: Option<String>,
    script: Script,
    symbols: SymbolsTable,
    diagnostics: Vec<Diagnostic>,
    guard: Option<InProgress<'b>>,
    /// Set once the first statement has been evaluated
    namespace_seen: bool,
}

impl<'b> Evaluator<'b> {
    pub(crate) fn new(builder: &'b ScriptBuilder, file: &str, expected_local: Option<&str>) -> Self {
        Evaluator {
            builder,
            file: file.to_owned(),
            expected_local: expected_local.map(str::to_owned),
            script: Script::new(),
            symbols: SymbolsTable::new(),
            diagnostics: Vec::new(),
            guard: None,
            namespace_seen: false,
        }
    }

    /// Evaluate every statement. The namespace declaration comes first.
    /// A script missing it is still evaluated, without a namespace, to
    /// collect more diagnostics; a declaration refused because the script
    /// is already being built stops the evaluation.
    pub(crate) fn run(mut self, stmts: &[Stmt]) -> (Script, Vec<Diagnostic>) {
        let rest = match stmts.first() {
            Some(first @ Stmt::Namespace { .. }) => {
                if self.eval_stmt(first).is_err() {
                    return self.finish();
                }
                &stmts[1..]
            }
            Some(first) => {
                self.report(first.pos(), "the script must start with a namespace declaration");
                self.namespace_seen = true;
                let me = Operand::Set(BtrpSet::new(OperandType::Vm, 1));
                let declared = self.symbols.declare_immutable(ME, me);
                let _ = self.check(first.pos(), declared);
                stmts
            }
            None => {
                self.report(Pos::new(1, 1), "the script must declare its namespace");
                return self.finish();
            }
        };
        for stmt in rest {
            let _ = self.eval_stmt(stmt);
        }
        self.finish()
    }

    fn finish(mut self) -> (Script, Vec<Diagnostic>) {
        drop(self.guard.take());
        if self.script.id().is_empty() {
            // Names declared outside any namespace die with the build.
            self.builder.naming().release("");
        }
        (self.script, self.diagnostics)
    }

    // ── Diagnostics ──────────────────────────────────────────────────

    fn report(&mut self, pos: Pos, message: impl Into<String>) -> Reported {
        self.diagnostics
            .push(Diagnostic::new(&self.file, pos.line, pos.column, message));
        Reported
    }

    fn fail<T>(&mut self, pos: Pos, message: impl Into<String>) -> Eval<T> {
        Err(self.report(pos, message))
    }

    /// Report the error of `result`, if any, at `pos`.
    fn check<T>(&mut self, pos: Pos, result: Result<T, String>) -> Eval<T> {
        result.map_err(|m| self.report(pos, m))
    }

    // ── Statements ───────────────────────────────────────────────────

    fn eval_stmt(&mut self, stmt: &Stmt) -> Eval<()> {
        match stmt {
            Stmt::Namespace { name, pos } => self.eval_namespace(name, *pos),
            Stmt::Import { id, pos } => self.eval_import(id, *pos),
            Stmt::Export {
                targets,
                scopes,
                pos,
            } => self.eval_export(targets, scopes.as_deref(), *pos),
            Stmt::TemplateAssign {
                target,
                template,
                options,
                pos,
            } => self.eval_template_assign(target, template, options, *pos),
            Stmt::Assign {
                label,
                op,
                value,
                pos,
            } => self.eval_assign(label, *op, value, *pos),
            Stmt::Constraint {
                keyword,
                args,
                continuous,
                pos,
            } => self.eval_constraint(keyword, args, *continuous, *pos),
            Stmt::For {
                var,
                collection,
                body,
                pos,
            } => self.eval_for(var, collection, body, *pos),
            Stmt::If {
                cond,
                then,
                otherwise,
                ..
            } => self.eval_if(cond, then, otherwise.as_ref()),
            Stmt::Block(block) => self.eval_block(block),
        }
    }

    fn eval_block(&mut self, block: &Block) -> Eval<()> {
        for stmt in &block.stmts {
            let _ = self.eval_stmt(stmt);
        }
        Ok(())
    }

    fn eval_if(&mut self, cond: &Expr, then: &Block, otherwise: Option<&Block>) -> Eval<()> {
        let value = self.eval_expr(cond)?;
        let truth = ops::is_true(&value);
        if self.check(cond.pos(), truth)? {
            self.eval_block(then)
        } else if let Some(block) = otherwise {
            self.eval_block(block)
        } else {
            Ok(())
        }
    }

    fn eval_for(&mut self, var: &str, collection: &Expr, body: &Block, pos: Pos) -> Eval<()> {
        let values = match self.eval_expr(collection)? {
            Operand::Set(set) => set,
            other => {
                return self.fail(
                    pos,
                    format!("'for' expects a set, got a '{}'", other.pretty_type()),
                )
            }
        };
        self.symbols.push_scope();
        for value in &values {
            self.symbols.bind_local(var, value.clone());
            let _ = self.eval_block(body);
        }
        self.symbols.pop_scope();
        Ok(())
    }

    fn eval_assign(&mut self, label: &str, op: AssignOp, value: &Expr, pos: Pos) -> Eval<()> {
        let rhs = self.eval_expr(value)?;
        let result = match assign_operator(op) {
            None => rhs,
            Some(bop) => {
                let current = match self.symbols.get(label) {
                    Some(current) => current.clone(),
                    None => return self.fail(pos, format!("unknown variable '{}'", label)),
                };
                let combined = ops::apply_binary(bop, &current, &rhs);
                self.check(pos, combined)?
            }
        };
        let stored = self.symbols.put(label, result);
        self.check(pos, stored)
    }

    fn eval_constraint(
        &mut self,
        keyword: &str,
        args: &[Expr],
        continuous: bool,
        pos: Pos,
    ) -> Eval<()> {
        let builder = self.builder;
        let catalog = match builder.catalog() {
            Some(catalog) => catalog,
            None => return self.fail(pos, "no constraint catalog available"),
        };
        if catalog.get(keyword).is_none() {
            return self.fail(pos, format!("unknown constraint '{}'", keyword));
        }
        let mut values = Vec::with_capacity(args.len());
        let mut failed = false;
        for arg in args {
            match self.eval_expr(arg) {
                Ok(v) => values.push(v),
                Err(Reported) => failed = true,
            }
        }
        if failed {
            return Err(Reported);
        }
        let built = catalog.build(keyword, &values, continuous);
        let constraint = self.check(pos, built)?;
        tracing::trace!(keyword, line = pos.line, "constraint added");
        self.script.add_constraint(constraint);
        Ok(())
    }
}

fn assign_operator(op: AssignOp) -> Option<BinaryOp> {
    match op {
        AssignOp::Set => None,
        AssignOp::Add => Some(BinaryOp::Add),
        AssignOp::Sub => Some(BinaryOp::Sub),
        AssignOp::Mul => Some(BinaryOp::Mul),
        AssignOp::Div => Some(BinaryOp::Div),
        AssignOp::Rem => Some(BinaryOp::Rem),
    }
}
