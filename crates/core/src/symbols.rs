//! Scoped symbol table.
//!
//! A stack of scopes mapping variable labels (`$x`) to operands. Lookups
//! walk from the innermost scope outwards; writes go to the innermost
//! scope unless the label is already bound further out.

use crate::operand::Operand;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Binding {
    value: Operand,
    mutable: bool,
}

#[derive(Debug, Clone)]
pub struct SymbolsTable {
    scopes: Vec<HashMap<String, Binding>>,
}

impl Default for SymbolsTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolsTable {
    /// A table with a single, global scope.
    pub fn new() -> Self {
        SymbolsTable {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Drop the innermost scope. The global scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Declare an immutable binding in the innermost scope. Fails when the
    /// label is already declared in that scope.
    pub fn declare_immutable(&mut self, label: &str, value: Operand) -> Result<(), String> {
        let scope = self.innermost();
        if scope.contains_key(label) {
            return Err(format!("variable '{}' is already declared", label));
        }
        scope.insert(
            label.to_owned(),
            Binding {
                value,
                mutable: false,
            },
        );
        Ok(())
    }

    /// Bind or rebind a mutable label. An existing binding is updated in
    /// the scope that holds it; immutable bindings are rejected.
    pub fn put(&mut self, label: &str, value: Operand) -> Result<(), String> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(binding) = scope.get_mut(label) {
                if !binding.mutable {
                    return Err(format!("unable to re-assign the immutable variable '{}'", label));
                }
                binding.value = value;
                return Ok(());
            }
        }
        self.innermost().insert(
            label.to_owned(),
            Binding {
                value,
                mutable: true,
            },
        );
        Ok(())
    }

    /// Bind a mutable label in the innermost scope, shadowing any outer
    /// binding. Used for loop variables.
    pub fn bind_local(&mut self, label: &str, value: Operand) {
        self.innermost().insert(
            label.to_owned(),
            Binding {
                value,
                mutable: true,
            },
        );
    }

    pub fn get(&self, label: &str) -> Option<&Operand> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(label))
            .map(|b| &b.value)
    }

    pub fn is_declared(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn is_immutable(&self, label: &str) -> bool {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(label))
            .is_some_and(|b| !b.mutable)
    }

    /// Remove the innermost binding of `label`. Returns whether one existed.
    pub fn remove(&mut self, label: &str) -> bool {
        for scope in self.scopes.iter_mut().rev() {
            if scope.remove(label).is_some() {
                return true;
            }
        }
        false
    }

    /// Every label visible from the innermost scope, sorted.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self
            .scopes
            .iter()
            .flat_map(|scope| scope.keys().map(String::as_str))
            .collect();
        labels.sort_unstable();
        labels.dedup();
        labels
    }

    /// Replace the value of an existing binding, mutable or not. Used to
    /// grow `$me` as VMs are declared.
    pub(crate) fn overwrite(&mut self, label: &str, value: Operand) -> bool {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(binding) = scope.get_mut(label) {
                binding.value = value;
                return true;
            }
        }
        false
    }

    fn innermost(&mut self) -> &mut HashMap<String, Binding> {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }
}
