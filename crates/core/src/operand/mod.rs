//! Runtime values produced by the evaluator.
//!
//! Every operand has a type and a degree: the nesting depth of sets, 0 for
//! scalars. The elements of a set all share `(type, degree - 1)`.

mod number;
pub mod ops;

pub use number::{Number, NumberValue, Radix};

use crate::model::{Element, ElementKind};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandType {
    Number,
    String,
    Vm,
    Node,
}

impl From<ElementKind> for OperandType {
    fn from(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Vm => OperandType::Vm,
            ElementKind::Node => OperandType::Node,
        }
    }
}

impl fmt::Display for OperandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandType::Number => write!(f, "number"),
            OperandType::String => write!(f, "string"),
            OperandType::Vm => write!(f, "VM"),
            OperandType::Node => write!(f, "node"),
        }
    }
}

/// `number`, `set<VM>`, `set<set<node>>`...
pub fn pretty_type(ty: OperandType, degree: u32) -> String {
    let mut s = String::new();
    for _ in 0..degree {
        s.push_str("set<");
    }
    s.push_str(&ty.to_string());
    for _ in 0..degree {
        s.push('>');
    }
    s
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(Number),
    String(String),
    Element(Element),
    Set(BtrpSet),
}

impl Operand {
    pub fn ty(&self) -> OperandType {
        match self {
            Operand::Number(_) => OperandType::Number,
            Operand::String(_) => OperandType::String,
            Operand::Element(e) => e.kind().into(),
            Operand::Set(s) => s.ty(),
        }
    }

    pub fn degree(&self) -> u32 {
        match self {
            Operand::Set(s) => s.degree(),
            _ => 0,
        }
    }

    pub fn pretty_type(&self) -> String {
        pretty_type(self.ty(), self.degree())
    }

    pub fn as_set(&self) -> Option<&BtrpSet> {
        match self {
            Operand::Set(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Number> for Operand {
    fn from(n: Number) -> Self {
        Operand::Number(n)
    }
}

impl From<Element> for Operand {
    fn from(e: Element) -> Self {
        Operand::Element(e)
    }
}

impl From<BtrpSet> for Operand {
    fn from(s: BtrpSet) -> Self {
        Operand::Set(s)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Number(n) => write!(f, "{}", n),
            Operand::String(s) => write!(f, "\"{}\"", s),
            Operand::Element(e) => write!(f, "{}", e),
            Operand::Set(s) => write!(f, "{}", s),
        }
    }
}

// ──────────────────────────────────────────────
// Sets
// ──────────────────────────────────────────────

/// Insertion-ordered set of operands sharing one `(type, degree - 1)`.
#[derive(Debug, Clone)]
pub struct BtrpSet {
    ty: OperandType,
    degree: u32,
    values: Vec<Operand>,
    /// Element values, hashed for membership tests
    index: HashSet<Element>,
}

impl BtrpSet {
    /// An empty set of the given type; `degree` is at least 1.
    pub fn new(ty: OperandType, degree: u32) -> Self {
        BtrpSet {
            ty,
            degree: degree.max(1),
            values: Vec::new(),
            index: HashSet::new(),
        }
    }

    /// A degree-1 set of elements, duplicates dropped.
    pub fn of_elements<'e>(kind: ElementKind, elements: impl IntoIterator<Item = &'e Element>) -> Self {
        let mut set = BtrpSet::new(kind.into(), 1);
        for e in elements {
            set.push_unique(Operand::Element(e.clone()));
        }
        set
    }

    pub fn ty(&self) -> OperandType {
        self.ty
    }

    pub fn degree(&self) -> u32 {
        self.degree
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Operand] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operand> {
        self.values.iter()
    }

    pub fn contains(&self, op: &Operand) -> bool {
        match op {
            Operand::Element(e) => self.index.contains(e),
            _ => self.values.contains(op),
        }
    }

    /// Whether `op` has the type and degree of this set's elements.
    pub fn accepts(&self, op: &Operand) -> bool {
        op.ty() == self.ty && op.degree() + 1 == self.degree
    }

    /// Insert `op` unless already present. Returns `Ok(false)` for a
    /// duplicate, and an error when `op` does not fit the set.
    pub fn insert(&mut self, op: Operand) -> Result<bool, String> {
        if !self.accepts(&op) {
            return Err(format!(
                "unable to add a '{}' to a '{}'",
                op.pretty_type(),
                pretty_type(self.ty, self.degree)
            ));
        }
        Ok(self.push_unique(op))
    }

    fn push_unique(&mut self, op: Operand) -> bool {
        if self.contains(&op) {
            return false;
        }
        if let Operand::Element(e) = &op {
            self.index.insert(e.clone());
        }
        self.values.push(op);
        true
    }

    /// Every element operand, flattening nested sets.
    pub fn elements(&self) -> Vec<Element> {
        let mut out = Vec::new();
        for v in &self.values {
            match v {
                Operand::Element(e) => out.push(e.clone()),
                Operand::Set(s) => out.extend(s.elements()),
                _ => {}
            }
        }
        out
    }
}

impl PartialEq for BtrpSet {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty
            && self.degree == other.degree
            && self.values.len() == other.values.len()
            && self.values.iter().all(|v| other.contains(v))
    }
}

impl<'a> IntoIterator for &'a BtrpSet {
    type Item = &'a Operand;
    type IntoIter = std::slice::Iter<'a, Operand>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl fmt::Display for BtrpSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "}}")
    }
}
