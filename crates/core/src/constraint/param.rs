use crate::model::Element;
use crate::operand::{pretty_type, Number, Operand, OperandType};

/// Signature of one constraint parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: OperandType,
    pub degree: u32,
    pub allow_empty: bool,
    /// Rendered as `list<..>`; the argument order is meaningful
    pub ordered: bool,
}

/// A converted constraint argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Elements(Vec<Element>),
    Groups(Vec<Vec<Element>>),
    Number(Number),
    Text(String),
}

impl ParamSpec {
    pub fn set(name: &'static str, ty: OperandType) -> Self {
        ParamSpec {
            name,
            ty,
            degree: 1,
            allow_empty: false,
            ordered: false,
        }
    }

    pub fn groups(name: &'static str, ty: OperandType) -> Self {
        ParamSpec {
            degree: 2,
            ..ParamSpec::set(name, ty)
        }
    }

    pub fn list(name: &'static str, ty: OperandType) -> Self {
        ParamSpec {
            ordered: true,
            ..ParamSpec::set(name, ty)
        }
    }

    pub fn number(name: &'static str) -> Self {
        ParamSpec {
            name,
            ty: OperandType::Number,
            degree: 0,
            allow_empty: false,
            ordered: false,
        }
    }

    pub fn string(name: &'static str) -> Self {
        ParamSpec {
            ty: OperandType::String,
            ..ParamSpec::number(name)
        }
    }

    pub fn allowing_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    /// Same type, and same degree or a scalar where a set is expected.
    pub fn is_compatible_with(&self, op: &Operand) -> bool {
        op.ty() == self.ty && (op.degree() == self.degree || (self.degree == 1 && op.degree() == 0))
    }

    pub fn pretty_type(&self) -> String {
        let inner = pretty_type(self.ty, self.degree);
        if self.ordered && self.degree > 0 {
            format!("list{}", &inner["set".len()..])
        } else {
            inner
        }
    }

    /// Convert an operand already checked by `is_compatible_with`.
    pub fn transform(&self, op: &Operand) -> Result<ArgValue, String> {
        match (self.degree, op) {
            (0, Operand::Number(n)) => Ok(ArgValue::Number(*n)),
            (0, Operand::String(s)) => Ok(ArgValue::Text(s.clone())),
            (1, Operand::Element(e)) => Ok(ArgValue::Elements(vec![e.clone()])),
            (1, Operand::Set(s)) => {
                let elements = s.elements();
                self.check_not_empty(elements.is_empty())?;
                Ok(ArgValue::Elements(elements))
            }
            (2, Operand::Set(s)) => {
                let groups: Vec<Vec<Element>> = s
                    .iter()
                    .map(|g| g.as_set().map(|g| g.elements()).unwrap_or_default())
                    .collect();
                self.check_not_empty(groups.is_empty() || groups.iter().any(Vec::is_empty))?;
                Ok(ArgValue::Groups(groups))
            }
            _ => Err(format!(
                "'{}' expects a '{}', got a '{}'",
                self.name,
                self.pretty_type(),
                op.pretty_type()
            )),
        }
    }

    fn check_not_empty(&self, empty: bool) -> Result<(), String> {
        if empty && !self.allow_empty {
            return Err(format!("'{}' expects a non-empty set", self.name));
        }
        Ok(())
    }
}

impl ArgValue {
    pub fn into_elements(self) -> Result<Vec<Element>, String> {
        match self {
            ArgValue::Elements(e) => Ok(e),
            other => Err(format!("expected elements, got {:?}", other)),
        }
    }

    pub fn into_groups(self) -> Result<Vec<Vec<Element>>, String> {
        match self {
            ArgValue::Groups(g) => Ok(g),
            other => Err(format!("expected groups of elements, got {:?}", other)),
        }
    }

    pub fn into_text(self) -> Result<String, String> {
        match self {
            ArgValue::Text(t) => Ok(t),
            other => Err(format!("expected a string, got {:?}", other)),
        }
    }

    /// A non-negative integer, rejecting reals with a targeted message.
    pub fn into_amount(self, param: &str) -> Result<u64, String> {
        let n = match self {
            ArgValue::Number(n) => n,
            other => return Err(format!("expected a number, got {:?}", other)),
        };
        if !n.is_int() {
            return Err(format!("'{}' expects an integer, got the real '{}'", param, n));
        }
        match n.as_int() {
            Some(v) if v >= 0 => Ok(v as u64),
            _ => Err(format!("'{}' expects a non-negative integer, got '{}'", param, n)),
        }
    }
}
