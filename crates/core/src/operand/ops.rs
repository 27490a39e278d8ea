//! Operators over operands.
//!
//! Operands of mismatched `(type, degree)` are rejected, never coerced.
//! Errors are plain messages; the evaluator attaches the position.

use super::{BtrpSet, Number, Operand};
use crate::ast::{BinaryOp, UnaryOp};

pub fn apply_binary(op: BinaryOp, l: &Operand, r: &Operand) -> Result<Operand, String> {
    match op {
        BinaryOp::Add => plus(l, r),
        BinaryOp::Sub => minus(l, r),
        BinaryOp::Mul => times(l, r),
        BinaryOp::Div => div(l, r),
        BinaryOp::Rem => rem(l, r),
        BinaryOp::Eq => eq(l, r).map(bool_operand),
        BinaryOp::Neq => eq(l, r).map(|b| bool_operand(!b)),
        BinaryOp::Gt => gt(l, r).map(bool_operand),
        BinaryOp::Lt => gt(r, l).map(bool_operand),
        BinaryOp::Gte => gt(r, l).map(|b| bool_operand(!b)),
        BinaryOp::Lte => gt(l, r).map(|b| bool_operand(!b)),
        BinaryOp::And => logical(op, l, r, |a, b| a && b),
        BinaryOp::Or => logical(op, l, r, |a, b| a || b),
    }
}

pub fn apply_unary(op: UnaryOp, o: &Operand) -> Result<Operand, String> {
    match (op, o) {
        (UnaryOp::Not, Operand::Number(n)) => Ok(bool_operand(!n.is_true())),
        (UnaryOp::Neg, Operand::Number(n)) => n.negate().map(Operand::Number),
        (UnaryOp::Size, Operand::Set(s)) => Ok(Operand::Number(Number::int(s.len() as i64))),
        (UnaryOp::Size, other) => Err(format!(
            "'#' expects a set, got a '{}'",
            other.pretty_type()
        )),
        (UnaryOp::Not, other) => Err(format!(
            "'!' expects a number, got a '{}'",
            other.pretty_type()
        )),
        (UnaryOp::Neg, other) => Err(format!(
            "'-' expects a number, got a '{}'",
            other.pretty_type()
        )),
    }
}

fn bool_operand(b: bool) -> Operand {
    Operand::Number(Number::boolean(b))
}

fn unsupported(op: &str, l: &Operand, r: &Operand) -> String {
    format!(
        "unable to apply '{}' to a '{}' and a '{}'",
        op,
        l.pretty_type(),
        r.pretty_type()
    )
}

fn same_shape(l: &Operand, r: &Operand) -> bool {
    l.ty() == r.ty() && l.degree() == r.degree()
}

pub fn plus(l: &Operand, r: &Operand) -> Result<Operand, String> {
    match (l, r) {
        (Operand::Number(a), Operand::Number(b)) => a.add(b).map(Operand::Number),
        (Operand::String(a), Operand::String(b)) => Ok(Operand::String(format!("{}{}", a, b))),
        (Operand::Set(a), Operand::Set(b)) if same_shape(l, r) => {
            let mut out = a.clone();
            for v in b {
                out.insert(v.clone())?;
            }
            Ok(Operand::Set(out))
        }
        _ => Err(unsupported("+", l, r)),
    }
}

pub fn minus(l: &Operand, r: &Operand) -> Result<Operand, String> {
    match (l, r) {
        (Operand::Number(a), Operand::Number(b)) => a.sub(b).map(Operand::Number),
        (Operand::Set(a), Operand::Set(b)) if same_shape(l, r) => {
            let mut out = BtrpSet::new(a.ty(), a.degree());
            for v in a.iter().filter(|v| !b.contains(v)) {
                out.insert(v.clone())?;
            }
            Ok(Operand::Set(out))
        }
        _ => Err(unsupported("-", l, r)),
    }
}

pub fn times(l: &Operand, r: &Operand) -> Result<Operand, String> {
    match (l, r) {
        (Operand::Number(a), Operand::Number(b)) => a.mul(b).map(Operand::Number),
        _ => Err(unsupported("*", l, r)),
    }
}

pub fn div(l: &Operand, r: &Operand) -> Result<Operand, String> {
    match (l, r) {
        (Operand::Number(a), Operand::Number(b)) => a.div(b).map(Operand::Number),
        (Operand::Set(s), Operand::Number(n)) => {
            let count = positive_count("/", n)?;
            Ok(Operand::Set(partition_by_count(s, count)?))
        }
        _ => Err(unsupported("/", l, r)),
    }
}

pub fn rem(l: &Operand, r: &Operand) -> Result<Operand, String> {
    match (l, r) {
        (Operand::Number(a), Operand::Number(b)) => a.rem(b).map(Operand::Number),
        (Operand::Set(s), Operand::Number(n)) => {
            let size = positive_count("%", n)?;
            Ok(Operand::Set(partition_by_size(s, size)?))
        }
        _ => Err(unsupported("%", l, r)),
    }
}

fn positive_count(op: &str, n: &Number) -> Result<usize, String> {
    match n.as_int() {
        Some(v) if v >= 1 => Ok(v as usize),
        _ => Err(format!(
            "'{}' on a set expects a strictly positive integer, got '{}'",
            op, n
        )),
    }
}

/// Split `s` into `count` groups whose sizes differ by at most one, the
/// larger groups first. Never produces more groups than elements.
pub fn partition_by_count(s: &BtrpSet, count: usize) -> Result<BtrpSet, String> {
    let n = s.len();
    let groups = count.min(n);
    let mut out = BtrpSet::new(s.ty(), s.degree() + 1);
    if groups == 0 {
        return Ok(out);
    }
    let (q, r) = (n / groups, n % groups);
    let mut values = s.iter();
    for g in 0..groups {
        let size = if g < r { q + 1 } else { q };
        let mut group = BtrpSet::new(s.ty(), s.degree());
        for v in values.by_ref().take(size) {
            group.insert(v.clone())?;
        }
        out.insert(Operand::Set(group))?;
    }
    Ok(out)
}

/// Split `s` into chunks of `size` elements; the last one may be smaller.
pub fn partition_by_size(s: &BtrpSet, size: usize) -> Result<BtrpSet, String> {
    let mut out = BtrpSet::new(s.ty(), s.degree() + 1);
    for chunk in s.values().chunks(size.max(1)) {
        let mut group = BtrpSet::new(s.ty(), s.degree());
        for v in chunk {
            group.insert(v.clone())?;
        }
        out.insert(Operand::Set(group))?;
    }
    Ok(out)
}

pub fn eq(l: &Operand, r: &Operand) -> Result<bool, String> {
    if !same_shape(l, r) {
        return Err(format!(
            "unable to compare a '{}' and a '{}'",
            l.pretty_type(),
            r.pretty_type()
        ));
    }
    Ok(l == r)
}

pub fn gt(l: &Operand, r: &Operand) -> Result<bool, String> {
    match (l, r) {
        (Operand::Number(a), Operand::Number(b)) => Ok(a.gt(b)),
        _ => Err(format!(
            "unable to order a '{}' and a '{}'",
            l.pretty_type(),
            r.pretty_type()
        )),
    }
}

fn logical(
    op: BinaryOp,
    l: &Operand,
    r: &Operand,
    f: fn(bool, bool) -> bool,
) -> Result<Operand, String> {
    match (l, r) {
        (Operand::Number(a), Operand::Number(b)) => Ok(bool_operand(f(a.is_true(), b.is_true()))),
        _ => Err(unsupported(op.symbol(), l, r)),
    }
}

/// Truthiness of a condition: a number different from FALSE.
pub fn is_true(o: &Operand) -> Result<bool, String> {
    match o {
        Operand::Number(n) => Ok(n.is_true()),
        other => Err(format!(
            "a condition must be a number, got a '{}'",
            other.pretty_type()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, ElementKind};

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
            .map(|i| Element::new(ElementKind::Node, *i, &format!("N{}", i)))
            .collect();
        BtrpSet::of_elements(ElementKind::Node, &elements).into()
    }

    fn num(v: i64) -> Operand {
        Number::int(v).into()
    }

    fn group_sizes(o: &Operand) -> Vec<usize> {
        o.as_set()
            .unwrap()
            .iter()
            .map(|g| g.as_set().unwrap().len())
            .collect()
    }

    #[test]
    fn numeric_operators() {
        assert_eq!(plus(&num(2), &num(3)).unwrap(), num(5));
        assert_eq!(minus(&num(2), &num(3)).unwrap(), num(-1));
        assert_eq!(times(&num(2), &num(3)).unwrap(), num(6));
        assert_eq!(div(&num(7), &num(2)).unwrap(), num(3));
        assert_eq!(rem(&num(7), &num(2)).unwrap(), num(1));
    }

    #[test]
    fn set_union_and_difference() {
        let u = plus(&vms(&[1, 2]), &vms(&[2, 3])).unwrap();
        assert_eq!(u, vms(&[1, 2, 3]));
        let d = minus(&vms(&[1, 2, 3]), &vms(&[2])).unwrap();
        assert_eq!(d, vms(&[1, 3]));
    }

    #[test]
    fn mismatched_shapes_are_errors() {
        assert_eq!(
            plus(&vms(&[1]), &nodes(&[1])).unwrap_err(),
            "unable to apply '+' to a 'set<VM>' and a 'set<node>'"
        );
        assert!(plus(&vms(&[1]), &num(1)).is_err());
        assert!(minus(&num(1), &Operand::String("a".into())).is_err());
        assert!(eq(&num(1), &vms(&[1])).is_err());
        assert!(gt(&vms(&[1]), &vms(&[2])).is_err());
    }

    #[test]
    fn partition_by_count_keeps_every_element() {
        let groups = div(&vms(&[1, 2, 3, 4, 5, 6, 7]), &num(3)).unwrap();
        assert_eq!(groups.degree(), 2);
        assert_eq!(group_sizes(&groups), vec![3, 2, 2]);
        assert_eq!(groups.as_set().unwrap().elements().len(), 7);
        let more_groups_than_elements = div(&vms(&[1, 2]), &num(5)).unwrap();
        assert_eq!(group_sizes(&more_groups_than_elements), vec![1, 1]);
    }

    #[test]
    fn partition_by_size_keeps_every_element() {
        let chunks = rem(&nodes(&[1, 2, 3, 4, 5]), &num(2)).unwrap();
        assert_eq!(chunks.pretty_type(), "set<set<node>>");
        assert_eq!(group_sizes(&chunks), vec![2, 2, 1]);
    }

    #[test]
    fn partition_needs_a_positive_integer() {
        assert!(div(&vms(&[1, 2]), &num(0)).is_err());
        assert!(rem(&vms(&[1, 2]), &Number::parse("1.5").unwrap().into()).is_err());
    }

    #[test]
    fn comparisons_and_booleans() {
        let t = Operand::Number(Number::TRUE);
        let f = Operand::Number(Number::FALSE);
        assert_eq!(apply_binary(BinaryOp::Lt, &num(1), &num(2)).unwrap(), t);
        assert_eq!(apply_binary(BinaryOp::Gt, &num(1), &num(2)).unwrap(), f);
        assert_eq!(apply_binary(BinaryOp::Gte, &num(2), &num(2)).unwrap(), t);
        assert_eq!(apply_binary(BinaryOp::Lte, &num(3), &num(2)).unwrap(), f);
        assert_eq!(apply_binary(BinaryOp::Eq, &vms(&[1, 2]), &vms(&[2, 1])).unwrap(), t);
        assert_eq!(apply_binary(BinaryOp::Neq, &num(1), &num(1)).unwrap(), f);
        assert_eq!(apply_binary(BinaryOp::And, &num(4), &num(0)).unwrap(), f);
        assert_eq!(apply_binary(BinaryOp::Or, &num(4), &num(0)).unwrap(), t);
        assert!(apply_binary(BinaryOp::And, &num(1), &vms(&[1])).is_err());
    }

    #[test]
    fn unary_operators() {
        assert_eq!(apply_unary(UnaryOp::Size, &vms(&[1, 2, 3])).unwrap(), num(3));
        assert_eq!(
            apply_unary(UnaryOp::Size, &num(3)).unwrap_err(),
            "'#' expects a set, got a 'number'"
        );
        assert_eq!(apply_unary(UnaryOp::Not, &num(0)).unwrap(), num(1));
        assert_eq!(apply_unary(UnaryOp::Neg, &num(4)).unwrap(), num(-4));
    }
}
