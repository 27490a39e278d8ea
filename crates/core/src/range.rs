//! Range expansion for bracketed enumerations.
//!
//! `VM[1..3, 7]` expands to `VM1 VM2 VM3 VM7`. Bounds are rendered in
//! the radix of their literal, so `N[0x8..0xa]` gives `N8 N9 Na`.

use crate::operand::{Number, NumberValue, Operand};

/// Upper bound on the number of candidates a single interval may produce.
pub const MAX_INTERVAL_LEN: u64 = 1_000_000;

/// Render a single range item.
pub fn render_single(op: &Operand) -> Result<String, String> {
    match op {
        Operand::Number(n) => Ok(n.render_digits()),
        Operand::String(s) => Ok(s.clone()),
        Operand::Element(e) => Ok(e.name().to_owned()),
        Operand::Set(_) => Err(format!(
            "a '{}' cannot be used as a range element",
            op.pretty_type()
        )),
    }
}

/// Expand `from..to`, inclusive and ascending whatever the bound order.
pub fn expand_interval(from: &Operand, to: &Operand) -> Result<Vec<String>, String> {
    let (a, b) = match (from, to) {
        (Operand::Number(a), Operand::Number(b)) => (a, b),
        _ => {
            return Err(format!(
                "range bounds must be integers, got a '{}' and a '{}'",
                from.pretty_type(),
                to.pretty_type()
            ))
        }
    };
    let (lo, hi) = match (a.value(), b.value()) {
        (NumberValue::Int(x), NumberValue::Int(y)) => (x.min(y), x.max(y)),
        _ => {
            return Err(format!(
                "range bounds must be integers, got '{}' and '{}'",
                a, b
            ))
        }
    };
    if a.radix() != b.radix() {
        return Err(format!(
            "range bounds '{}' and '{}' must share the same radix",
            a, b
        ));
    }
    if hi.abs_diff(lo) >= MAX_INTERVAL_LEN {
        return Err(format!("range '{}..{}' is too large", a, b));
    }
    Ok((lo..=hi)
        .map(|v| Number::with_radix(v, a.radix()).render_digits())
        .collect())
}

/// `head + part + tail` for every part, in order.
pub fn compose(head: &str, parts: &[String], tail: &str) -> Vec<String> {
    parts
        .iter()
        .map(|p| format!("{}{}{}", head, p, tail))
        .collect()
}
