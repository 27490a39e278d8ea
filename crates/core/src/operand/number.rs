//! Numbers: integers or decimals, remembering the radix of their literal.
//!
//! Reals use `rust_decimal::Decimal` -- never `f64`.

use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Radix {
    Octal,
    Decimal,
    Hexadecimal,
}

impl Radix {
    pub fn base(self) -> u32 {
        match self {
            Radix::Octal => 8,
            Radix::Decimal => 10,
            Radix::Hexadecimal => 16,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum NumberValue {
    Int(i64),
    Real(Decimal),
}

#[derive(Debug, Clone, Copy)]
pub struct Number {
    value: NumberValue,
    radix: Radix,
}

impl Number {
    pub const TRUE: Number = Number::int(1);
    pub const FALSE: Number = Number::int(0);

    pub const fn int(v: i64) -> Self {
        Number {
            value: NumberValue::Int(v),
            radix: Radix::Decimal,
        }
    }

    pub fn real(v: Decimal) -> Self {
        Number {
            value: NumberValue::Real(v),
            radix: Radix::Decimal,
        }
    }

    pub fn with_radix(v: i64, radix: Radix) -> Self {
        Number {
            value: NumberValue::Int(v),
            radix,
        }
    }

    pub fn boolean(b: bool) -> Self {
        if b {
            Number::TRUE
        } else {
            Number::FALSE
        }
    }

    /// Parse a raw literal: `12`, `017` (octal), `0x1F`, `2.5`.
    pub fn parse(raw: &str) -> Result<Number, String> {
        if let Some(digits) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
            return i64::from_str_radix(digits, 16)
                .map(|v| Number::with_radix(v, Radix::Hexadecimal))
                .map_err(|_| format!("malformed hexadecimal number '{}'", raw));
        }
        if raw.contains('.') {
            return Decimal::from_str(raw)
                .map(Number::real)
                .map_err(|_| format!("malformed real number '{}'", raw));
        }
        if raw.len() > 1 && raw.starts_with('0') {
            return i64::from_str_radix(&raw[1..], 8)
                .map(|v| Number::with_radix(v, Radix::Octal))
                .map_err(|_| format!("malformed octal number '{}'", raw));
        }
        raw.parse::<i64>()
            .map(Number::int)
            .map_err(|_| format!("malformed number '{}'", raw))
    }

    pub fn value(&self) -> NumberValue {
        self.value
    }

    pub fn radix(&self) -> Radix {
        self.radix
    }

    /// The integer value, when the number is integral.
    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            NumberValue::Int(v) => Some(v),
            NumberValue::Real(d) if d.fract().is_zero() => i64::try_from(d).ok(),
            NumberValue::Real(_) => None,
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self.value, NumberValue::Int(_))
    }

    pub fn is_true(&self) -> bool {
        *self != Number::FALSE
    }

    pub fn to_decimal(&self) -> Decimal {
        match self.value {
            NumberValue::Int(v) => Decimal::from(v),
            NumberValue::Real(d) => d,
        }
    }

    /// Digits in the number's own radix, without any prefix. Used to
    /// compose identifiers from ranges.
    pub fn render_digits(&self) -> String {
        match self.value {
            NumberValue::Int(v) => {
                let sign = if v < 0 { "-" } else { "" };
                let abs = v.unsigned_abs();
                match self.radix {
                    Radix::Octal => format!("{}{:o}", sign, abs),
                    Radix::Decimal => format!("{}{}", sign, abs),
                    Radix::Hexadecimal => format!("{}{:x}", sign, abs),
                }
            }
            NumberValue::Real(d) => d.normalize().to_string(),
        }
    }

    fn combine_radix(&self, other: &Number) -> Radix {
        if self.radix == other.radix {
            self.radix
        } else {
            Radix::Decimal
        }
    }

    fn arith(
        &self,
        other: &Number,
        sym: &str,
        int_op: fn(i64, i64) -> Option<i64>,
        real_op: fn(Decimal, Decimal) -> Option<Decimal>,
    ) -> Result<Number, String> {
        match (self.value, other.value) {
            (NumberValue::Int(a), NumberValue::Int(b)) => int_op(a, b)
                .map(|v| Number::with_radix(v, self.combine_radix(other)))
                .ok_or_else(|| format!("integer overflow in '{} {} {}'", self, sym, other)),
            _ => real_op(self.to_decimal(), other.to_decimal())
                .map(Number::real)
                .ok_or_else(|| format!("numeric overflow in '{} {} {}'", self, sym, other)),
        }
    }

    pub fn add(&self, other: &Number) -> Result<Number, String> {
        self.arith(other, "+", i64::checked_add, Decimal::checked_add)
    }

    pub fn sub(&self, other: &Number) -> Result<Number, String> {
        self.arith(other, "-", i64::checked_sub, Decimal::checked_sub)
    }

    pub fn mul(&self, other: &Number) -> Result<Number, String> {
        self.arith(other, "*", i64::checked_mul, Decimal::checked_mul)
    }

    pub fn div(&self, other: &Number) -> Result<Number, String> {
        if other.to_decimal().is_zero() {
            return Err("division by zero".to_owned());
        }
        self.arith(other, "/", i64::checked_div, Decimal::checked_div)
    }

    pub fn rem(&self, other: &Number) -> Result<Number, String> {
        if !self.is_int() || !other.is_int() {
            return Err(format!(
                "'%' expects integers, got '{}' and '{}'",
                self, other
            ));
        }
        if other.to_decimal().is_zero() {
            return Err("division by zero".to_owned());
        }
        self.arith(other, "%", i64::checked_rem, Decimal::checked_rem)
    }

    pub fn negate(&self) -> Result<Number, String> {
        Number::int(0).sub(self).map(|n| Number {
            value: n.value,
            radix: self.radix,
        })
    }

    pub fn gt(&self, other: &Number) -> bool {
        self.to_decimal().cmp(&other.to_decimal()) == Ordering::Greater
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.to_decimal() == other.to_decimal()
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.value, self.radix) {
            (NumberValue::Int(v), Radix::Octal) if v != 0 => {
                let sign = if v < 0 { "-" } else { "" };
                write!(f, "{}0{}", sign, self.render_digits().trim_start_matches('-'))
            }
            (NumberValue::Int(v), Radix::Hexadecimal) => {
                let sign = if v < 0 { "-" } else { "" };
                write!(f, "{}0x{}", sign, self.render_digits().trim_start_matches('-'))
            }
            _ => write!(f, "{}", self.render_digits()),
        }
    }
}
