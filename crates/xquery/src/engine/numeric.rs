//! Numeric classification and promotion for comparisons.
//!
//! Operands are promoted along integer → decimal → float → double before they
//! are ordered. [`compare`] returns `None` when either side is NaN.

use core::cmp::Ordering;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::xdm::XdmAtomicValue;

/// Numeric classification carrying the value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum NumKind {
    Int(i128),
    Dec(Decimal),
    Float(f32),
    Double(f64),
}

impl NumKind {
    /// Lossy for decimals beyond f64 precision.
    pub(crate) fn to_f64(self) -> f64 {
        match self {
            NumKind::Int(i) => i as f64,
            NumKind::Dec(d) => d.to_f64().unwrap_or(f64::NAN),
            NumKind::Float(f) => f64::from(f),
            NumKind::Double(d) => d,
        }
    }

    fn to_f32(self) -> f32 {
        match self {
            NumKind::Int(i) => i as f32,
            NumKind::Dec(d) => d.to_f32().unwrap_or(f32::NAN),
            NumKind::Float(f) => f,
            NumKind::Double(d) => d as f32,
        }
    }
}

pub(crate) fn classify(v: &XdmAtomicValue) -> Option<NumKind> {
    match v {
        XdmAtomicValue::Integer(i) => Some(NumKind::Int(*i)),
        XdmAtomicValue::Decimal(d) => Some(NumKind::Dec(*d)),
        XdmAtomicValue::Float(f) => Some(NumKind::Float(*f)),
        XdmAtomicValue::Double(d) => Some(NumKind::Double(*d)),
        _ => None,
    }
}

// Integers outside the decimal range order by sign alone.
fn int_vs_dec(i: i128, d: Decimal) -> Ordering {
    match Decimal::from_i128(i) {
        Some(x) => x.cmp(&d),
        None if i > 0 => Ordering::Greater,
        None => Ordering::Less,
    }
}

/// Order two numerics after promotion to their common type.
pub(crate) fn compare(a: NumKind, b: NumKind) -> Option<Ordering> {
    use NumKind::*;
    match (a, b) {
        (Int(x), Int(y)) => Some(x.cmp(&y)),
        (Dec(x), Dec(y)) => Some(x.cmp(&y)),
        (Int(x), Dec(y)) => Some(int_vs_dec(x, y)),
        (Dec(x), Int(y)) => Some(int_vs_dec(y, x).reverse()),
        (Double(_), _) | (_, Double(_)) => a.to_f64().partial_cmp(&b.to_f64()),
        _ => a.to_f32().partial_cmp(&b.to_f32()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(NumKind::Int(1), NumKind::Dec(Decimal::new(15, 1)), Some(Ordering::Less))]
    #[case(NumKind::Int(i128::MAX), NumKind::Dec(Decimal::MAX), Some(Ordering::Greater))]
    #[case(NumKind::Int(i128::MIN), NumKind::Dec(Decimal::MIN), Some(Ordering::Less))]
    #[case(NumKind::Dec(Decimal::new(25, 1)), NumKind::Float(2.5), Some(Ordering::Equal))]
    #[case(NumKind::Int(3), NumKind::Double(3.0), Some(Ordering::Equal))]
    #[case(NumKind::Double(f64::NAN), NumKind::Int(0), None)]
    #[case(NumKind::Float(f32::NAN), NumKind::Float(f32::NAN), None)]
    fn promoted_order(#[case] a: NumKind, #[case] b: NumKind, #[case] expected: Option<Ordering>) {
        assert_eq!(compare(a, b), expected);
    }
}
