//! Comparison kernel: comparability, untyped coercion, numeric promotion and
//! per-family dispatch of a value comparison on two atomic values.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::consts::MAX_TZ_MINUTES;
use crate::engine::collation::Collation;
use crate::engine::numeric;
use crate::engine::runtime::{Error, StaticContext};
use crate::expr::OpV;
use crate::xdm::XdmAtomicValue as V;
use crate::xdm::lexical;
use crate::xdm::types::AtomicType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Untyped,
    Numeric,
    Text,
    Boolean,
    Duration,
    DateTime,
    Date,
    Time,
    QName,
    Notation,
    Binary,
}

fn family(v: &V) -> Family {
    match v {
        V::UntypedAtomic(_) => Family::Untyped,
        V::Integer(_) | V::Decimal(_) | V::Float(_) | V::Double(_) => Family::Numeric,
        V::String(_) | V::AnyUri(_) => Family::Text,
        V::Boolean(_) => Family::Boolean,
        V::Duration { .. } | V::YearMonthDuration(_) | V::DayTimeDuration(_) => Family::Duration,
        V::DateTime { .. } => Family::DateTime,
        V::Date { .. } => Family::Date,
        V::Time { .. } => Family::Time,
        V::QName { .. } => Family::QName,
        V::Notation(_) => Family::Notation,
        V::Base64Binary(_) | V::HexBinary(_) => Family::Binary,
    }
}

/// Whether a value comparison of the two values is defined for some operator.
///
/// Untyped values are compatible with everything they can be cast to, which
/// excludes QName and NOTATION.
pub fn comparable(a: &V, b: &V) -> bool {
    match (family(a), family(b)) {
        (Family::Untyped, f) | (f, Family::Untyped) => !matches!(f, Family::QName | Family::Notation),
        (fa, fb) => fa == fb,
    }
}

/// Apply `op` to two atomic values.
///
/// `coll` orders strings; `sc` supplies the implicit timezone for date/time values
/// without one.
pub fn compare_atomic(
    op: OpV,
    a: &V,
    b: &V,
    coll: &dyn Collation,
    sc: &StaticContext,
) -> Result<bool, Error> {
    let incomparable = || Error::incomparable(a.atomic_type(), b.atomic_type());
    if !comparable(a, b) {
        return Err(incomparable());
    }

    match (a, b) {
        (V::UntypedAtomic(x), other) if family(other) != Family::Untyped => {
            let cast = promote_untyped(x, other)?;
            return compare_atomic(op, &cast, other, coll, sc);
        }
        (other, V::UntypedAtomic(y)) if family(other) != Family::Untyped => {
            let cast = promote_untyped(y, other)?;
            return compare_atomic(op, other, &cast, coll, sc);
        }
        _ => {}
    }

    if let (Some(x), Some(y)) = (numeric::classify(a), numeric::classify(b)) {
        return Ok(op.test_partial(numeric::compare(x, y)));
    }
    if let (Some(x), Some(y)) = (a.string_like(), b.string_like()) {
        return Ok(if op.is_equality() {
            op.test_equal(coll.equal(x, y))
        } else {
            op.test(coll.compare(x, y))
        });
    }

    match (a, b) {
        (V::Boolean(x), V::Boolean(y)) => Ok(op.test(x.cmp(y))),
        (V::YearMonthDuration(x), V::YearMonthDuration(y)) => Ok(op.test(x.cmp(y))),
        (V::DayTimeDuration(x), V::DayTimeDuration(y)) => Ok(op.test(x.cmp(y))),
        _ if family(a) == Family::Duration => {
            // mixed subtypes and xs:duration itself have no order
            if !op.is_equality() {
                return Err(incomparable());
            }
            Ok(op.test_equal(a.duration_parts() == b.duration_parts()))
        }
        (V::DateTime { .. } | V::Date { .. } | V::Time { .. }, _) => {
            let implicit = sc.implicit_tz_minutes();
            Ok(op.test(instant(a, implicit)?.cmp(&instant(b, implicit)?)))
        }
        (V::QName { ns_uri: nx, local: lx, .. }, V::QName { ns_uri: ny, local: ly, .. }) => {
            if !op.is_equality() {
                return Err(incomparable());
            }
            Ok(op.test_equal(nx == ny && lx == ly))
        }
        (V::Notation(x), V::Notation(y)) => {
            if !op.is_equality() {
                return Err(incomparable());
            }
            Ok(op.test_equal(x == y))
        }
        (V::Base64Binary(x) | V::HexBinary(x), V::Base64Binary(y) | V::HexBinary(y)) => {
            if !op.is_equality() {
                return Err(incomparable());
            }
            Ok(op.test_equal(x == y))
        }
        _ => Err(incomparable()),
    }
}

/// Cast an untyped operand for comparison against `other`: numerics compare as
/// `xs:double`, everything else as the other operand's type.
fn promote_untyped(s: &str, other: &V) -> Result<V, Error> {
    match family(other) {
        Family::Numeric => lexical::cast_from_string(s, AtomicType::Double),
        Family::Text => Ok(V::String(s.to_string())),
        _ => lexical::cast_from_string(s, other.atomic_type()),
    }
}

// Seconds since the epoch in UTC plus sub-second nanos. Times are placed on a
// fixed reference date so that all of them order consistently.
fn instant(v: &V, implicit_tz: i32) -> Result<(i64, u32), Error> {
    let (local, tz) = match v {
        V::DateTime { value, .. } => (*value, v.tz_minutes()),
        V::Date { date, .. } => (date.and_time(chrono::NaiveTime::MIN), v.tz_minutes()),
        V::Time { time, .. } => (
            DateTime::<Utc>::UNIX_EPOCH.date_naive().and_time(*time),
            v.tz_minutes(),
        ),
        _ => return Err(Error::incomparable(v.atomic_type(), v.atomic_type())),
    };
    let offset = match tz {
        Some(m) if m.abs() > MAX_TZ_MINUTES => return Err(Error::invalid_timezone(m)),
        Some(m) => m,
        None => implicit_tz,
    };
    Ok(epoch_parts(local, offset))
}

fn epoch_parts(local: NaiveDateTime, offset_minutes: i32) -> (i64, u32) {
    let utc = local.and_utc();
    (
        utc.timestamp() - i64::from(offset_minutes) * 60,
        utc.timestamp_subsec_nanos(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::collation::CodepointCollation;
    use rust_decimal::Decimal;

    fn untyped(s: &str) -> V {
        V::UntypedAtomic(s.to_string())
    }

    #[test]
    fn untyped_follows_the_other_operand() {
        let sc = StaticContext::default();
        let c = CodepointCollation;
        assert!(compare_atomic(OpV::Eq, &untyped("2.5"), &V::Double(2.5), &c, &sc).unwrap());
        assert!(compare_atomic(OpV::Lt, &untyped("10"), &untyped("9"), &c, &sc).unwrap());
        assert!(compare_atomic(OpV::Eq, &V::Boolean(true), &untyped("1"), &c, &sc).unwrap());
        let err = compare_atomic(OpV::Eq, &untyped("x"), &V::Integer(1), &c, &sc).unwrap_err();
        assert_eq!(err.format_code(), "err:FORG0001");
    }

    #[test]
    fn durations_compare_across_subtypes_for_equality_only() {
        let sc = StaticContext::default();
        let c = CodepointCollation;
        let ym = V::YearMonthDuration(0);
        let dt = V::DayTimeDuration(Decimal::ZERO);
        assert!(compare_atomic(OpV::Eq, &ym, &dt, &c, &sc).unwrap());
        assert!(compare_atomic(OpV::Lt, &ym, &dt, &c, &sc).is_err());
        let d = V::Duration { months: 12, seconds: Decimal::ZERO };
        assert!(compare_atomic(OpV::Eq, &d, &V::YearMonthDuration(12), &c, &sc).unwrap());
        assert!(compare_atomic(OpV::Ge, &d, &d, &c, &sc).is_err());
    }
}
