use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use core::fmt;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::model::NodeHandle;

pub mod lexical;
pub mod types;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpandedName {
    pub ns_uri: Option<String>,
    pub local: String,
}

impl ExpandedName {
    pub fn new(ns_uri: Option<String>, local: impl Into<String>) -> Self {
        Self {
            ns_uri,
            local: local.into(),
        }
    }
}

/// Closed set of XDM atomic values understood by the comparison kernel.
///
/// - Numerics keep their own representation so promotion can be done lazily.
/// - `String` and `UntypedAtomic` are distinct tags over the same payload; the kernel
///   coerces untyped values on demand.
/// - Durations keep the canonical two-component form (months, seconds).
/// - Date/time values keep the timezone separately because a missing timezone is
///   replaced by the implicit timezone only at comparison time.
/// - Binary values hold decoded bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum XdmAtomicValue {
    Boolean(bool),
    String(String),
    UntypedAtomic(String),
    AnyUri(String),
    Integer(i128),
    Decimal(Decimal),
    Float(f32),
    Double(f64),
    Duration {
        months: i64,
        seconds: Decimal,
    },
    YearMonthDuration(i64),
    DayTimeDuration(Decimal),
    DateTime {
        value: NaiveDateTime,
        tz: Option<FixedOffset>,
    },
    Date {
        date: NaiveDate,
        tz: Option<FixedOffset>,
    },
    Time {
        time: NaiveTime,
        tz: Option<FixedOffset>,
    },
    QName {
        ns_uri: Option<String>,
        prefix: Option<String>,
        local: String,
    },
    Notation(String),
    Base64Binary(Vec<u8>),
    HexBinary(Vec<u8>),
}

impl XdmAtomicValue {
    /// Canonical (months, seconds) pair of any duration value.
    pub fn duration_parts(&self) -> Option<(i64, Decimal)> {
        match self {
            XdmAtomicValue::Duration { months, seconds } => Some((*months, *seconds)),
            XdmAtomicValue::YearMonthDuration(m) => Some((*m, Decimal::ZERO)),
            XdmAtomicValue::DayTimeDuration(s) => Some((0, *s)),
            _ => None,
        }
    }

    /// Explicit timezone of a date/time value, in minutes east of UTC.
    pub fn tz_minutes(&self) -> Option<i32> {
        match self {
            XdmAtomicValue::DateTime { tz, .. }
            | XdmAtomicValue::Date { tz, .. }
            | XdmAtomicValue::Time { tz, .. } => tz.map(|o| o.local_minus_utc() / 60),
            _ => None,
        }
    }

    /// String payload of string-like values (string, untypedAtomic, anyURI).
    pub fn string_like(&self) -> Option<&str> {
        match self {
            XdmAtomicValue::String(s) | XdmAtomicValue::UntypedAtomic(s) | XdmAtomicValue::AnyUri(s) => {
                Some(s)
            }
            _ => None,
        }
    }

    pub fn is_nan(&self) -> bool {
        match self {
            XdmAtomicValue::Double(d) => d.is_nan(),
            XdmAtomicValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }
}

/// Lexical (canonical) representation, i.e. the result of casting to `xs:string`.
impl fmt::Display for XdmAtomicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use XdmAtomicValue as V;
        match self {
            V::Boolean(b) => write!(f, "{b}"),
            V::String(s) | V::UntypedAtomic(s) | V::AnyUri(s) | V::Notation(s) => f.write_str(s),
            V::Integer(i) => write!(f, "{i}"),
            V::Decimal(d) => write!(f, "{}", d.normalize()),
            V::Float(x) => f.write_str(&lexical::format_double(f64::from(*x))),
            V::Double(x) => f.write_str(&lexical::format_double(*x)),
            V::Duration { months, seconds } => f.write_str(&lexical::format_duration(*months, *seconds)),
            V::YearMonthDuration(m) => f.write_str(&lexical::format_duration(*m, Decimal::ZERO)),
            V::DayTimeDuration(s) => f.write_str(&lexical::format_duration(0, *s)),
            V::DateTime { value, tz } => {
                write!(f, "{}{}", value.format("%Y-%m-%dT%H:%M:%S%.f"), lexical::format_tz(*tz))
            }
            V::Date { date, tz } => write!(f, "{}{}", date.format("%Y-%m-%d"), lexical::format_tz(*tz)),
            V::Time { time, tz } => write!(f, "{}{}", time.format("%H:%M:%S%.f"), lexical::format_tz(*tz)),
            V::QName { prefix, local, .. } => match prefix {
                Some(p) if !p.is_empty() => write!(f, "{p}:{local}"),
                _ => f.write_str(local),
            },
            V::Base64Binary(bytes) => f.write_str(&lexical::encode_base64(bytes)),
            V::HexBinary(bytes) => f.write_str(&lexical::encode_hex_upper(bytes)),
        }
    }
}

pub type XdmSequence = Vec<XdmItem>;

#[derive(Debug, Clone, PartialEq)]
pub enum XdmItem {
    Atomic(XdmAtomicValue),
    Node(NodeHandle),
    /// Array members; each member is itself a sequence.
    Array(Arc<Vec<XdmSequence>>),
}

impl From<XdmAtomicValue> for XdmItem {
    fn from(a: XdmAtomicValue) -> Self {
        XdmItem::Atomic(a)
    }
}

impl From<NodeHandle> for XdmItem {
    fn from(n: NodeHandle) -> Self {
        XdmItem::Node(n)
    }
}

impl fmt::Display for XdmItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XdmItem::Atomic(a) => write!(f, "{a}"),
            XdmItem::Node(n) => write!(f, "{n:?}"),
            XdmItem::Array(members) => {
                f.write_str("[")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str("(")?;
                    for (j, it) in m.iter().enumerate() {
                        if j > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{it}")?;
                    }
                    f.write_str(")")?;
                }
                f.write_str("]")
            }
        }
    }
}
