//! Lexical forms of atomic values: casting from strings and canonical formatting.
//!
//! The comparison kernel casts `xs:untypedAtomic` operands through
//! [`cast_from_string`]; `Display` for [`XdmAtomicValue`] uses the `format_*` helpers.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use chrono::{Duration as ChronoDuration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::consts::MAX_TZ_MINUTES;
use crate::engine::runtime::Error;
use crate::xdm::XdmAtomicValue;
use crate::xdm::types::AtomicType;

/// Cast a lexical form to the given atomic type.
///
/// Abstract targets are resolved the way untyped promotion needs them:
/// `xs:numeric` casts to `xs:double`, `xs:anyAtomicType` keeps the untyped value.
/// QName and NOTATION have no context-free lexical mapping and are rejected.
pub fn cast_from_string(s: &str, target: AtomicType) -> Result<XdmAtomicValue, Error> {
    use AtomicType as T;
    use XdmAtomicValue as V;
    Ok(match target {
        T::AnyAtomicType | T::UntypedAtomic => V::UntypedAtomic(s.to_string()),
        T::String => V::String(s.to_string()),
        T::AnyUri => V::AnyUri(collapse_whitespace(s)),
        T::Boolean => V::Boolean(parse_boolean(s)?),
        T::Numeric | T::Double => V::Double(parse_double(s)?),
        T::Float => V::Float(parse_float(s)?),
        T::Decimal => V::Decimal(parse_decimal(s)?),
        T::Integer => V::Integer(parse_integer(s)?),
        T::Duration => {
            let d = parse_duration(s)?;
            V::Duration { months: d.months, seconds: d.seconds }
        }
        T::YearMonthDuration => {
            let d = parse_duration(s)?;
            if d.has_day_time {
                return Err(Error::invalid_cast(target, s));
            }
            V::YearMonthDuration(d.months)
        }
        T::DayTimeDuration => {
            let d = parse_duration(s)?;
            if d.has_year_month {
                return Err(Error::invalid_cast(target, s));
            }
            V::DayTimeDuration(d.seconds)
        }
        T::DateTime => {
            let (value, tz) = parse_date_time(s)?;
            V::DateTime { value, tz }
        }
        T::Date => {
            let (date, tz) = parse_date(s)?;
            V::Date { date, tz }
        }
        T::Time => {
            let (time, tz) = parse_time(s)?;
            V::Time { time, tz }
        }
        T::Base64Binary => V::Base64Binary(decode_base64(s).ok_or_else(|| Error::invalid_cast(target, s))?),
        T::HexBinary => V::HexBinary(decode_hex(s.trim()).ok_or_else(|| Error::invalid_cast(target, s))?),
        T::QName | T::Notation => return Err(Error::invalid_cast(target, s)),
    })
}

pub fn parse_boolean(s: &str) -> Result<bool, Error> {
    match s.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(Error::invalid_cast(AtomicType::Boolean, s)),
    }
}

pub fn parse_double(s: &str) -> Result<f64, Error> {
    let t = s.trim();
    match t {
        "NaN" => return Ok(f64::NAN),
        "INF" | "+INF" => return Ok(f64::INFINITY),
        "-INF" => return Ok(f64::NEG_INFINITY),
        _ => {}
    }
    // Rust also accepts "inf", "infinity" and "nan" in any case; XML Schema does not.
    if t.is_empty() || t.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
        return Err(Error::invalid_cast(AtomicType::Double, s));
    }
    t.parse::<f64>().map_err(|_| Error::invalid_cast(AtomicType::Double, s))
}

pub fn parse_float(s: &str) -> Result<f32, Error> {
    // narrowing after the double parse keeps one lexical validator
    parse_double(s)
        .map(|d| d as f32)
        .map_err(|_| Error::invalid_cast(AtomicType::Float, s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal, Error> {
    let t = s.trim();
    if t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+')) {
        return Err(Error::invalid_cast(AtomicType::Decimal, s));
    }
    let t = t.strip_prefix('+').unwrap_or(t);
    Decimal::from_str(t).map_err(|_| Error::invalid_cast(AtomicType::Decimal, s))
}

pub fn parse_integer(s: &str) -> Result<i128, Error> {
    let t = s.trim();
    if t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+')) {
        return Err(Error::invalid_cast(AtomicType::Integer, s));
    }
    t.parse::<i128>()
        .map_err(|_| Error::invalid_cast(AtomicType::Integer, s))
}

/// Parsed `xs:duration` lexical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationParts {
    pub months: i64,
    pub seconds: Decimal,
    pub has_year_month: bool,
    pub has_day_time: bool,
}

pub fn parse_duration(s: &str) -> Result<DurationParts, Error> {
    let err = || Error::invalid_cast(AtomicType::Duration, s);
    let t = s.trim();
    let (negative, body) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t),
    };
    let body = body.strip_prefix('P').ok_or_else(err)?;
    let (date_part, time_part) = match body.split_once('T') {
        Some((d, tp)) => {
            if tp.is_empty() {
                return Err(err());
            }
            (d, Some(tp))
        }
        None => (body, None),
    };

    let mut months: i64 = 0;
    let mut seconds = Decimal::ZERO;
    let mut has_year_month = false;
    let mut has_day_time = false;

    let mut order = 0;
    for (value, designator) in duration_components(date_part).ok_or_else(err)? {
        let rank = match designator {
            'Y' => 1,
            'M' => 2,
            'D' => 3,
            _ => return Err(err()),
        };
        if rank <= order || value.contains('.') {
            return Err(err());
        }
        order = rank;
        let n: i64 = value.parse().map_err(|_| err())?;
        match designator {
            'Y' => {
                months = n.checked_mul(12).and_then(|m| months.checked_add(m)).ok_or_else(err)?;
                has_year_month = true;
            }
            'M' => {
                months = months.checked_add(n).ok_or_else(err)?;
                has_year_month = true;
            }
            _ => {
                seconds = Decimal::from(n)
                    .checked_mul(Decimal::from(86_400))
                    .and_then(|d| seconds.checked_add(d))
                    .ok_or_else(err)?;
                has_day_time = true;
            }
        }
    }

    if let Some(tp) = time_part {
        let mut order = 0;
        let comps = duration_components(tp).ok_or_else(err)?;
        if comps.is_empty() {
            return Err(err());
        }
        for (value, designator) in comps {
            let rank = match designator {
                'H' => 1,
                'M' => 2,
                'S' => 3,
                _ => return Err(err()),
            };
            if rank <= order || (designator != 'S' && value.contains('.')) {
                return Err(err());
            }
            order = rank;
            let n = Decimal::from_str(value).map_err(|_| err())?;
            let scaled = match designator {
                'H' => n.checked_mul(Decimal::from(3_600)),
                'M' => n.checked_mul(Decimal::from(60)),
                _ => Some(n),
            };
            seconds = scaled.and_then(|d| seconds.checked_add(d)).ok_or_else(err)?;
            has_day_time = true;
        }
    }

    if !has_year_month && !has_day_time {
        return Err(err());
    }
    if negative {
        months = -months;
        seconds = -seconds;
    }
    Ok(DurationParts {
        months,
        seconds,
        has_year_month,
        has_day_time,
    })
}

// Splits "1Y2M3D" into [("1", 'Y'), ("2", 'M'), ("3", 'D')].
fn duration_components(s: &str) -> Option<Vec<(&str, char)>> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        if ch.is_ascii_digit() || ch == '.' {
            continue;
        }
        let value = &s[start..i];
        if value.is_empty() || value.starts_with('.') || value.ends_with('.') {
            return None;
        }
        out.push((value, ch));
        start = i + ch.len_utf8();
    }
    if start != s.len() {
        return None;
    }
    Some(out)
}

/// Split an optional timezone suffix (`Z` or `±hh:mm`) off a date/time lexical form.
pub fn split_timezone(s: &str) -> Result<(&str, Option<FixedOffset>), Error> {
    if let Some(core) = s.strip_suffix('Z') {
        return Ok((core, FixedOffset::east_opt(0)));
    }
    let bytes = s.as_bytes();
    let n = bytes.len();
    if n >= 6 && matches!(bytes[n - 6], b'+' | b'-') && bytes[n - 3] == b':' {
        let fields_are_digits = [n - 5, n - 4, n - 2, n - 1].iter().all(|&i| bytes[i].is_ascii_digit());
        if !fields_are_digits {
            return Err(Error::invalid_cast(AtomicType::DateTime, s));
        }
        let sign = if bytes[n - 6] == b'-' { -1 } else { 1 };
        let hh: i32 = s[n - 5..n - 3]
            .parse()
            .map_err(|_| Error::invalid_cast(AtomicType::DateTime, s))?;
        let mm: i32 = s[n - 2..]
            .parse()
            .map_err(|_| Error::invalid_cast(AtomicType::DateTime, s))?;
        if mm > 59 {
            return Err(Error::invalid_cast(AtomicType::DateTime, s));
        }
        let minutes = sign * (hh * 60 + mm);
        return Ok((&s[..n - 6], Some(timezone_from_minutes(minutes)?)));
    }
    Ok((s, None))
}

/// Fixed offset for a timezone displacement in minutes; outside ±14:00 is an error.
pub fn timezone_from_minutes(minutes: i32) -> Result<FixedOffset, Error> {
    if minutes.unsigned_abs() > MAX_TZ_MINUTES.unsigned_abs() {
        return Err(Error::invalid_timezone(minutes));
    }
    FixedOffset::east_opt(minutes * 60).ok_or_else(|| Error::invalid_timezone(minutes))
}

fn check_date_shape(core: &str) -> bool {
    let unsigned = core.strip_prefix('-').unwrap_or(core);
    let parts: Vec<&str> = unsigned.split('-').collect();
    parts.len() == 3
        && parts[0].len() >= 4
        && parts[1].len() == 2
        && parts[2].len() == 2
        && parts.iter().all(|p| p.bytes().all(|b| b.is_ascii_digit()))
}

fn check_time_shape(core: &str) -> bool {
    let b = core.as_bytes();
    b.len() >= 8
        && b[2] == b':'
        && b[5] == b':'
        && [0, 1, 3, 4, 6, 7].iter().all(|&i| b[i].is_ascii_digit())
        && (b.len() == 8 || (b[8] == b'.' && b.len() > 9 && b[9..].iter().all(u8::is_ascii_digit)))
}

pub fn parse_date(s: &str) -> Result<(NaiveDate, Option<FixedOffset>), Error> {
    let t = s.trim();
    let (core, tz) = split_timezone(t)?;
    if !check_date_shape(core) {
        return Err(Error::invalid_cast(AtomicType::Date, s));
    }
    let date = NaiveDate::parse_from_str(core, "%Y-%m-%d")
        .map_err(|_| Error::invalid_cast(AtomicType::Date, s))?;
    Ok((date, tz))
}

// Returns the time and whether it was written as 24:00:00 (end of day).
fn parse_time_core(core: &str, target: AtomicType, original: &str) -> Result<(NaiveTime, bool), Error> {
    if !check_time_shape(core) {
        return Err(Error::invalid_cast(target, original));
    }
    if core.starts_with("24:") {
        let rest = &core[3..];
        let zero = rest.bytes().all(|b| b == b'0' || b == b':' || b == b'.');
        if !zero {
            return Err(Error::invalid_cast(target, original));
        }
        return Ok((NaiveTime::MIN, true));
    }
    let time = NaiveTime::parse_from_str(core, "%H:%M:%S%.f")
        .map_err(|_| Error::invalid_cast(target, original))?;
    Ok((time, false))
}

pub fn parse_time(s: &str) -> Result<(NaiveTime, Option<FixedOffset>), Error> {
    let t = s.trim();
    let (core, tz) = split_timezone(t)?;
    let (time, _) = parse_time_core(core, AtomicType::Time, s)?;
    Ok((time, tz))
}

pub fn parse_date_time(s: &str) -> Result<(NaiveDateTime, Option<FixedOffset>), Error> {
    let t = s.trim();
    let (core, tz) = split_timezone(t)?;
    let (date_part, time_part) = core
        .split_once('T')
        .ok_or_else(|| Error::invalid_cast(AtomicType::DateTime, s))?;
    if !check_date_shape(date_part) {
        return Err(Error::invalid_cast(AtomicType::DateTime, s));
    }
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| Error::invalid_cast(AtomicType::DateTime, s))?;
    let (time, end_of_day) = parse_time_core(time_part, AtomicType::DateTime, s)?;
    let mut value = date.and_time(time);
    if end_of_day {
        value = value
            .checked_add_signed(ChronoDuration::days(1))
            .ok_or_else(|| Error::invalid_cast(AtomicType::DateTime, s))?;
    }
    Ok((value, tz))
}

pub fn decode_hex(input: &str) -> Option<Vec<u8>> {
    if !input.len().is_multiple_of(2) {
        return None;
    }
    let mut bytes = Vec::with_capacity(input.len() / 2);
    let mut chars = input.chars();
    while let (Some(high_ch), Some(low_ch)) = (chars.next(), chars.next()) {
        let high = high_ch.to_digit(16)?;
        let low = low_ch.to_digit(16)?;
        bytes.push(u8::try_from((high << 4) | low).ok()?);
    }
    Some(bytes)
}

pub fn encode_hex_upper(bytes: &[u8]) -> String {
    use core::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02X}");
    }
    out
}

pub fn decode_base64(input: &str) -> Option<Vec<u8>> {
    let compact: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    BASE64_STANDARD.decode(compact.as_bytes()).ok()
}

pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn format_tz(tz: Option<FixedOffset>) -> String {
    match tz {
        None => String::new(),
        Some(o) => {
            let minutes = o.local_minus_utc() / 60;
            if minutes == 0 {
                "Z".to_string()
            } else {
                let sign = if minutes < 0 { '-' } else { '+' };
                let m = minutes.abs();
                format!("{sign}{:02}:{:02}", m / 60, m % 60)
            }
        }
    }
}

pub fn format_double(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    let abs = x.abs();
    if abs == 0.0 || (1e-6..1e6).contains(&abs) {
        format!("{x}")
    } else {
        format!("{x:E}")
    }
}

pub fn format_duration(months: i64, seconds: Decimal) -> String {
    if months == 0 && seconds.is_zero() {
        return "PT0S".to_string();
    }
    let negative = months < 0 || seconds.is_sign_negative() && !seconds.is_zero();
    let m = months.unsigned_abs();
    let mut s = seconds.abs();
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push('P');
    let (years, months) = (m / 12, m % 12);
    if years > 0 {
        out.push_str(&format!("{years}Y"));
    }
    if months > 0 {
        out.push_str(&format!("{months}M"));
    }
    let day = Decimal::from(86_400);
    let hour = Decimal::from(3_600);
    let minute = Decimal::from(60);
    let days = (s / day).trunc();
    s -= days * day;
    let hours = (s / hour).trunc();
    s -= hours * hour;
    let minutes = (s / minute).trunc();
    s -= minutes * minute;
    if !days.is_zero() {
        out.push_str(&format!("{days}D"));
    }
    if !(hours.is_zero() && minutes.is_zero() && s.is_zero()) {
        out.push('T');
        if !hours.is_zero() {
            out.push_str(&format!("{hours}H"));
        }
        if !minutes.is_zero() {
            out.push_str(&format!("{minutes}M"));
        }
        if !s.is_zero() {
            out.push_str(&format!("{}S", s.normalize()));
        }
    }
    out
}
