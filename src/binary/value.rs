//! Converters from textual field values to PostgreSQL binary payloads.
//!
//! Every converter is a pure function of its input string. Output is the
//! field payload only; the length prefix is written by the row assembler.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::num::{IntErrorKind, ParseFloatError, ParseIntError};
use std::str::FromStr;

use bytes::BufMut;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use super::EncodeError;
use crate::types::PgType;

// postgres pg_inet address families
const AF_INET: u8 = 2;
const AF_INET6: u8 = 3;

/// Encode one non-null textual value as its binary field payload.
///
/// `Text`, `Json` and `Enum` pass UTF-8 bytes through unchanged, so an empty
/// input yields an empty payload. Every other type rejects empty input as
/// part of its grammar.
pub fn encode_value(ty: PgType, input: &str) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    match ty {
        PgType::Int16 => out.put_i16(parse_int(ty, input)?),
        PgType::Int32 => out.put_i32(parse_int(ty, input)?),
        PgType::Int64 => out.put_i64(parse_int(ty, input)?),
        PgType::Float4 => out.put_f32(parse_float(ty, input)?),
        PgType::Float8 => out.put_f64(parse_float(ty, input)?),
        PgType::Bool => match input.to_ascii_lowercase().as_str() {
            "1" | "true" | "t" => out.put_u8(1),
            "0" | "false" | "f" => out.put_u8(0),
            _ => {
                return Err(EncodeError::invalid(ty, input, "expected a boolean literal"));
            }
        },
        PgType::Text | PgType::Json | PgType::Enum => out.extend_from_slice(input.as_bytes()),
        PgType::Date => out.put_i32(date_to_days(ty, input)?),
        PgType::Time => out.put_i64(time_to_micros(ty, input)?),
        PgType::Timestamp => out.put_i64(timestamp_to_micros(ty, input)?),
        PgType::TimestampTz => out.put_i64(timestamptz_to_micros(input)?),
        PgType::MacAddr => encode_macaddr(input, &mut out)?,
        PgType::Uuid => {
            let parsed =
                uuid::Uuid::parse_str(input).map_err(|e| EncodeError::invalid(ty, input, e))?;
            out.extend_from_slice(parsed.as_bytes());
        }
        PgType::Inet => encode_inet(input, &mut out)?,
    }
    Ok(out)
}

fn parse_int<T>(ty: PgType, input: &str) -> Result<T, EncodeError>
where
    T: FromStr<Err = ParseIntError>,
{
    input.parse().map_err(|e: ParseIntError| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => EncodeError::out_of_range(ty, input),
        _ => EncodeError::invalid(ty, input, e),
    })
}

fn parse_float<T>(ty: PgType, input: &str) -> Result<T, EncodeError>
where
    T: FromStr<Err = ParseFloatError>,
{
    input.parse().map_err(|e| EncodeError::invalid(ty, input, e))
}

/// Days and microseconds are measured from the PostgreSQL epoch, 2000-01-01.
fn pg_epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).expect("epoch date is valid")
}

fn pg_epoch() -> NaiveDateTime {
    pg_epoch_date().and_hms_opt(0, 0, 0).expect("epoch time is valid")
}

fn date_to_days(ty: PgType, input: &str) -> Result<i32, EncodeError> {
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|e| EncodeError::invalid(ty, input, e))?;
    let days = date.signed_duration_since(pg_epoch_date()).num_days();
    i32::try_from(days).map_err(|_| EncodeError::out_of_range(ty, input))
}

fn time_to_micros(ty: PgType, input: &str) -> Result<i64, EncodeError> {
    let time = NaiveTime::parse_from_str(input, "%H:%M:%S%.f")
        .map_err(|e| EncodeError::invalid(ty, input, e))?;
    // chrono represents a parsed :60 leap second as nanos >= 1e9
    if time.nanosecond() >= 1_000_000_000 {
        return Err(EncodeError::invalid(ty, input, "seconds must be below 60"));
    }
    Ok(i64::from(time.num_seconds_from_midnight()) * 1_000_000
        + i64::from(time.nanosecond() / 1_000))
}

fn timestamp_to_micros(ty: PgType, input: &str) -> Result<i64, EncodeError> {
    let dt = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S%.f")
        .map_err(|e| EncodeError::invalid(ty, input, e))?;
    dt.signed_duration_since(pg_epoch())
        .num_microseconds()
        .ok_or_else(|| EncodeError::out_of_range(ty, input))
}

fn timestamptz_to_micros(input: &str) -> Result<i64, EncodeError> {
    let ty = PgType::TimestampTz;
    let (wall, offset) = split_offset(input);
    let offset_secs = match offset {
        None => 0,
        Some(o) => {
            parse_offset(o).ok_or_else(|| EncodeError::invalid(ty, input, "malformed UTC offset"))?
        }
    };
    let wall_micros = timestamp_to_micros(ty, wall)?;
    wall_micros
        .checked_sub(i64::from(offset_secs) * 1_000_000)
        .ok_or_else(|| EncodeError::out_of_range(ty, input))
}

/// Split a timestamp into its wall-time part and an optional trailing
/// offset. The search starts past the date so its `-` separators are never
/// mistaken for a sign.
fn split_offset(s: &str) -> (&str, Option<&str>) {
    let tail = 10.min(s.len());
    match s[tail..].find(&['+', '-', 'Z'][..]) {
        Some(i) => (s[..tail + i].trim_end(), Some(&s[tail + i..])),
        None => (s, None),
    }
}

/// Parse `Z`, `±HH:MM`, `±HHMM` or `±HH` into offset seconds east of UTC.
/// Signed hours must lie in [-12, 14] and minutes in [0, 59].
fn parse_offset(off: &str) -> Option<i32> {
    if off == "Z" {
        return Some(0);
    }
    let rest = off.strip_prefix('+').or_else(|| off.strip_prefix('-'))?;
    let sign: i32 = if off.starts_with('-') { -1 } else { 1 };
    let (hh, mm) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, ""),
    };
    if hh.is_empty() || hh.len() > 2 || !hh.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !mm.is_empty() && (mm.len() != 2 || !mm.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    let hours: i32 = hh.parse().ok()?;
    let minutes: i32 = if mm.is_empty() { 0 } else { mm.parse().ok()? };
    if minutes > 59 || !(-12..=14).contains(&(sign * hours)) {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60))
}

fn encode_macaddr(input: &str, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    let ty = PgType::MacAddr;
    let mut octets = [0u8; 6];
    let mut count = 0;
    for part in input.split(':') {
        if count == octets.len()
            || part.is_empty()
            || part.len() > 2
            || !part.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(EncodeError::invalid(ty, input, "expected six hex octets"));
        }
        octets[count] =
            u8::from_str_radix(part, 16).map_err(|e| EncodeError::invalid(ty, input, e))?;
        count += 1;
    }
    if count != octets.len() {
        return Err(EncodeError::invalid(ty, input, "expected six hex octets"));
    }
    out.extend_from_slice(&octets);
    Ok(())
}

fn encode_inet(input: &str, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    let ty = PgType::Inet;
    let (addr, prefix) = match input.split_once('/') {
        Some((a, p)) => (a, Some(p)),
        None => (input, None),
    };
    if addr.contains(':') {
        let v6: Ipv6Addr = addr.parse().map_err(|e| EncodeError::invalid(ty, input, e))?;
        let bits = parse_prefix(ty, input, prefix, 128)?;
        out.put_u8(AF_INET6);
        out.put_u8(bits);
        out.put_u8(u8::from(prefix.is_some()));
        out.put_u8(16);
        out.extend_from_slice(&v6.octets());
    } else {
        let v4: Ipv4Addr = addr.parse().map_err(|e| EncodeError::invalid(ty, input, e))?;
        let bits = parse_prefix(ty, input, prefix, 32)?;
        out.put_u8(AF_INET);
        out.put_u8(bits);
        out.put_u8(u8::from(prefix.is_some()));
        out.put_u8(4);
        out.extend_from_slice(&v4.octets());
    }
    Ok(())
}

fn parse_prefix(
    ty: PgType,
    input: &str,
    prefix: Option<&str>,
    max: u8,
) -> Result<u8, EncodeError> {
    match prefix {
        None => Ok(max),
        Some(p) => {
            let bits: u32 = p.parse().map_err(|e| EncodeError::invalid(ty, input, e))?;
            if bits > u32::from(max) {
                return Err(EncodeError::out_of_range(ty, input));
            }
            Ok(bits as u8)
        }
    }
}
