use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::ParseError;

/// An instant with nanosecond resolution, canonically UTC. Stored as
/// nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Datetime(i64);

impl Datetime {
    pub const fn from_nanos(nanos: i64) -> Self { Self(nanos) }

    pub const fn nanos(self) -> i64 { self.0 }
}

pub const DEFAULT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Numeric tokens above this magnitude are nanosecond timestamps.
const NANOS_CUTOFF: i64 = 10_i64.pow(16);
/// Numeric tokens above this magnitude (and below the nanosecond cutoff)
/// are millisecond timestamps; below, seconds.
const MILLIS_CUTOFF: i64 = 10_i64.pow(11);

/// Datetime formats tried after RFC 3339, most specific first.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%b-%Y", "%b %d, %Y", "%B %d, %Y"];

/// Parse one of the accepted datetime forms into UTC nanoseconds.
///
/// Purely numeric tokens are Unix timestamps, disambiguated by magnitude:
/// above 10^16 nanoseconds, above 10^11 milliseconds, otherwise seconds.
/// Empty and null-ish tokens are the zero instant.
pub fn parse_datetime(token: &str) -> Result<Datetime, ParseError> {
    let t = token.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("null") || t.eq_ignore_ascii_case("nil") {
        return Ok(Datetime(0));
    }

    if let Ok(n) = t.parse::<i64>() {
        let nanos = if n.unsigned_abs() > NANOS_CUTOFF as u64 {
            Some(n)
        } else if n.unsigned_abs() > MILLIS_CUTOFF as u64 {
            n.checked_mul(1_000_000)
        } else {
            n.checked_mul(1_000_000_000)
        };
        return nanos.map(Datetime).ok_or_else(|| ParseError::Datetime(token.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return to_nanos(dt.with_timezone(&Utc).naive_utc(), token);
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(t, fmt) {
            return to_nanos(naive, token);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(t, fmt) {
            return to_nanos(date.and_time(chrono::NaiveTime::MIN), token);
        }
    }
    Err(ParseError::Datetime(token.to_string()))
}

fn to_nanos(naive: NaiveDateTime, token: &str) -> Result<Datetime, ParseError> {
    naive.and_utc().timestamp_nanos_opt().map(Datetime).ok_or_else(|| ParseError::Datetime(token.to_string()))
}

pub fn format_datetime(dt: Datetime, fmt: &str) -> String { DateTime::<Utc>::from_timestamp_nanos(dt.nanos()).format(fmt).to_string() }
