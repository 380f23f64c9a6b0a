use crate::error::ParseError;

/// A signed span with nanosecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Duration(i64);

impl Duration {
    pub const fn from_nanos(nanos: i64) -> Self { Self(nanos) }

    pub const fn nanos(self) -> i64 { self.0 }
}

const NANOS_PER_SECOND: i128 = 1_000_000_000;
const NANOS_PER_MINUTE: i128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: i128 = 60 * NANOS_PER_MINUTE;
const NANOS_PER_DAY: i128 = 24 * NANOS_PER_HOUR;

/// Parse `[-]?([0-9]+d)?(<duration>)?` where the optional day prefix adds
/// 24-hour days and the remainder is a sequence of `number unit` components
/// with units `h`, `m`, `s`, `ms`, `us`/`µs`, `ns`. The empty token is the
/// zero duration.
pub fn parse_duration(token: &str) -> Result<Duration, ParseError> {
    let t = token.trim();
    if t.is_empty() {
        return Ok(Duration(0));
    }
    let err = || ParseError::Duration(token.to_string());

    let (negative, body) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t),
    };
    if body.is_empty() {
        return Err(err());
    }

    let mut total: i128 = 0;
    let mut rest = body;

    // day prefix: digits immediately followed by 'd'
    let digits = body.len() - body.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 && body[digits..].starts_with('d') {
        let days: i128 = body[..digits].parse().map_err(|_| err())?;
        total = days.checked_mul(NANOS_PER_DAY).ok_or_else(err)?;
        rest = &body[digits + 1..];
    }

    if !rest.is_empty() {
        total = total.checked_add(parse_components(rest).ok_or_else(err)?).ok_or_else(err)?;
    }

    if negative {
        total = -total;
    }
    i64::try_from(total).map(Duration).map_err(|_| err())
}

/// The `number unit` component sequence: `2h30m`, `1.5s`, `250ms`, `10us`.
fn parse_components(s: &str) -> Option<i128> {
    let mut total: i128 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let int_len = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let int_part = &rest[..int_len];
        rest = &rest[int_len..];

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_len = after_dot.len() - after_dot.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            frac_part = &after_dot[..frac_len];
            rest = &after_dot[frac_len..];
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }

        let unit_nanos = if let Some(r) = rest.strip_prefix("ns") {
            rest = r;
            1
        } else if let Some(r) = rest.strip_prefix("us").or_else(|| rest.strip_prefix("µs")) {
            rest = r;
            1_000
        } else if let Some(r) = rest.strip_prefix("ms") {
            rest = r;
            1_000_000
        } else if let Some(r) = rest.strip_prefix('s') {
            rest = r;
            NANOS_PER_SECOND
        } else if let Some(r) = rest.strip_prefix('m') {
            rest = r;
            NANOS_PER_MINUTE
        } else if let Some(r) = rest.strip_prefix('h') {
            rest = r;
            NANOS_PER_HOUR
        } else {
            return None;
        };

        if !int_part.is_empty() {
            let whole: i128 = int_part.parse().ok()?;
            total = total.checked_add(whole.checked_mul(unit_nanos)?)?;
        }
        if !frac_part.is_empty() {
            let frac: i128 = frac_part.parse().ok()?;
            let scale = 10_i128.checked_pow(frac_part.len() as u32)?;
            total = total.checked_add(frac.checked_mul(unit_nanos)? / scale)?;
        }
    }
    Some(total)
}

/// Compact rendering: `45s`, `2h30m0s`, `1d2h0m`, `250ms`. A day component
/// is followed by the sub-day breakdown with its trailing zero-second
/// component stripped.
pub fn format_compact(d: Duration) -> String {
    if d.nanos() == 0 {
        return "0s".to_string();
    }
    let mut out = String::new();
    if d.nanos() < 0 {
        out.push('-');
    }
    let mut abs = (d.nanos() as i128).abs();
    let days = abs / NANOS_PER_DAY;
    abs %= NANOS_PER_DAY;

    if days > 0 {
        out.push_str(&days.to_string());
        out.push('d');
        if abs != 0 {
            let rest = format_sub_day(abs);
            // the zero-second component is noise after a day count
            match rest.strip_suffix("0s") {
                Some(prefix) if prefix.chars().last().is_some_and(|c| !c.is_ascii_digit()) => out.push_str(prefix),
                _ => out.push_str(&rest),
            }
        }
    } else {
        out.push_str(&format_sub_day(abs));
    }
    out
}

/// Sub-day breakdown in the `XhYmZs` shape: hours lead when present, then
/// minutes, and seconds always close (with trailing-zero-trimmed fraction).
/// Sub-second values use a single unit: `250ms`, `1.5us`, `30ns`.
fn format_sub_day(abs: i128) -> String {
    if abs < NANOS_PER_SECOND {
        return if abs < 1_000 {
            format!("{}ns", abs)
        } else if abs < 1_000_000 {
            format!("{}us", frac_string(abs, 1_000))
        } else {
            format!("{}ms", frac_string(abs, 1_000_000))
        };
    }
    let hours = abs / NANOS_PER_HOUR;
    let minutes = (abs % NANOS_PER_HOUR) / NANOS_PER_MINUTE;
    let second_nanos = abs % NANOS_PER_MINUTE;
    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    out.push_str(&format!("{}s", frac_string(second_nanos, NANOS_PER_SECOND)));
    out
}

/// `nanos / unit` with the fraction's trailing zeros trimmed: `2`, `1.5`, `0.25`.
fn frac_string(nanos: i128, unit: i128) -> String {
    let whole = nanos / unit;
    let frac = nanos % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let width = unit.ilog10() as usize;
    let mut s = format!("{}.{:0width$}", whole, frac, width = width);
    while s.ends_with('0') {
        s.pop();
    }
    s
}

/// Prose rendering: `1 day 2 hours 30 minutes`. Zero components are
/// skipped; the zero duration is `0 seconds`.
pub fn format_verbose(d: Duration) -> String {
    if d.nanos() == 0 {
        return "0 seconds".to_string();
    }
    let mut out = String::new();
    if d.nanos() < 0 {
        out.push('-');
    }
    let mut abs = (d.nanos() as i128).abs();
    let units: &[(i128, &str)] = &[
        (NANOS_PER_DAY, "day"),
        (NANOS_PER_HOUR, "hour"),
        (NANOS_PER_MINUTE, "minute"),
        (NANOS_PER_SECOND, "second"),
        (1_000_000, "millisecond"),
        (1_000, "microsecond"),
        (1, "nanosecond"),
    ];
    let mut first = true;
    for (unit, name) in units {
        let count = abs / unit;
        abs %= unit;
        if count == 0 {
            continue;
        }
        if !first {
            out.push(' ');
        }
        first = false;
        out.push_str(&count.to_string());
        out.push(' ');
        out.push_str(name);
        if count != 1 {
            out.push('s');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nanos_of(token: &str) -> i64 { parse_duration(token).unwrap().nanos() }

    #[test]
    fn component_parsing() {
        assert_eq!(nanos_of(""), 0);
        assert_eq!(nanos_of("45s"), 45 * 1_000_000_000);
        assert_eq!(nanos_of("2h30m"), (2 * 3600 + 30 * 60) * 1_000_000_000);
        assert_eq!(nanos_of("2h30m0s"), nanos_of("2h30m"));
        assert_eq!(nanos_of("1.5s"), 1_500_000_000);
        assert_eq!(nanos_of("250ms"), 250_000_000);
        assert_eq!(nanos_of("10us"), 10_000);
        assert_eq!(nanos_of("10µs"), 10_000);
        assert_eq!(nanos_of("7ns"), 7);
        assert_eq!(nanos_of("-90m"), -90 * 60 * 1_000_000_000);
    }

    #[test]
    fn day_prefix() {
        assert_eq!(nanos_of("1d"), 24 * 3600 * 1_000_000_000);
        assert_eq!(nanos_of("2d2h30m"), (2 * 86_400 + 2 * 3600 + 30 * 60) * 1_000_000_000);
        assert_eq!(nanos_of("-1d12h"), -(36 * 3600) * 1_000_000_000);
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["x", "5", "5x", "-", "1dd", "d"] {
            assert!(parse_duration(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn compact_formatting() {
        assert_eq!(format_compact(Duration::from_nanos(0)), "0s");
        assert_eq!(format_compact(parse_duration("45s").unwrap()), "45s");
        assert_eq!(format_compact(parse_duration("90m").unwrap()), "1h30m0s");
        assert_eq!(format_compact(parse_duration("2h30m").unwrap()), "2h30m0s");
        assert_eq!(format_compact(parse_duration("1.5s").unwrap()), "1.5s");
        assert_eq!(format_compact(parse_duration("250ms").unwrap()), "250ms");
        assert_eq!(format_compact(parse_duration("-90m").unwrap()), "-1h30m0s");
    }

    #[test]
    fn compact_day_formatting_strips_zero_seconds() {
        assert_eq!(format_compact(parse_duration("2d").unwrap()), "2d");
        assert_eq!(format_compact(parse_duration("1d2h").unwrap()), "1d2h0m");
        assert_eq!(format_compact(parse_duration("1d2h5s").unwrap()), "1d2h0m5s");
        assert_eq!(format_compact(parse_duration("1d1m10s").unwrap()), "1d1m10s");
    }

    #[test]
    fn compact_round_trip() {
        for canonical in ["0s", "45s", "2h30m0s", "1.5s", "250ms", "-1h30m0s"] {
            let parsed = parse_duration(canonical).unwrap();
            assert_eq!(format_compact(parsed), canonical, "{canonical:?}");
        }
    }

    #[test]
    fn verbose_formatting() {
        assert_eq!(format_verbose(Duration::from_nanos(0)), "0 seconds");
        assert_eq!(format_verbose(parse_duration("1d2h30m").unwrap()), "1 day 2 hours 30 minutes");
        assert_eq!(format_verbose(parse_duration("1.5s").unwrap()), "1 second 500 milliseconds");
        assert_eq!(format_verbose(parse_duration("-2h").unwrap()), "-2 hours");
    }
}
