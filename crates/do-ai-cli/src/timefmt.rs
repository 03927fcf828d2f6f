// SPDX-License-Identifier: MIT

//! Minimal RFC3339 formatting and parsing, avoiding a `chrono` dependency
//! for a handful of UTC timestamp calls. Grounded on the teacher's
//! `transport/inbox.rs::chrono_lite`, extended with a formatter (the
//! teacher's version only parses).

const DAYS_IN_MONTH: [i64; 13] = [0, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

fn is_leap(y: i64) -> bool {
    (y % 4 == 0 && y % 100 != 0) || y % 400 == 0
}

/// Format a Unix timestamp (seconds) as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_rfc3339(unix_seconds: u64) -> String {
    let mut days = (unix_seconds / 86400) as i64;
    let secs_of_day = unix_seconds % 86400;
    let (hour, min, sec) = (secs_of_day / 3600, (secs_of_day % 3600) / 60, secs_of_day % 60);

    let mut year = 1970i64;
    loop {
        let year_days = if is_leap(year) { 366 } else { 365 };
        if days < year_days {
            break;
        }
        days -= year_days;
        year += 1;
    }

    let mut month = 1i64;
    loop {
        let mut month_days = DAYS_IN_MONTH[month as usize];
        if month == 2 && is_leap(year) {
            month_days += 1;
        }
        if days < month_days {
            break;
        }
        days -= month_days;
        month += 1;
    }
    let day = days + 1;

    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{min:02}:{sec:02}Z")
}

/// Format the current wall-clock time as RFC3339.
pub fn format_rfc3339_now() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format_rfc3339(secs)
}

/// Parse an RFC3339 timestamp to Unix seconds. Returns `None` on malformed
/// input rather than falling back to "now" — callers that want a fallback
/// do that explicitly at the call site.
pub fn parse_rfc3339(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.len() < 19 {
        return None;
    }
    let year: i64 = s.get(0..4)?.parse().ok()?;
    let month: i64 = s.get(5..7)?.parse().ok()?;
    let day: i64 = s.get(8..10)?.parse().ok()?;
    let hour: i64 = s.get(11..13)?.parse().ok()?;
    let min: i64 = s.get(14..16)?.parse().ok()?;
    let sec: i64 = s.get(17..19)?.parse().ok()?;

    let mut days: i64 = 0;
    for y in 1970..year {
        days += if is_leap(y) { 366 } else { 365 };
    }
    for m in 1..month {
        days += DAYS_IN_MONTH[m as usize];
        if m == 2 && is_leap(year) {
            days += 1;
        }
    }
    days += day - 1;

    let secs = days * 86400 + hour * 3600 + min * 60 + sec;
    if secs < 0 {
        None
    } else {
        Some(secs as u64)
    }
}

#[cfg(test)]
#[path = "timefmt_tests.rs"]
mod tests;
