// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn format_known_epoch() {
    assert_eq!(format_rfc3339(0), "1970-01-01T00:00:00Z");
    assert_eq!(format_rfc3339(86400), "1970-01-02T00:00:00Z");
}

#[test]
fn round_trip_through_parse() {
    for secs in [0u64, 86400, 1_700_000_000, 1_600_000_000] {
        let formatted = format_rfc3339(secs);
        assert_eq!(parse_rfc3339(&formatted), Some(secs));
    }
}

#[test]
fn parse_rejects_short_strings() {
    assert_eq!(parse_rfc3339("2026"), None);
}

#[test]
fn parse_handles_fractional_and_offset_suffix_prefix() {
    // Only the first 19 chars are load-bearing; trailing content beyond
    // that (fractional seconds, zone) is ignored.
    assert_eq!(parse_rfc3339("2026-02-15T10:30:00.123Z"), parse_rfc3339("2026-02-15T10:30:00Z"));
}

#[test]
fn leap_year_day_count() {
    // 2024-02-29 exists; 2023-02-29 would overflow into March.
    let leap = format_rfc3339(parse_rfc3339("2024-02-29T00:00:00Z").unwrap());
    assert_eq!(leap, "2024-02-29T00:00:00Z");
}
