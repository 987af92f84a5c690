//! Operating timezone and timestamp/number parsing helpers.
//!
//! Every timestamp the board handles — provider payloads in, rendered
//! records out — is interpreted in one fixed market timezone. Providers
//! send naive wall-clock strings in a handful of formats; parsing is
//! best-effort and never fails the caller.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone};
use chrono_tz::Tz;

/// The fixed operating timezone for all timestamp interpretation and output.
pub const TIMEZONE: Tz = chrono_tz::Asia::Singapore;

/// Textual patterns providers use for their as-of timestamps, tried in order
/// before the general ISO-8601 fallback.
const ASOF_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

/// Parse a provider as-of timestamp, localized to the operating timezone.
///
/// Tries the two fixed provider patterns, then a general ISO-8601 parse.
/// Offset-carrying inputs keep their wall-clock time and are re-anchored to
/// the operating timezone. Returns `None` on total failure.
pub fn parse_asof(value: &str) -> Option<DateTime<Tz>> {
    for fmt in ASOF_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return localize(naive);
        }
    }
    if let Ok(naive) = value.parse::<NaiveDateTime>() {
        return localize(naive);
    }
    if let Ok(offset_dt) = DateTime::parse_from_rfc3339(value) {
        return localize(offset_dt.naive_local());
    }
    None
}

/// Render a timestamp as ISO-8601 with second precision in the operating
/// timezone, e.g. `2024-05-01T10:15:00+08:00`.
pub fn format_asof(value: &DateTime<Tz>) -> String {
    value
        .with_timezone(&TIMEZONE)
        .to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Convert a provider-supplied percentage (JSON string or number) to `f64`.
///
/// Absent or non-numeric input yields `None`; it is the caller's decision
/// whether a missing percentage is an error.
pub fn parse_percent(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn localize(naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    // Singapore has no DST; `single()` is unambiguous for every wall time.
    TIMEZONE.from_local_datetime(&naive).single()
}
