//! Freshness rules for intraday estimates.
//!
//! A fetched value is only worth showing if it is from today and, while the
//! market is open, recent enough. Outside trading hours the age check is
//! suspended — the last quote of a session stays valid all evening.

use chrono::{DateTime, NaiveTime};
use chrono_tz::Tz;

/// How aggressively same-day data is aged out during trading hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaleRule {
    /// 15-minute threshold.
    #[default]
    Auto,
    /// 5-minute threshold.
    Strict,
}

impl StaleRule {
    /// Resolve a rule from its configured name. Anything other than
    /// `"strict"` (including the default `"auto"`) maps to [`StaleRule::Auto`].
    pub fn from_name(name: &str) -> Self {
        if name == "strict" {
            StaleRule::Strict
        } else {
            StaleRule::Auto
        }
    }

    fn max_age_minutes(self) -> f64 {
        match self {
            StaleRule::Strict => 5.0,
            StaleRule::Auto => 15.0,
        }
    }
}

/// Judge an as-of timestamp against the current time.
///
/// Returns the human-readable reason the data is stale, or `None` when it is
/// fresh. Missing timestamps and wrong-day timestamps are always stale; the
/// age threshold only applies while the market is open.
pub fn stale_reason(
    asof: Option<&DateTime<Tz>>,
    now: &DateTime<Tz>,
    rule: StaleRule,
) -> Option<String> {
    let asof = match asof {
        Some(t) => t,
        None => return Some("missing timestamp".to_string()),
    };

    if asof.date_naive() != now.date_naive() {
        return Some("date mismatch".to_string());
    }

    if in_trading_hours(now) {
        let age = now.signed_duration_since(*asof).num_milliseconds() as f64 / 60_000.0;
        if age > rule.max_age_minutes() {
            return Some(format!("age {age:.1}m"));
        }
    }

    None
}

/// Whether the current time falls within the trading sessions
/// (09:30–11:30 or 13:00–15:00, bounds inclusive).
pub fn in_trading_hours(now: &DateTime<Tz>) -> bool {
    let current = now.time();
    let morning_open = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
    let morning_close = NaiveTime::from_hms_opt(11, 30, 0).unwrap();
    let afternoon_open = NaiveTime::from_hms_opt(13, 0, 0).unwrap();
    let afternoon_close = NaiveTime::from_hms_opt(15, 0, 0).unwrap();

    (morning_open <= current && current <= morning_close)
        || (afternoon_open <= current && current <= afternoon_close)
}
