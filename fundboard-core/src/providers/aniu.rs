//! aniu provider: fund valuation endpoint with two candidate URLs.
//!
//! The `.json`-suffixed URL is tried before the bare one. Payloads come in
//! several shapes — clean JSON with one of four percentage field names, or
//! JSON-ish text the decoder chokes on — so parsing is dual-mode: decode
//! first, fall back to pattern search over the raw text. Unlike fundgz, a
//! payload without a percentage fails the candidate outright.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

use super::{truncate_raw, FetchError, ProviderResult, TextFetcher};
use crate::clock::{parse_asof, parse_percent};
use chrono::DateTime;
use chrono_tz::Tz;

lazy_static! {
    /// Quoted percentage fields, in payload-preference order.
    static ref PCT_PATTERNS: Vec<Regex> = vec![
        Regex::new(r#""gszzl"\s*:\s*"([+-]?[0-9.]+)""#).unwrap(),
        Regex::new(r#""gzzl"\s*:\s*"([+-]?[0-9.]+)""#).unwrap(),
        Regex::new(r#""estimate_rate"\s*:\s*"([+-]?[0-9.]+)""#).unwrap(),
        Regex::new(r#""estimateRate"\s*:\s*"([+-]?[0-9.]+)""#).unwrap(),
    ];
    static ref TIME_PATTERNS: Vec<Regex> = vec![
        Regex::new(r#""gztime"\s*:\s*"([^"]+)""#).unwrap(),
        Regex::new(r#""time"\s*:\s*"([^"]+)""#).unwrap(),
    ];
}

/// Bare valuation endpoint (the second candidate, and the canonical URL for
/// diagnostics).
pub(crate) fn url(code: &str) -> String {
    format!("https://www.aniu.com/fund/valuation/{code}")
}

fn json_url(code: &str) -> String {
    format!("https://www.aniu.com/fund/valuation/{code}.json")
}

#[derive(Debug, Deserialize)]
struct AniuPayload {
    gszzl: Option<Value>,
    gzzl: Option<Value>,
    estimate_rate: Option<Value>,
    #[serde(rename = "estimateRate")]
    estimate_rate_camel: Option<Value>,
    gztime: Option<String>,
    time: Option<String>,
}

impl AniuPayload {
    fn rate(&self) -> Option<&Value> {
        self.gszzl
            .as_ref()
            .or(self.gzzl.as_ref())
            .or(self.estimate_rate.as_ref())
            .or(self.estimate_rate_camel.as_ref())
    }

    fn asof(&self) -> Option<&str> {
        self.gztime.as_deref().or(self.time.as_deref())
    }
}

pub(crate) fn fetch(
    fetcher: &dyn TextFetcher,
    code: &str,
    timeout: Duration,
) -> Result<ProviderResult, FetchError> {
    let candidates = [json_url(code), url(code)];
    let mut last_error: Option<FetchError> = None;

    for candidate in &candidates {
        match fetch_candidate(fetcher, candidate, timeout) {
            Ok(result) => return Ok(result),
            Err(err) => last_error = Some(err),
        }
    }

    Err(FetchError::AniuExhausted(
        last_error.map(|e| e.to_string()).unwrap_or_default(),
    ))
}

fn fetch_candidate(
    fetcher: &dyn TextFetcher,
    url: &str,
    timeout: Duration,
) -> Result<ProviderResult, FetchError> {
    let raw = fetcher.fetch_text(url, timeout)?;
    let (pct, asof_time) = parse_payload(&raw);
    let intraday_pct = pct.ok_or(FetchError::MissingIntradayPct)?;

    let mut meta = BTreeMap::new();
    meta.insert("provider".to_string(), json!("aniu"));
    meta.insert("raw_text".to_string(), json!(truncate_raw(&raw, 200)));

    Ok(ProviderResult {
        intraday_pct: Some(intraday_pct),
        asof_time,
        source_url: url.to_string(),
        meta,
    })
}

/// Extract percentage and timestamp from an aniu payload.
///
/// JSON-shaped text is decoded and the first present of `gszzl`, `gzzl`,
/// `estimate_rate`, `estimateRate` supplies the percentage. When decoding
/// fails (or the text is not JSON-shaped), pattern search over the raw text
/// recovers whatever subset it can. Either element may be `None`.
pub(crate) fn parse_payload(raw: &str) -> (Option<f64>, Option<DateTime<Tz>>) {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        if let Ok(payload) = serde_json::from_str::<AniuPayload>(trimmed) {
            let pct = payload.rate().and_then(parse_percent);
            let asof = payload.asof().and_then(parse_asof);
            return (pct, asof);
        }
    }

    let pct = PCT_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(raw))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok());

    let asof = TIME_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(raw))
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_asof(m.as_str()));

    (pct, asof)
}
