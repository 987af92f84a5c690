//! fundgz provider: JSONP-wrapped intraday fund estimates.
//!
//! The endpoint returns `jsonpgz({...});` with the estimate in `gszzl`
//! (a numeric-looking string) and its timestamp in `gztime`. A missing or
//! unparseable percentage is tolerated here — the staleness check upstream
//! decides whether the record is usable.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

use super::{truncate_raw, FetchError, ProviderResult, TextFetcher};
use crate::clock::{parse_asof, parse_percent};

lazy_static! {
    /// A brace-delimited object inside a parenthesized JSONP wrapper.
    static ref JSONP_BODY: Regex = Regex::new(r"\((\{.*\})\)").unwrap();
}

/// Estimate endpoint with a millisecond cache-buster.
pub(crate) fn url(code: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    format!("http://fundgz.1234567.com.cn/js/{code}.js?rt={millis}")
}

#[derive(Debug, Deserialize)]
struct FundgzPayload {
    /// Estimated intraday percentage, usually a string like `"1.23"`.
    gszzl: Option<Value>,
    /// Estimate timestamp, `YYYY-MM-DD HH:MM`.
    gztime: Option<String>,
    /// Date of the last confirmed net value.
    jzrq: Option<String>,
}

pub(crate) fn fetch(
    fetcher: &dyn TextFetcher,
    code: &str,
    timeout: Duration,
) -> Result<ProviderResult, FetchError> {
    let url = url(code);
    let raw = fetcher.fetch_text(&url, timeout)?;
    let body = extract_jsonp(&raw)?;
    let payload: FundgzPayload =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    let intraday_pct = payload.gszzl.as_ref().and_then(parse_percent);
    let asof_time = payload.gztime.as_deref().and_then(parse_asof);

    let mut meta = BTreeMap::new();
    meta.insert("provider".to_string(), json!("fundgz"));
    meta.insert(
        "gztime".to_string(),
        payload.gztime.map(Value::String).unwrap_or(Value::Null),
    );
    meta.insert(
        "est_date".to_string(),
        payload.jzrq.map(Value::String).unwrap_or(Value::Null),
    );
    meta.insert("raw_text".to_string(), json!(truncate_raw(&raw, 200)));

    Ok(ProviderResult {
        intraday_pct,
        asof_time,
        source_url: url,
        meta,
    })
}

/// Pull the JSON object out of a JSONP wrapper, or fail.
pub(crate) fn extract_jsonp(raw: &str) -> Result<&str, FetchError> {
    JSONP_BODY
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or(FetchError::MissingJsonpWrapper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::format_asof;
    use std::sync::Mutex;

    /// Returns one canned body for any URL, recording requests.
    struct CannedFetcher {
        body: String,
        requests: Mutex<Vec<String>>,
    }

    impl CannedFetcher {
        fn new(body: &str) -> Self {
            Self {
                body: body.to_string(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextFetcher for CannedFetcher {
        fn fetch_text(&self, url: &str, _timeout: Duration) -> Result<String, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            Ok(self.body.clone())
        }
    }

    #[test]
    fn extracts_wrapped_object() {
        let raw = r#"jsonpCallback({"gszzl":"1.23","gztime":"2024-05-01 10:00"})"#;
        assert_eq!(
            extract_jsonp(raw).unwrap(),
            r#"{"gszzl":"1.23","gztime":"2024-05-01 10:00"}"#
        );
    }

    #[test]
    fn missing_wrapper_fails() {
        let err = extract_jsonp(r#"{"gszzl":"1.23"}"#).unwrap_err();
        assert!(matches!(err, FetchError::MissingJsonpWrapper));
    }

    #[test]
    fn parses_percentage_and_timestamp() {
        let fetcher = CannedFetcher::new(
            r#"jsonpgz({"fundcode":"110022","gszzl":"1.23","gztime":"2024-05-01 10:00","jzrq":"2024-04-30"});"#,
        );
        let result = fetch(&fetcher, "110022", Duration::from_secs(3)).unwrap();

        assert_eq!(result.intraday_pct, Some(1.23));
        assert_eq!(
            format_asof(&result.asof_time.unwrap()),
            "2024-05-01T10:00:00+08:00"
        );
        assert_eq!(result.meta["provider"], json!("fundgz"));
        assert_eq!(result.meta["gztime"], json!("2024-05-01 10:00"));
        assert_eq!(result.meta["est_date"], json!("2024-04-30"));

        let requested = fetcher.requests.lock().unwrap();
        assert!(requested[0].starts_with("http://fundgz.1234567.com.cn/js/110022.js?rt="));
        assert_eq!(result.source_url, requested[0]);
    }

    #[test]
    fn unparseable_percentage_is_tolerated() {
        let fetcher = CannedFetcher::new(r#"jsonpgz({"gszzl":"--","gztime":"2024-05-01 10:00"});"#);
        let result = fetch(&fetcher, "110022", Duration::from_secs(3)).unwrap();
        assert_eq!(result.intraday_pct, None);
        assert!(result.asof_time.is_some());
    }

    #[test]
    fn invalid_json_inside_wrapper_fails() {
        let fetcher = CannedFetcher::new("jsonpgz({broken});");
        let err = fetch(&fetcher, "110022", Duration::from_secs(3)).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn raw_text_echo_is_truncated() {
        let padding = "x".repeat(400);
        let body = format!(r#"jsonpgz({{"gszzl":"0.10","gztime":"2024-05-01 10:00","pad":"{padding}"}});"#);
        let fetcher = CannedFetcher::new(&body);
        let result = fetch(&fetcher, "110022", Duration::from_secs(3)).unwrap();
        let echoed = result.meta["raw_text"].as_str().unwrap();
        assert_eq!(echoed.chars().count(), 200);
    }
}
