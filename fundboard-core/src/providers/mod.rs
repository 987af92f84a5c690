//! Provider fetchers and the HTTP seam.
//!
//! The provider set is closed: names from product config resolve to a
//! [`Provider`] variant or fail as "unsupported". The actual HTTP transport
//! sits behind the [`TextFetcher`] trait so tests can substitute canned
//! responses and count calls.

pub mod aniu;
pub mod fundgz;

use chrono::DateTime;
use chrono_tz::Tz;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Browser-identifying header sent with every provider request.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36";

/// A supported data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Fundgz,
    Aniu,
}

impl Provider {
    /// The name this provider goes by in product configuration.
    pub fn name(self) -> &'static str {
        match self {
            Provider::Fundgz => "fundgz",
            Provider::Aniu => "aniu",
        }
    }

    /// The URL this provider would be queried at for `code`. Used for
    /// diagnostics when a fetch fails before any URL was recorded.
    pub fn canonical_url(self, code: &str) -> String {
        match self {
            Provider::Fundgz => fundgz::url(code),
            Provider::Aniu => aniu::url(code),
        }
    }

    /// Fetch and parse one intraday estimate for `code`.
    pub fn fetch(
        self,
        fetcher: &dyn TextFetcher,
        code: &str,
        timeout: Duration,
    ) -> Result<ProviderResult, FetchError> {
        match self {
            Provider::Fundgz => fundgz::fetch(fetcher, code, timeout),
            Provider::Aniu => aniu::fetch(fetcher, code, timeout),
        }
    }
}

impl FromStr for Provider {
    type Err = FetchError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "fundgz" => Ok(Provider::Fundgz),
            "aniu" => Ok(Provider::Aniu),
            other => Err(FetchError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// One successful fetch attempt. Transient: produced by a provider call,
/// consumed immediately by the fallback loop.
#[derive(Debug, Clone)]
pub struct ProviderResult {
    /// Signed intraday percentage; `None` when the payload carried no
    /// parseable value.
    pub intraday_pct: Option<f64>,
    /// As-of timestamp in the operating timezone; `None` when unparseable.
    pub asof_time: Option<DateTime<Tz>>,
    /// The exact URL queried.
    pub source_url: String,
    /// Diagnostic echoes: provider name, raw fields, truncated raw body.
    pub meta: BTreeMap<String, serde_json::Value>,
}

/// Why a provider attempt failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("network error for {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("invalid fundgz response")]
    MissingJsonpWrapper,

    #[error("decode error: {0}")]
    Decode(String),

    #[error("aniu payload missing intraday_pct")]
    MissingIntradayPct,

    #[error("aniu failed: {0}")]
    AniuExhausted(String),
}

/// The HTTP seam: fetch a URL's body as text within a timeout.
pub trait TextFetcher: Send + Sync {
    fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

/// Production transport: blocking `reqwest` with a browser User-Agent and a
/// per-request timeout. Response bytes decode leniently — invalid UTF-8 is
/// replaced, never rejected.
pub struct HttpTextFetcher {
    client: reqwest::blocking::Client,
}

impl HttpTextFetcher {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }
}

impl Default for HttpTextFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl TextFetcher for HttpTextFetcher {
    fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().map_err(|e| FetchError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// First `limit` characters of a raw response body, for diagnostics.
pub(crate) fn truncate_raw(raw: &str, limit: usize) -> String {
    raw.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_resolve() {
        assert_eq!("fundgz".parse::<Provider>().unwrap(), Provider::Fundgz);
        assert_eq!("aniu".parse::<Provider>().unwrap(), Provider::Aniu);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = "sina".parse::<Provider>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported provider: sina");
    }

    #[test]
    fn canonical_urls_embed_the_code() {
        let url = Provider::Fundgz.canonical_url("110022");
        assert!(url.starts_with("http://fundgz.1234567.com.cn/js/110022.js?rt="));
        assert_eq!(
            Provider::Aniu.canonical_url("110022"),
            "https://www.aniu.com/fund/valuation/110022"
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let raw = "基".repeat(300);
        let cut = truncate_raw(&raw, 200);
        assert_eq!(cut.chars().count(), 200);
    }
}
