//! The normalized per-product output record.
//!
//! Every refresh outcome — fresh success, stale data, provider errors —
//! reduces to one `OutputRecord`. Consumers treat `status` as the success
//! signal; `intraday_pct` may be null even on `ok`.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::clock::format_asof;
use crate::products::ProductConfig;
use crate::providers::{Provider, ProviderResult};

/// Pipeline tag carried by every record.
pub const SOURCE_MODE: &str = "fund_intraday";

/// Refresh outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Fresh value obtained.
    Ok,
    /// No fresh value; the last known reason was staleness.
    Na,
    /// No fresh value; the last known reason was a fetch failure.
    Error,
}

/// Partial state accumulated while walking a product's provider list.
/// Feeds the exhausted-record constructor when no provider produced a fresh
/// value.
#[derive(Debug, Clone, Default)]
pub struct FallbackState {
    pub error: String,
    pub provider: String,
    pub url: String,
    pub meta: BTreeMap<String, serde_json::Value>,
    pub asof: Option<DateTime<Tz>>,
}

/// One normalized result row, in input-product order.
#[derive(Debug, Clone, Serialize)]
pub struct OutputRecord {
    pub code: String,
    pub name: String,
    pub kind: String,
    pub intraday_pct: Option<f64>,
    pub status: Status,
    /// Human-readable diagnostic; empty on success.
    pub error: String,
    pub source_mode: &'static str,
    pub source_provider: String,
    pub source_url: String,
    /// ISO-8601 in the operating timezone; never null.
    pub asof_time: String,
    pub meta: BTreeMap<String, serde_json::Value>,
}

impl OutputRecord {
    /// Build the record for a fresh provider success.
    pub fn from_success(
        product: &ProductConfig,
        provider: Provider,
        result: ProviderResult,
        now: &DateTime<Tz>,
    ) -> Self {
        OutputRecord {
            code: product.code.clone(),
            name: product.name.clone(),
            kind: product.kind.clone(),
            intraday_pct: result.intraday_pct,
            status: Status::Ok,
            error: String::new(),
            source_mode: SOURCE_MODE,
            source_provider: provider.name().to_string(),
            source_url: result.source_url,
            asof_time: format_asof(&result.asof_time.unwrap_or(*now)),
            meta: result.meta,
        }
    }

    /// Build the record for an exhausted fallback chain from whatever partial
    /// state was captured along the way.
    pub fn from_fallback(
        product: &ProductConfig,
        status: Status,
        state: FallbackState,
        now: &DateTime<Tz>,
    ) -> Self {
        OutputRecord {
            code: product.code.clone(),
            name: product.name.clone(),
            kind: product.kind.clone(),
            intraday_pct: None,
            status,
            error: state.error,
            source_mode: SOURCE_MODE,
            source_provider: state.provider,
            source_url: state.url,
            asof_time: format_asof(&state.asof.unwrap_or(*now)),
            meta: state.meta,
        }
    }
}
