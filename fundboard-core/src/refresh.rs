//! Refresh orchestration — per-product provider fallback.
//!
//! Each product walks its configured provider list in order. The first
//! provider whose data passes the staleness check wins and later providers
//! are never tried. Stale results and fetch failures both advance the walk,
//! but a stale result still updates the last-known state (url, meta, asof)
//! so the exhausted record can report it. Nothing raised here ever crosses a
//! product boundary: every failure is folded into the product's own record.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::clock::TIMEZONE;
use crate::products::ProductConfig;
use crate::providers::{Provider, TextFetcher};
use crate::record::{FallbackState, OutputRecord, Status};
use crate::staleness;

/// Run one refresh cycle over all products, in input order, at the current
/// time.
pub fn refresh(products: &[ProductConfig], fetcher: &dyn TextFetcher) -> Vec<OutputRecord> {
    refresh_at(products, fetcher, Utc::now().with_timezone(&TIMEZONE))
}

/// Run one refresh cycle with an explicit "now" (tests pin this to control
/// trading-hours and age checks).
pub fn refresh_at(
    products: &[ProductConfig],
    fetcher: &dyn TextFetcher,
    now: DateTime<Tz>,
) -> Vec<OutputRecord> {
    products
        .iter()
        .map(|product| refresh_product(product, fetcher, &now))
        .collect()
}

/// Produce exactly one record for one product.
pub fn refresh_product(
    product: &ProductConfig,
    fetcher: &dyn TextFetcher,
    now: &DateTime<Tz>,
) -> OutputRecord {
    let providers = product.providers();
    let rule = product.stale_rule();
    let timeout = product.timeout();

    let mut state = FallbackState {
        // With an empty provider list no fetch happens; report the primary
        // default provider as the last-known one.
        provider: providers
            .last()
            .cloned()
            .unwrap_or_else(|| "fundgz".to_string()),
        ..FallbackState::default()
    };

    for name in &providers {
        let attempt = name
            .parse::<Provider>()
            .and_then(|provider| provider.fetch(fetcher, &product.code, timeout).map(|r| (provider, r)));

        match attempt {
            Ok((provider, result)) => {
                match staleness::stale_reason(result.asof_time.as_ref(), now, rule) {
                    None => {
                        debug!(code = %product.code, provider = provider.name(), "fresh value accepted");
                        return OutputRecord::from_success(product, provider, result, now);
                    }
                    Some(reason) => {
                        debug!(code = %product.code, provider = provider.name(), %reason, "stale value, trying next provider");
                        state.provider = provider.name().to_string();
                        state.url = result.source_url;
                        state.meta = result.meta;
                        state.asof = result.asof_time;
                        state.error = format!("stale: {reason}");
                    }
                }
            }
            Err(err) => {
                warn!(code = %product.code, provider = %name, error = %err, "provider attempt failed");
                state.error = err.to_string();
                state.provider = name.clone();
                if state.url.is_empty() {
                    if let Ok(provider) = name.parse::<Provider>() {
                        state.url = provider.canonical_url(&product.code);
                    }
                }
            }
        }
    }

    // Exhausted: classify by the final recorded error only (last-write-wins).
    let status = if state.error.starts_with("stale:") {
        Status::Na
    } else {
        Status::Error
    };
    OutputRecord::from_fallback(product, status, state, now)
}
