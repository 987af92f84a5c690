//! FundBoard Core — intraday fund estimate engine.
//!
//! This crate contains the provider fallback and staleness-validation
//! engine:
//! - Product configuration (CSV list with packed per-product overrides)
//! - Provider fetchers behind an HTTP seam (fundgz JSONP, aniu dual-mode)
//! - Payload parsing tolerant of heterogeneous encodings
//! - Trading-hours-aware staleness rules
//! - Per-product fallback orchestration reducing every outcome to one
//!   normalized output record

pub mod clock;
pub mod products;
pub mod providers;
pub mod record;
pub mod refresh;
pub mod staleness;

pub use clock::TIMEZONE;
pub use products::{load_products, ProductConfig, ProductsError};
pub use providers::{FetchError, HttpTextFetcher, Provider, ProviderResult, TextFetcher};
pub use record::{OutputRecord, Status};
pub use refresh::{refresh, refresh_at, refresh_product};
pub use staleness::StaleRule;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the types crossing the crate boundary are
    /// Send + Sync, so a caller may process products on worker threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<ProductConfig>();
        require_sync::<ProductConfig>();
        require_send::<ProviderResult>();
        require_sync::<ProviderResult>();
        require_send::<OutputRecord>();
        require_sync::<OutputRecord>();
        require_send::<FetchError>();
        require_sync::<FetchError>();
        require_send::<HttpTextFetcher>();
        require_sync::<HttpTextFetcher>();
    }
}
