//! Product list configuration.
//!
//! Products are stored as a CSV file with one row per fund. The `ref` column
//! packs per-product overrides as `key=value` pairs separated by `;`
//! (e.g. `providers=fundgz,aniu;stale_rule=strict;timeout_s=5`). Rows whose
//! `enabled` cell is not `1` are dropped at load time and never reach the
//! refresh engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::staleness::StaleRule;

/// Providers tried, in order, when a product does not override the list.
pub const DEFAULT_PROVIDERS: [&str; 2] = ["fundgz", "aniu"];

/// Per-request timeout when a product does not override `timeout_s`.
pub const DEFAULT_TIMEOUT_S: u64 = 3;

/// One configured fund product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConfig {
    /// Provider-facing identifier (non-empty for any product the engine sees).
    pub code: String,
    /// Display label.
    pub name: String,
    /// Category tag (opaque to the engine).
    pub kind: String,
    /// Reserved; currently unused by the engine.
    pub mode: String,
    /// Per-product overrides: `providers`, `stale_rule`, `timeout_s`.
    #[serde(rename = "ref")]
    pub ref_: BTreeMap<String, String>,
    pub enabled: bool,
}

impl ProductConfig {
    /// The provider list for this product, falling back to
    /// [`DEFAULT_PROVIDERS`] when no override is present.
    ///
    /// An override of only separators (e.g. `","`) yields an empty list,
    /// not the default — the caller handles that case.
    pub fn providers(&self) -> Vec<String> {
        let raw = self.ref_.get("providers").map(String::as_str).unwrap_or("");
        if raw.is_empty() {
            return DEFAULT_PROVIDERS.iter().map(|p| (*p).to_string()).collect();
        }
        raw.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect()
    }

    /// The staleness rule for this product (default `auto`).
    pub fn stale_rule(&self) -> StaleRule {
        StaleRule::from_name(self.ref_.get("stale_rule").map(String::as_str).unwrap_or("auto"))
    }

    /// The per-request timeout. Any non-integer override silently falls back
    /// to [`DEFAULT_TIMEOUT_S`].
    pub fn timeout(&self) -> Duration {
        let secs = self
            .ref_
            .get("timeout_s")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_S);
        Duration::from_secs(secs)
    }
}

/// Errors from loading the product CSV.
#[derive(Debug, Error)]
pub enum ProductsError {
    #[error("read products file: {0}")]
    Csv(#[from] csv::Error),
}

/// Raw CSV row; all columns optional so partial files still load.
#[derive(Debug, Deserialize)]
struct ProductRow {
    #[serde(default)]
    code: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    mode: String,
    #[serde(default, rename = "ref")]
    ref_: String,
    #[serde(default = "enabled_default")]
    enabled: String,
}

fn enabled_default() -> String {
    "1".to_string()
}

/// Load the enabled products from a CSV file, preserving row order.
pub fn load_products(path: &Path) -> Result<Vec<ProductConfig>, ProductsError> {
    let reader = csv::Reader::from_path(path)?;
    products_from_csv(reader)
}

/// Parse enabled products from any CSV source (header row required).
pub fn products_from_csv<R: Read>(
    mut reader: csv::Reader<R>,
) -> Result<Vec<ProductConfig>, ProductsError> {
    let mut products = Vec::new();
    for row in reader.deserialize::<ProductRow>() {
        let row = row?;
        if row.enabled.trim() != "1" {
            continue;
        }
        products.push(ProductConfig {
            code: row.code.trim().to_string(),
            name: row.name.trim().to_string(),
            kind: row.kind.trim().to_string(),
            mode: row.mode.trim().to_string(),
            ref_: parse_ref(&row.ref_),
            enabled: true,
        });
    }
    Ok(products)
}

/// Unpack the `ref` column. Blank parts and parts without `=` are ignored.
pub fn parse_ref(raw: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for part in raw.split(';') {
        if part.trim().is_empty() {
            continue;
        }
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        map.insert(key.trim().to_string(), value.trim().to_string());
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_with_ref(raw: &str) -> ProductConfig {
        ProductConfig {
            code: "110022".into(),
            name: "Test Fund".into(),
            kind: "fund".into(),
            mode: String::new(),
            ref_: parse_ref(raw),
            enabled: true,
        }
    }

    fn from_csv_str(content: &str) -> Vec<ProductConfig> {
        products_from_csv(csv::Reader::from_reader(content.as_bytes())).unwrap()
    }

    #[test]
    fn ref_unpacks_pairs() {
        let map = parse_ref("providers=fundgz,aniu;stale_rule=strict;timeout_s=5");
        assert_eq!(map.get("providers").unwrap(), "fundgz,aniu");
        assert_eq!(map.get("stale_rule").unwrap(), "strict");
        assert_eq!(map.get("timeout_s").unwrap(), "5");
    }

    #[test]
    fn ref_ignores_blank_and_malformed_parts() {
        let map = parse_ref("; ;no_equals;key = value ;");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("key").unwrap(), "value");
    }

    #[test]
    fn providers_default_when_absent() {
        let p = product_with_ref("");
        assert_eq!(p.providers(), vec!["fundgz", "aniu"]);
    }

    #[test]
    fn providers_override_splits_and_trims() {
        let p = product_with_ref("providers= aniu , fundgz ");
        assert_eq!(p.providers(), vec!["aniu", "fundgz"]);
    }

    #[test]
    fn providers_of_only_separators_is_empty() {
        let p = product_with_ref("providers=,");
        assert!(p.providers().is_empty());
    }

    #[test]
    fn stale_rule_defaults_to_auto() {
        assert_eq!(product_with_ref("").stale_rule(), StaleRule::Auto);
        assert_eq!(product_with_ref("stale_rule=strict").stale_rule(), StaleRule::Strict);
        assert_eq!(product_with_ref("stale_rule=bogus").stale_rule(), StaleRule::Auto);
    }

    #[test]
    fn timeout_falls_back_on_non_integer() {
        assert_eq!(product_with_ref("").timeout(), Duration::from_secs(3));
        assert_eq!(product_with_ref("timeout_s=5").timeout(), Duration::from_secs(5));
        assert_eq!(product_with_ref("timeout_s=fast").timeout(), Duration::from_secs(3));
    }

    #[test]
    fn loader_skips_disabled_rows() {
        let csv = "code,name,kind,mode,ref,enabled\n\
                   110022,Fund A,fund,,,1\n\
                   161725,Fund B,fund,,,0\n\
                   005827,Fund C,fund,,,1\n";
        let products = from_csv_str(csv);
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].code, "110022");
        assert_eq!(products[1].code, "005827");
    }

    #[test]
    fn loader_parses_packed_ref_column() {
        let csv = "code,name,kind,mode,ref,enabled\n\
                   110022,Fund A,fund,intraday,\"providers=fundgz;timeout_s=5\",1\n";
        let products = from_csv_str(csv);
        assert_eq!(products[0].providers(), vec!["fundgz"]);
        assert_eq!(products[0].timeout(), Duration::from_secs(5));
        assert_eq!(products[0].mode, "intraday");
    }

    #[test]
    fn loader_trims_cells() {
        let csv = "code,name,kind,mode,ref,enabled\n\
                   \" 110022 \",\" Fund A \",fund,,, 1 \n";
        let products = from_csv_str(csv);
        assert_eq!(products[0].code, "110022");
        assert_eq!(products[0].name, "Fund A");
    }

    #[test]
    fn loader_treats_missing_enabled_column_as_enabled() {
        let csv = "code,name,kind,mode,ref\n110022,Fund A,fund,,\n";
        let products = from_csv_str(csv);
        assert_eq!(products.len(), 1);
    }
}
