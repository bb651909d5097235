//! Merging cloud billing SKU prices into a simulation region config
//!
//! The region config holds `gcp.regions`, each naming a `skuId`. The billing
//! catalog holds `skus`, each with one `pricingInfo` entry whose
//! `pricingExpression.tieredRates` list is copied into the matching region.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::error::{config_error, Result, SimStatsError};

/// What happened to each region during a merge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkuMergeReport {
    /// Regions that received tiered rates, with the number of tiers
    pub updated: Vec<(String, usize)>,
    /// Regions whose SKU has no tiered rates
    pub without_rates: Vec<String>,
    /// Regions whose SKU is absent from the catalog
    pub missing_sku: Vec<String>,
    /// Whether an output file was written
    pub written: bool,
}

fn pricing_error(message: impl Into<String>) -> SimStatsError {
    SimStatsError::Pricing {
        message: message.into(),
    }
}

/// Index the catalog's `skus` array by `skuId`.
///
/// An empty or missing array yields an empty index. A SKU without an id or an
/// id seen twice is an error.
pub fn index_skus(catalog: &Value) -> Result<HashMap<String, Value>> {
    let skus = catalog
        .get("skus")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if skus.is_empty() {
        warn!("No skus found in catalog");
    }

    let mut by_id = HashMap::with_capacity(skus.len());
    for sku in skus {
        let id = sku
            .get("skuId")
            .and_then(Value::as_str)
            .ok_or_else(|| pricing_error("SKU object without a skuId"))?;
        if by_id.insert(id.to_string(), sku.clone()).is_some() {
            return Err(pricing_error(format!("Duplicate skuId {}", id)));
        }
    }
    Ok(by_id)
}

/// Copy tiered rates from `skus` into every region object.
///
/// Regions whose SKU is missing or has no rates are reported and left as
/// they are. A region without a `skuId`, or a SKU that does not carry exactly
/// one `pricingInfo` entry, aborts the merge.
pub fn merge_tiered_rates(
    regions: &mut [Value],
    skus: &HashMap<String, Value>,
) -> Result<SkuMergeReport> {
    let mut report = SkuMergeReport::default();

    for region in regions.iter_mut() {
        let name = region
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>")
            .to_string();
        let sku_id = region
            .get("skuId")
            .and_then(Value::as_str)
            .ok_or_else(|| pricing_error(format!("Region {} has no skuId", name)))?;

        let sku = match skus.get(sku_id) {
            Some(sku) => sku,
            None => {
                warn!("No pricing data for SKU {} of region {}", sku_id, name);
                report.missing_sku.push(name);
                continue;
            }
        };

        let pricing_info = sku
            .get("pricingInfo")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let pricing = match pricing_info {
            [pricing] => pricing,
            other => {
                return Err(pricing_error(format!(
                    "SKU {} has {} pricingInfo entries, expected exactly one",
                    sku_id,
                    other.len()
                )))
            }
        };

        let tiered_rates = pricing
            .pointer("/pricingExpression/tieredRates")
            .and_then(Value::as_array)
            .filter(|rates| !rates.is_empty())
            .cloned();

        match (tiered_rates, region.as_object_mut()) {
            (Some(rates), Some(object)) => {
                let tiers = rates.len();
                object.insert("tieredRates".to_string(), Value::Array(rates));
                info!("Updated {}", name);
                report.updated.push((name, tiers));
            }
            _ => {
                warn!("Failed to update {}", name);
                report.without_rates.push(name);
            }
        }
    }

    Ok(report)
}

/// Merge the catalog at `catalog_path` into the config at `config_path` and
/// write the result to `output_path` with 2-space indentation. Nothing is
/// written when the config has no regions.
pub fn update_sim_config(
    config_path: &Path,
    catalog_path: &Path,
    output_path: &Path,
) -> Result<SkuMergeReport> {
    let mut config = read_json(config_path)?;
    let catalog = read_json(catalog_path)?;
    let skus = index_skus(&catalog)?;

    let regions = match config.pointer_mut("/gcp/regions") {
        None | Some(Value::Null) => None,
        Some(Value::Array(regions)) if regions.is_empty() => None,
        Some(Value::Array(regions)) => Some(regions),
        Some(_) => {
            return Err(config_error(
                format!("gcp.regions in {} is not a list", config_path.display()),
                Some("regions"),
            ))
        }
    };

    let mut report = match regions {
        Some(regions) => merge_tiered_rates(regions, &skus)?,
        None => {
            warn!("No regions found in {}", config_path.display());
            return Ok(SkuMergeReport::default());
        }
    };

    fs::write(output_path, serde_json::to_string_pretty(&config)?)?;
    info!("Wrote {}", output_path.display());
    report.written = true;
    Ok(report)
}

fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        config_error(
            format!("Cannot read {}: {}", path.display(), e),
            Some("path"),
        )
    })?;
    Ok(serde_json::from_str(&content)?)
}
