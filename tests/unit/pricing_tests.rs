//! Unit tests for merging SKU tiered rates into region configs

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use simstats::pricing::{index_skus, merge_tiered_rates};
use simstats::{update_sim_config, SimStatsError};
use tempfile::TempDir;

fn sku(id: &str, rates: Value) -> Value {
    json!({
        "skuId": id,
        "description": format!("Network egress {}", id),
        "pricingInfo": [{
            "pricingExpression": {
                "usageUnit": "GiBy",
                "tieredRates": rates,
            }
        }]
    })
}

fn two_tiers() -> Value {
    json!([
        { "startUsageAmount": 0, "unitPrice": { "units": "0", "nanos": 120000000 } },
        { "startUsageAmount": 1024, "unitPrice": { "units": "0", "nanos": 110000000 } },
    ])
}

/// Write config and catalog files, returning their paths plus an output path
fn write_inputs(dir: &Path, config: &Value, catalog: &Value) -> (PathBuf, PathBuf, PathBuf) {
    let config_path = dir.join("gcp_default.json");
    let catalog_path = dir.join("skus.json");
    fs::write(&config_path, serde_json::to_string(config).unwrap()).unwrap();
    fs::write(&catalog_path, serde_json::to_string(catalog).unwrap()).unwrap();
    (config_path, catalog_path, dir.join("new_gcp_default.json"))
}

fn read_output(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_matching_region_receives_tiered_rates() {
    let temp_dir = TempDir::new().unwrap();
    let config = json!({
        "gcp": {
            "regions": [
                { "name": "europe-west1", "skuId": "A-1", "location": "St. Ghislain" }
            ]
        }
    });
    let catalog = json!({ "skus": [sku("A-1", two_tiers())] });
    let (config_path, catalog_path, output_path) = write_inputs(temp_dir.path(), &config, &catalog);

    let report = update_sim_config(&config_path, &catalog_path, &output_path).unwrap();
    assert_eq!(report.updated, vec![("europe-west1".to_string(), 2)]);
    assert!(report.written);

    let output = read_output(&output_path);
    let region = &output["gcp"]["regions"][0];
    assert_eq!(region["tieredRates"], two_tiers());
    assert_eq!(region["location"], "St. Ghislain");
    assert_eq!(region["skuId"], "A-1");
}

#[test]
fn test_output_keeps_key_order_and_two_space_indent() {
    let temp_dir = TempDir::new().unwrap();
    let config = json!({
        "version": 3,
        "gcp": { "regions": [{ "name": "r1", "skuId": "A-1" }] },
        "aws": { "enabled": false }
    });
    let catalog = json!({ "skus": [sku("A-1", two_tiers())] });
    let (config_path, catalog_path, output_path) = write_inputs(temp_dir.path(), &config, &catalog);

    update_sim_config(&config_path, &catalog_path, &output_path).unwrap();

    let text = fs::read_to_string(&output_path).unwrap();
    assert!(text.starts_with("{\n  \"version\": 3,\n  \"gcp\": {\n    \"regions\""));
    let version = text.find("\"version\"").unwrap();
    let gcp = text.find("\"gcp\"").unwrap();
    let aws = text.find("\"aws\"").unwrap();
    assert!(version < gcp && gcp < aws);
}

#[test]
fn test_empty_rates_leave_region_unchanged() {
    let mut regions = vec![json!({ "name": "r1", "skuId": "A-1" })];
    let skus = index_skus(&json!({ "skus": [sku("A-1", json!([]))] })).unwrap();

    let report = merge_tiered_rates(&mut regions, &skus).unwrap();
    assert_eq!(report.without_rates, vec!["r1".to_string()]);
    assert!(report.updated.is_empty());
    assert_eq!(regions[0], json!({ "name": "r1", "skuId": "A-1" }));
}

#[test]
fn test_missing_sku_leaves_region_unchanged() {
    let mut regions = vec![
        json!({ "name": "r1", "skuId": "A-1" }),
        json!({ "name": "r2", "skuId": "B-2" }),
    ];
    let skus = index_skus(&json!({ "skus": [sku("A-1", two_tiers())] })).unwrap();

    let report = merge_tiered_rates(&mut regions, &skus).unwrap();
    assert_eq!(report.updated, vec![("r1".to_string(), 2)]);
    assert_eq!(report.missing_sku, vec!["r2".to_string()]);
    assert!(regions[1].get("tieredRates").is_none());
}

#[test]
fn test_duplicate_sku_is_an_error() {
    let catalog = json!({ "skus": [sku("A-1", two_tiers()), sku("A-1", json!([]))] });
    let err = index_skus(&catalog).unwrap_err();
    assert!(matches!(err, SimStatsError::Pricing { .. }));
    assert!(err.to_string().contains("A-1"));
}

#[test]
fn test_sku_without_id_is_an_error() {
    let catalog = json!({ "skus": [{ "pricingInfo": [] }] });
    assert!(index_skus(&catalog).is_err());
}

#[test]
fn test_region_without_sku_id_is_an_error() {
    let mut regions = vec![json!({ "name": "r1" })];
    let skus = index_skus(&json!({ "skus": [sku("A-1", two_tiers())] })).unwrap();
    assert!(matches!(
        merge_tiered_rates(&mut regions, &skus),
        Err(SimStatsError::Pricing { .. })
    ));
}

#[test]
fn test_multiple_pricing_infos_are_an_error() {
    let mut entry = sku("A-1", two_tiers());
    let info = entry["pricingInfo"][0].clone();
    entry["pricingInfo"] = json!([info.clone(), info]);

    let mut regions = vec![json!({ "name": "r1", "skuId": "A-1" })];
    let skus = index_skus(&json!({ "skus": [entry] })).unwrap();
    let err = merge_tiered_rates(&mut regions, &skus).unwrap_err();
    assert!(err.to_string().contains("2 pricingInfo entries"));
}

#[test]
fn test_empty_catalog_reports_every_region_missing() {
    let temp_dir = TempDir::new().unwrap();
    let config = json!({ "gcp": { "regions": [{ "name": "r1", "skuId": "A-1" }] } });
    let (config_path, catalog_path, output_path) =
        write_inputs(temp_dir.path(), &config, &json!({ "skus": [] }));

    let report = update_sim_config(&config_path, &catalog_path, &output_path).unwrap();
    assert_eq!(report.missing_sku, vec!["r1".to_string()]);
    assert!(report.written);
    assert_eq!(read_output(&output_path), config);
}

#[test]
fn test_no_regions_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let config = json!({ "gcp": { "regions": [] } });
    let catalog = json!({ "skus": [sku("A-1", two_tiers())] });
    let (config_path, catalog_path, output_path) = write_inputs(temp_dir.path(), &config, &catalog);

    let report = update_sim_config(&config_path, &catalog_path, &output_path).unwrap();
    assert!(!report.written);
    assert!(!output_path.exists());
}

#[test]
fn test_missing_input_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("absent.json");
    let err = update_sim_config(&missing, &missing, &temp_dir.path().join("out.json")).unwrap_err();
    assert!(matches!(err, SimStatsError::Configuration { .. }));
}
