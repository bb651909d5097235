//! JSON output formatter for simstats results

use chrono::Utc;
use serde_json::json;

use crate::output::PlotSummary;
use crate::pricing::SkuMergeReport;
use crate::Result;

/// JSON formatter for plot summaries and SKU merge reports
pub struct JsonFormatter {
    pretty: bool,
    metadata: Option<Metadata>,
}

struct Metadata {
    version: String,
    source: String,
}

impl JsonFormatter {
    /// Create a new JSON formatter producing compact output
    pub fn new() -> Self {
        Self {
            pretty: false,
            metadata: None,
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Wrap every document in a `metadata` block naming the tool version and
    /// the data source
    pub fn with_metadata(mut self, version: &str, source: &str) -> Self {
        self.metadata = Some(Metadata {
            version: version.to_string(),
            source: source.to_string(),
        });
        self
    }

    pub fn format_plot(&self, summary: &PlotSummary) -> Result<String> {
        let value = serde_json::to_value(summary)?;
        self.render(value)
    }

    pub fn format_sku_report(&self, report: &SkuMergeReport) -> Result<String> {
        let value = json!({
            "updated": report
                .updated
                .iter()
                .map(|(name, tiers)| json!({ "region": name, "tiers": tiers }))
                .collect::<Vec<_>>(),
            "without_rates": report.without_rates,
            "missing_sku": report.missing_sku,
            "written": report.written,
        });
        self.render(value)
    }

    fn render(&self, value: serde_json::Value) -> Result<String> {
        let value = match &self.metadata {
            Some(metadata) => json!({
                "metadata": {
                    "tool": "simstats",
                    "version": metadata.version,
                    "source": metadata.source,
                    "generated_at": Utc::now().to_rfc3339(),
                },
                "result": value,
            }),
            None => value,
        };

        let output = if self.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(output)
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}
