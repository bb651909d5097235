//! Human-readable text output formatter for simstats results

use std::fmt::Write;

use crate::error::render_error;
use crate::output::{format_sim_time, PlotData, PlotSummary};
use crate::pricing::SkuMergeReport;
use crate::Result;

/// Text formatter for plot summaries and SKU merge reports
pub struct TextFormatter {}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new() -> Self {
        Self {}
    }

    /// Format a plot summary as text
    pub fn format_plot(&self, summary: &PlotSummary) -> Result<String> {
        let mut output = String::new();
        let title = format!("{} report", summary.plot);

        writeln!(output, "{}", title).map_err(render_error)?;
        writeln!(output, "{}", "=".repeat(title.len())).map_err(render_error)?;
        writeln!(output, "Chart: {}", summary.chart_path.display()).map_err(render_error)?;
        writeln!(output, "Rows: {}", summary.rows).map_err(render_error)?;

        match &summary.data {
            PlotData::Aligned { labels, series } => {
                writeln!(output, "Bin Interval: {} s", series.interval).map_err(render_error)?;
                writeln!(output, "Bins: {}", series.len()).map_err(render_error)?;
                for (label, weights) in [(&labels.0, &series.first), (&labels.1, &series.second)] {
                    let total: f64 = weights.iter().sum();
                    writeln!(output, "Total {}: {}", label, total).map_err(render_error)?;
                    let peak = weights
                        .iter()
                        .enumerate()
                        .max_by(|a, b| a.1.total_cmp(b.1));
                    if let Some((idx, weight)) = peak {
                        writeln!(
                            output,
                            "Peak {}: {} at {}",
                            label,
                            weight,
                            format_sim_time(series.axis[idx].start)
                        )
                        .map_err(render_error)?;
                    }
                }
            }
            PlotData::Histogram(hist) => {
                writeln!(output, "Bins: {}", hist.counts.len()).map_err(render_error)?;
                writeln!(output, "Values: {}", hist.total()).map_err(render_error)?;
                if let (Some(first), Some(last)) = (hist.edges.first(), hist.edges.last()) {
                    writeln!(output, "Range: {:.2} .. {:.2}", first, last).map_err(render_error)?;
                }
                let fullest = hist.counts.iter().enumerate().max_by_key(|&(_, count)| *count);
                if let Some((idx, count)) = fullest {
                    writeln!(
                        output,
                        "Largest Bin: {} values in [{:.2}, {:.2})",
                        count,
                        hist.edges[idx],
                        hist.edges[idx + 1]
                    )
                    .map_err(render_error)?;
                }
            }
            PlotData::Curves(curves) => {
                writeln!(output, "Series: {}", curves.len()).map_err(render_error)?;
                for (key, points) in curves {
                    let peak = points.iter().map(|&(_, v)| v).fold(f64::NAN, f64::max);
                    let last = points.last().map_or(0.0, |&(_, v)| v);
                    writeln!(
                        output,
                        "  {}: points={}, last={}, peak={}",
                        key,
                        points.len(),
                        last,
                        peak
                    )
                    .map_err(render_error)?;
                }
            }
        }

        Ok(output)
    }

    /// Format the outcome of a SKU merge as text
    pub fn format_sku_report(&self, report: &SkuMergeReport) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "SKU Merge Report").map_err(render_error)?;
        writeln!(output, "================").map_err(render_error)?;
        for (name, tiers) in &report.updated {
            writeln!(output, "Updated {} ({} tiers)", name, tiers).map_err(render_error)?;
        }
        for name in &report.without_rates {
            writeln!(output, "Failed to update {}", name).map_err(render_error)?;
        }
        for name in &report.missing_sku {
            writeln!(output, "Missing pricing data for {}", name).map_err(render_error)?;
        }
        if report.written {
            writeln!(output, "Output written").map_err(render_error)?;
        } else {
            writeln!(output, "No output written").map_err(render_error)?;
        }

        Ok(output)
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new()
    }
}
