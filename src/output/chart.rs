//! SVG chart rendering

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use log::debug;
use plotters::prelude::*;

use crate::analytics::{AlignedSeries, Histogram};
use crate::config::PlotSettings;
use crate::error::{no_data, render_error, Result};
use crate::output::format_sim_time;

fn caption_font() -> FontDesc<'static> {
    ("sans-serif", 32.0).into_font()
}

fn label_font() -> FontDesc<'static> {
    ("sans-serif", 18.0).into_font()
}

/// Renders charts into the configured output directory
pub struct ChartRenderer {
    settings: PlotSettings,
}

impl ChartRenderer {
    pub fn new(settings: PlotSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PlotSettings {
        &self.settings
    }

    /// Bars for every histogram bin
    pub fn histogram(
        &self,
        name: &str,
        title: &str,
        x_desc: &str,
        hist: &Histogram,
    ) -> Result<PathBuf> {
        let (x_min, x_max) = match (hist.edges.first(), hist.edges.last()) {
            (Some(&first), Some(&last)) if hist.counts.len() + 1 == hist.edges.len() => {
                (first, last)
            }
            _ => return Err(no_data(format!("histogram for {} has no bins", name))),
        };
        let y_max = (hist.max_count() as f64 * 1.05).max(1.0);

        let path = self.prepare(name)?;
        {
            let root = SVGBackend::new(&path, self.settings.size()).into_drawing_area();
            root.fill(&WHITE).map_err(render_error)?;

            let mut chart = ChartBuilder::on(&root)
                .caption(title, caption_font())
                .margin(20)
                .x_label_area_size(60)
                .y_label_area_size(90)
                .build_cartesian_2d(x_min..x_max, 0f64..y_max)
                .map_err(render_error)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_desc(x_desc)
                .y_desc("Count")
                .axis_desc_style(label_font())
                .y_label_formatter(&|y| format!("{:.0}", y))
                .draw()
                .map_err(render_error)?;

            chart
                .draw_series(hist.counts.iter().enumerate().map(|(i, &count)| {
                    Rectangle::new(
                        [(hist.edges[i], 0.0), (hist.edges[i + 1], count as f64)],
                        BLUE.mix(0.7).filled(),
                    )
                }))
                .map_err(render_error)?;

            root.present().map_err(render_error)?;
        }
        Ok(path)
    }

    /// Two weight series side by side in every bin of a shared axis
    pub fn grouped_bins(
        &self,
        name: &str,
        title: &str,
        labels: (&str, &str),
        aligned: &AlignedSeries,
    ) -> Result<PathBuf> {
        let x_max = match aligned.axis.last() {
            Some(bin) => bin.end as f64,
            None => return Err(no_data(format!("no bins to draw for {}", name))),
        };
        let y_max = aligned
            .first
            .iter()
            .chain(aligned.second.iter())
            .copied()
            .fold(0.0, f64::max);
        let y_max = (y_max * 1.05).max(1.0);

        let path = self.prepare(name)?;
        {
            let root = SVGBackend::new(&path, self.settings.size()).into_drawing_area();
            root.fill(&WHITE).map_err(render_error)?;

            let mut chart = ChartBuilder::on(&root)
                .caption(title, caption_font())
                .margin(20)
                .x_label_area_size(60)
                .y_label_area_size(90)
                .build_cartesian_2d(0f64..x_max, 0f64..y_max)
                .map_err(render_error)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_desc("Sim Time")
                .y_desc("Count")
                .axis_desc_style(label_font())
                .x_label_formatter(&|x| format_sim_time(*x as i64))
                .y_label_formatter(&|y| format!("{:.0}", y))
                .draw()
                .map_err(render_error)?;

            let first_color = BLUE.mix(0.7);
            let second_color = RED.mix(0.7);

            chart
                .draw_series(aligned.axis.iter().zip(&aligned.first).map(|(bin, &w)| {
                    let mid = (bin.start + bin.end) as f64 / 2.0;
                    Rectangle::new([(bin.start as f64, 0.0), (mid, w)], first_color.filled())
                }))
                .map_err(render_error)?
                .label(labels.0)
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], first_color.filled()));

            chart
                .draw_series(aligned.axis.iter().zip(&aligned.second).map(|(bin, &w)| {
                    let mid = (bin.start + bin.end) as f64 / 2.0;
                    Rectangle::new([(mid, 0.0), (bin.end as f64, w)], second_color.filled())
                }))
                .map_err(render_error)?
                .label(labels.1)
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], second_color.filled()));

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .label_font(label_font())
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(render_error)?;

            root.present().map_err(render_error)?;
        }
        Ok(path)
    }

    /// One line per key. With `step` the value holds until the next point.
    pub fn curves(
        &self,
        name: &str,
        title: &str,
        y_desc: &str,
        curves: &BTreeMap<String, Vec<(i64, f64)>>,
        step: bool,
    ) -> Result<PathBuf> {
        let points = curves.values().flatten();
        let x_min = points.clone().map(|&(t, _)| t).min();
        let x_max = points.clone().map(|&(t, _)| t).max();
        let (x_min, x_max) = match (x_min, x_max) {
            (Some(lo), Some(hi)) if lo < hi => (lo as f64, hi as f64),
            (Some(lo), Some(_)) => (lo as f64, lo as f64 + 1.0),
            _ => return Err(no_data(format!("no points to draw for {}", name))),
        };
        let y_max = points.map(|&(_, v)| v).fold(0.0, f64::max);
        let y_max = (y_max * 1.05).max(1.0);

        let path = self.prepare(name)?;
        {
            let root = SVGBackend::new(&path, self.settings.size()).into_drawing_area();
            root.fill(&WHITE).map_err(render_error)?;

            let mut chart = ChartBuilder::on(&root)
                .caption(title, caption_font())
                .margin(20)
                .x_label_area_size(60)
                .y_label_area_size(90)
                .build_cartesian_2d(x_min..x_max, 0f64..y_max)
                .map_err(render_error)?;

            chart
                .configure_mesh()
                .x_desc("Sim Time")
                .y_desc(y_desc)
                .axis_desc_style(label_font())
                .x_label_formatter(&|x| format_sim_time(*x as i64))
                .draw()
                .map_err(render_error)?;

            for (idx, (key, points)) in curves.iter().enumerate() {
                let color = Palette99::pick(idx).to_rgba();
                let line = if step {
                    step_points(points)
                } else {
                    points.iter().map(|&(t, v)| (t as f64, v)).collect()
                };
                debug!("Drawing {} points for {}", line.len(), key);

                chart
                    .draw_series(LineSeries::new(line, color.stroke_width(2)))
                    .map_err(render_error)?
                    .label(key.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .label_font(label_font())
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(render_error)?;

            root.present().map_err(render_error)?;
        }
        Ok(path)
    }

    fn prepare(&self, name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.settings.out_dir)?;
        let path = self.settings.path_for(name);
        debug!("Rendering {}", path.display());
        Ok(path)
    }
}

/// Points for a staircase line: each value holds until the next timestamp
fn step_points(points: &[(i64, f64)]) -> Vec<(f64, f64)> {
    let mut line = Vec::with_capacity(points.len() * 2);
    for (idx, &(t, v)) in points.iter().enumerate() {
        if idx > 0 {
            line.push((t as f64, points[idx - 1].1));
        }
        line.push((t as f64, v));
    }
    line
}
