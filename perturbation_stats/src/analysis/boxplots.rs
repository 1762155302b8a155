//! Grouped boxplots of the long-format statistics table.
//!
//! Figures are drawn on an RGB raster and handed to [`write_image_pdf`].

use std::path::{Path, PathBuf};

use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::style::FontTransform;
use polars::prelude::PolarsResult;
use tracing::{info, warn};

use crate::analysis::pdf_export::write_image_pdf;
use crate::helper_functions::natural_sorted;
use crate::models::{polars_err, Record, StatisticKind};

/// 16 x 12 inches.
pub const FIGURE_PIXELS: (u32, u32) = (1600, 1200);
pub const FIGURE_POINTS: (i64, i64) = (16 * 72, 12 * 72);

pub const HUE_ORDER: [&str; 3] = ["1", "2", "3"];

const HUE_COLOURS: [RGBColor; 3] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
];

pub struct BoxplotSpec {
    pub kind: StatisticKind,
    pub file_name: &'static str,
    pub y_desc: &'static str,
    /// Split every gene into one box per treatment.
    pub by_treatment: bool,
}

pub const FIGURES: [BoxplotSpec; 3] = [
    BoxplotSpec {
        kind: StatisticKind::PathwayDegree,
        file_name: "degrees.pdf",
        y_desc: "Pathway degree",
        by_treatment: false,
    },
    BoxplotSpec {
        kind: StatisticKind::ExpressionCountMean,
        file_name: "counts_mean.pdf",
        y_desc: "Mean expression",
        by_treatment: true,
    },
    BoxplotSpec {
        kind: StatisticKind::ExpressionCountStd,
        file_name: "counts_std.pdf",
        y_desc: "Expression standard deviation",
        by_treatment: true,
    },
];

/// Values of one figure, indexed `[gene][hue]`.
#[derive(Debug, PartialEq)]
pub struct GroupedValues {
    pub genes: Vec<String>,
    pub hues: Vec<String>,
    pub values: Vec<Vec<Vec<f64>>>,
}

impl GroupedValues {
    pub fn collect(records: &[Record], spec: &BoxplotSpec) -> Self {
        // x order covers every gene label of the table, not only this kind
        let genes = natural_sorted(records.iter().map(|r| r.gene.as_str()));
        let hues: Vec<String> = if spec.by_treatment {
            HUE_ORDER.iter().map(|h| h.to_string()).collect()
        } else {
            vec![String::new()]
        };
        let mut values = vec![vec![Vec::new(); hues.len()]; genes.len()];

        let mut dropped = 0usize;
        for record in records.iter().filter(|r| r.kind == spec.kind) {
            let Some(value) = record.value else {
                dropped += 1;
                continue;
            };
            let hue = if spec.by_treatment {
                hues.iter().position(|h| h == record.treatment())
            } else {
                Some(0)
            };
            let gene = genes.iter().position(|g| *g == record.gene);
            match (gene, hue) {
                (Some(g), Some(h)) => values[g][h].push(value),
                _ => dropped += 1,
            }
        }

        if dropped > 0 {
            warn!(
                "{}: {} records without a value or with a treatment outside {:?} left out",
                spec.kind.as_str(),
                dropped,
                HUE_ORDER
            );
        }

        GroupedValues {
            genes,
            hues,
            values,
        }
    }

    fn value_range(&self) -> (f32, f32) {
        let all = self.values.iter().flatten().flatten().copied();
        let (lo, hi) = all.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if !lo.is_finite() || !hi.is_finite() {
            return (0.0, 1.0);
        }
        if (hi - lo).abs() < 1e-9 {
            return ((lo - 1.0) as f32, (hi + 1.0) as f32);
        }
        let pad = (hi - lo) * 0.05;
        ((lo - pad) as f32, (hi + pad) as f32)
    }
}

/// Render the three figures into `out_dir`, returning the written paths.
pub fn render_all(records: &[Record], out_dir: &Path) -> PolarsResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(FIGURES.len());
    for spec in &FIGURES {
        let grouped = GroupedValues::collect(records, spec);
        let pixels = draw_boxplot(&grouped, spec)?;

        let path = out_dir.join(spec.file_name);
        write_image_pdf(&path, pixels, FIGURE_PIXELS, FIGURE_POINTS)?;
        written.push(path);
    }
    info!("Rendered {} figures into {}", written.len(), out_dir.display());
    Ok(written)
}

fn draw_boxplot(grouped: &GroupedValues, spec: &BoxplotSpec) -> PolarsResult<Vec<u8>> {
    let (width, height) = FIGURE_PIXELS;
    let mut buffer = vec![0u8; (width * height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| polars_err(Box::new(e)))?;

        let n_genes = grouped.genes.len().max(1) as u32;
        let (y_lo, y_hi) = grouped.value_range();

        let mut chart = ChartBuilder::on(&root)
            .margin(30)
            .x_label_area_size(260)
            .y_label_area_size(120)
            .build_cartesian_2d((0u32..n_genes).into_segmented(), y_lo..y_hi)
            .map_err(|e| polars_err(Box::new(e)))?;

        let x_label_style = TextStyle::from(("sans-serif", 22)).transform(FontTransform::Rotate270);
        let genes = &grouped.genes;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .label_style(("sans-serif", 22))
            .x_labels(genes.len().max(1))
            .x_label_style(x_label_style)
            .x_label_formatter(&|v: &SegmentValue<u32>| match v {
                SegmentValue::CenterOf(i) => genes.get(*i as usize).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .x_desc("Perturbed gene(s)")
            .y_desc(spec.y_desc)
            .axis_desc_style(("sans-serif", 28))
            .draw()
            .map_err(|e| polars_err(Box::new(e)))?;

        let n_hues = grouped.hues.len();
        let box_width: u32 = if spec.by_treatment { 18 } else { 40 };
        for (h, hue) in grouped.hues.iter().enumerate() {
            let colour = HUE_COLOURS[h % HUE_COLOURS.len()];
            let offset = (h as f64 - (n_hues as f64 - 1.0) / 2.0) * (box_width as f64 + 6.0);

            let boxes: Vec<_> = grouped
                .values
                .iter()
                .enumerate()
                .filter(|(_, per_hue)| !per_hue[h].is_empty())
                .map(|(g, per_hue)| {
                    let quartiles = Quartiles::new(&per_hue[h]);
                    Boxplot::new_vertical(SegmentValue::CenterOf(g as u32), &quartiles)
                        .width(box_width)
                        .whisker_width(0.5)
                        .style(colour)
                        .offset(offset)
                })
                .collect();

            let anno = chart
                .draw_series(boxes)
                .map_err(|e| polars_err(Box::new(e)))?;
            if spec.by_treatment {
                anno.label(format!("treatment {}", hue)).legend(move |(x, y)| {
                    Rectangle::new([(x, y - 8), (x + 16, y + 8)], colour.filled())
                });
            }
        }

        if spec.by_treatment {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(&BLACK)
                .label_font(("sans-serif", 22))
                .draw()
                .map_err(|e| polars_err(Box::new(e)))?;
        }

        root.present().map_err(|e| polars_err(Box::new(e)))?;
    }

    Ok(buffer)
}
