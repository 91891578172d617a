use std::path::Path;

use plotters::prelude::*;
use tracing::debug;

use crate::analysis::Frequency;
use crate::error::{Result, ScraperError};

const BAR_COLOR: RGBColor = RGBColor(54, 162, 235);
const FONT: &str = "sans-serif";

/// Captions and axis labels need a font backend; without one plotters
/// panics on the first piece of text, so only bars and axes are drawn.
const DRAW_TEXT: bool = cfg!(feature = "chart-labels");

/// A single-series vertical bar chart.
#[derive(Debug, Clone)]
pub struct BarChart {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub bars: Vec<Frequency>,
    /// Canvas size in pixels
    pub size: (u32, u32),
}

fn chart_err<E: std::fmt::Display>(e: E) -> ScraperError {
    ScraperError::Chart(e.to_string())
}

/// Draw `chart` on a fresh canvas and save it as a PNG at `path`.
///
/// Each call owns its own bitmap, so nothing carries over between charts.
/// Bars keep the order of `chart.bars`; x labels are rotated to fit long
/// category names.
pub fn render_bar_chart(chart: &BarChart, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, chart.size).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let slots = chart.bars.len().max(1) as u32;
    let y_max = chart.bars.iter().map(|b| b.count).max().unwrap_or(0) as u32 + 1;
    let labels: Vec<&str> = chart.bars.iter().map(|b| b.label.as_str()).collect();

    let mut builder = ChartBuilder::on(&root);
    builder.margin(15);
    if DRAW_TEXT {
        builder
            .caption(&chart.title, (FONT, 24.0))
            .x_label_area_size(140)
            .y_label_area_size(60);
    } else {
        builder.x_label_area_size(10).y_label_area_size(10);
    }
    let mut ctx = builder
        .build_cartesian_2d((0u32..slots).into_segmented(), 0u32..y_max)
        .map_err(chart_err)?;

    let label_formatter = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).map(|s| s.to_string()).unwrap_or_default(),
        _ => String::new(),
    };

    let mut mesh = ctx.configure_mesh();
    mesh.disable_x_mesh();
    if DRAW_TEXT {
        mesh.x_labels(slots as usize)
            .x_label_formatter(&label_formatter)
            .x_label_style(
                (FONT, 12.0)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            )
            .x_desc(chart.x_desc.as_str())
            .y_desc(chart.y_desc.as_str())
            .axis_desc_style((FONT, 15.0));
    } else {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw().map_err(chart_err)?;

    ctx.draw_series(
        Histogram::vertical(&ctx)
            .style(BAR_COLOR.filled())
            .margin(8)
            .data(
                chart
                    .bars
                    .iter()
                    .enumerate()
                    .map(|(i, bar)| (i as u32, bar.count as u32)),
            ),
    )
    .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    debug!(path = %path.display(), bars = chart.bars.len(), text = DRAW_TEXT, "chart saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_png_of_requested_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.png");
        let chart = BarChart {
            title: "Number of Violations per Year".to_string(),
            x_desc: "Year".to_string(),
            y_desc: "Number of Violations".to_string(),
            bars: vec![Frequency::new("2022", 3), Frequency::new("2023", 7)],
            size: (400, 300),
        };

        render_bar_chart(&chart, &path).unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (400, 300));
    }

    #[test]
    fn test_renders_empty_chart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        let chart = BarChart {
            title: "Nothing".to_string(),
            x_desc: String::new(),
            y_desc: String::new(),
            bars: Vec::new(),
            size: (200, 150),
        };

        render_bar_chart(&chart, &path).unwrap();
        assert!(path.exists());
    }

    #[cfg(feature = "chart-labels")]
    #[test]
    fn test_title_is_drawn_above_the_bars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("titled.png");
        let chart = BarChart {
            title: "Number of Violations per Year".to_string(),
            x_desc: "Year".to_string(),
            y_desc: "Number of Violations".to_string(),
            bars: vec![Frequency::new("2022", 3), Frequency::new("2023", 7)],
            size: (400, 300),
        };

        render_bar_chart(&chart, &path).unwrap();

        // Bars are light blue and axes sit at the plot edges, so dark pixels
        // in the top centre band can only come from the caption.
        let img = image::open(&path).unwrap().to_rgb8();
        let dark = (100..300)
            .flat_map(|x| (0..40).map(move |y| (x, y)))
            .filter(|&(x, y)| img.get_pixel(x, y).0.iter().all(|&c| c < 100))
            .count();
        assert!(dark > 0, "no caption pixels found");
    }
}
