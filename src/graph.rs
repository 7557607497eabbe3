#![cfg(feature = "web")]
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;

use crate::DashboardResult;
use crate::aggregator::{GroupedTotal, HourlyTotal, thousands};

/// Fill color shared by every bar
pub const BAR_COLOR: RGBColor = RGBColor(0x00, 0x83, 0xB8);

/// Configuration options for chart generation
///
/// Charts are drawn as SVG with no background fill, so the page color shows
/// through.
#[derive(Clone, Debug)]
pub struct GraphOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,
}

impl GraphOptions {
    pub fn product_line() -> Self {
        Self {
            title: "Sales by Product Line".to_string(),
            x_label: "Total".to_string(),
            y_label: "Product line".to_string(),
            ..Self::default()
        }
    }

    pub fn hourly() -> Self {
        Self {
            title: "Sales by hour".to_string(),
            x_label: "hour".to_string(),
            y_label: "Total".to_string(),
            ..Self::default()
        }
    }
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            title: "Chart".to_string(),
            x_label: "X Axis".to_string(),
            y_label: "Y Axis".to_string(),
            width: 640,
            height: 420,
        }
    }
}

fn caption_font(title: &str) -> (String, FontDesc<'static>) {
    (
        title.to_string(),
        ("sans-serif", 22).into_font().style(FontStyle::Bold),
    )
}

/// Upper bound of a value axis with some headroom above the tallest bar
fn value_axis_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0, f64::max);
    if max > 0.0 { max * 1.05 } else { 1.0 }
}

/// Creates the horizontal "sales by product line" bar chart
///
/// One bar per group, drawn bottom to top in the order given, so the
/// ascending sort of the aggregator puts the best line on top.
///
/// # Returns
/// * The SVG document as a string, or a drawing error
pub fn product_line_chart(groups: &[GroupedTotal], options: &GraphOptions) -> DashboardResult<String> {
    let labels: Vec<String> = groups.iter().map(|g| g.label.clone()).collect();
    let slots = groups.len().max(1) as u32;
    let x_max = value_axis_max(groups.iter().map(|g| g.total));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        let (title, font) = caption_font(&options.title);

        let mut chart = ChartBuilder::on(&root)
            .caption(title, font)
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(170)
            .build_cartesian_2d(0f64..x_max, (0u32..slots).into_segmented())?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_labels(slots as usize)
            .y_label_formatter(&|v: &SegmentValue<u32>| match v {
                SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .x_label_formatter(&|v: &f64| thousands(v.round() as i64))
            .x_desc(options.x_label.as_str())
            .y_desc(options.y_label.as_str())
            .draw()?;

        chart.draw_series(
            Histogram::horizontal(&chart)
                .style(BAR_COLOR.filled())
                .margin(6)
                .data(groups.iter().enumerate().map(|(i, g)| (i as u32, g.total))),
        )?;

        root.present()?;
    }

    Ok(svg)
}

/// Creates the vertical "sales by hour" bar chart
///
/// The hour axis covers every hour between the first and last one with
/// sales, one tick per hour.
///
/// # Returns
/// * The SVG document as a string, or a drawing error
pub fn hourly_chart(hours: &[HourlyTotal], options: &GraphOptions) -> DashboardResult<String> {
    let first = hours.first().map(|h| h.hour as u32).unwrap_or(0);
    let last = hours.last().map(|h| h.hour as u32).unwrap_or(first);
    let y_max = value_axis_max(hours.iter().map(|h| h.total));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        let (title, font) = caption_font(&options.title);

        let mut chart = ChartBuilder::on(&root)
            .caption(title, font)
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d((first..last + 1).into_segmented(), 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .x_labels((last + 1 - first) as usize)
            .x_label_formatter(&|v: &SegmentValue<u32>| match v {
                SegmentValue::Exact(h) | SegmentValue::CenterOf(h) => h.to_string(),
                _ => String::new(),
            })
            .y_label_formatter(&|v: &f64| thousands(v.round() as i64))
            .x_desc(options.x_label.as_str())
            .y_desc(options.y_label.as_str())
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(BAR_COLOR.filled())
                .margin(4)
                .data(hours.iter().map(|h| (h.hour as u32, h.total))),
        )?;

        root.present()?;
    }

    Ok(svg)
}
