/// Server-side chart rendering
///
/// Draws the record band, the 1981-2010 normal band and the selected year's
/// actual bars from a `ColumnDataSource` onto an SVG string. The x axis is the
/// calendar position 1..=366, so Feb 29 sits between Feb 28 and Mar 1.
use chrono::NaiveDate;
use plotters::prelude::*;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::dashboard::ColumnDataSource;

pub const CHART_SIZE: (u32, u32) = (1100, 550);

const RECORD_COLOR: RGBColor = RGBColor(0xB0, 0xC4, 0xDE);
const NORMAL_COLOR: RGBColor = RGBColor(0x64, 0x95, 0xED);
const ACTUAL_COLOR: RGBColor = RGBColor(0x46, 0x82, 0xB4);

// Used when there is nothing to scale the y axis to
const EMPTY_RANGE: (f64, f64) = (-20.0, 40.0);
const Y_PADDING: f64 = 5.0;
const BAR_HALF_WIDTH: f64 = 0.4;

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("Failed to draw chart: {0}")]
    Drawing(String),
}

/// Which series to draw; the page's legend toggles map onto these
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct ChartLayers {
    pub record: bool,
    pub normal: bool,
    pub actual: bool,
}

impl Default for ChartLayers {
    fn default() -> Self {
        Self {
            record: true,
            normal: true,
            actual: true,
        }
    }
}

/// Render the chart as a standalone `<svg>` document
///
/// An empty source draws the axes and legend only, with `message` (if any)
/// written into the plot area.
pub fn render_chart_svg(
    title: &str,
    source: &ColumnDataSource,
    layers: ChartLayers,
    message: Option<&str>,
) -> Result<String, ChartError> {
    let mut svg = String::new();
    draw_chart(title, source, layers, message, &mut svg)
        .map_err(|e| ChartError::Drawing(e.to_string()))?;
    Ok(svg)
}

fn draw_chart<'a>(
    title: &str,
    source: &ColumnDataSource,
    layers: ChartLayers,
    message: Option<&str>,
    svg: &'a mut String,
) -> DrawResult<(), SVGBackend<'a>> {
    let root = SVGBackend::with_string(svg, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (y_min, y_max) = temperature_range(source);
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22).into_font())
        .margin(20)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(1f64..366f64, y_min..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(12)
        .x_label_formatter(&position_label)
        .y_desc("Temperature (°C)")
        .draw()?;

    if layers.record {
        let style = RECORD_COLOR.mix(0.2).filled();
        chart
            .draw_series(
                band_segments(&source.record_low, &source.record_high)
                    .into_iter()
                    .map(move |points| Polygon::new(points, style)),
            )?
            .label("Record")
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], style));
    }

    if layers.normal {
        let style = NORMAL_COLOR.mix(0.4).filled();
        chart
            .draw_series(
                band_segments(&source.normal_low_1981_2010, &source.normal_high_1981_2010)
                    .into_iter()
                    .map(move |points| Polygon::new(points, style)),
            )?
            .label("Average")
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], style));
    }

    if layers.actual {
        let style = ACTUAL_COLOR.mix(0.8).filled();
        chart
            .draw_series(
                bar_spans(&source.actual_low, &source.actual_high)
                    .into_iter()
                    .map(move |(x, low, high)| {
                        Rectangle::new(
                            [(x - BAR_HALF_WIDTH, low), (x + BAR_HALF_WIDTH, high)],
                            style,
                        )
                    }),
            )?
            .label("Actual")
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], style));
    }

    if let Some(message) = message.filter(|_| source.is_empty()) {
        chart.plotting_area().draw(&Text::new(
            message.to_string(),
            (10.0, (y_min + y_max) / 2.0),
            ("sans-serif", 16).into_font().color(&RED),
        ))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Month/day label for a calendar position, counting Feb 29 as position 60
fn position_label(position: &f64) -> String {
    let ordinal = position.round().clamp(1.0, 366.0) as u32;
    // 2000 is a leap year, so its ordinals line up with calendar positions
    NaiveDate::from_yo_opt(2000, ordinal)
        .map(|date| date.format("%b %-d").to_string())
        .unwrap_or_default()
}

fn temperature_range(source: &ColumnDataSource) -> (f64, f64) {
    let values = [
        &source.record_high,
        &source.record_low,
        &source.normal_high_1981_2010,
        &source.normal_low_1981_2010,
        &source.actual_high,
        &source.actual_low,
    ]
    .into_iter()
    .flat_map(|column| column.iter().flatten().copied());

    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    });

    if min.is_finite() && max.is_finite() {
        (min.floor() - Y_PADDING, max.ceil() + Y_PADDING)
    } else {
        EMPTY_RANGE
    }
}

/// Closed outlines of each run of positions where both bounds are present
///
/// A missing value on either side ends the run, so gaps stay visible instead
/// of being bridged.
fn band_segments(low: &[Option<f64>], high: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut upper: Vec<(f64, f64)> = Vec::new();
    let mut lower: Vec<(f64, f64)> = Vec::new();

    for (index, bounds) in low.iter().zip(high).enumerate() {
        match bounds {
            (Some(lo), Some(hi)) => {
                let x = index as f64 + 1.0;
                upper.push((x, *hi));
                lower.push((x, *lo));
            }
            _ => close_segment(&mut segments, &mut upper, &mut lower),
        }
    }
    close_segment(&mut segments, &mut upper, &mut lower);

    segments
}

fn close_segment(
    segments: &mut Vec<Vec<(f64, f64)>>,
    upper: &mut Vec<(f64, f64)>,
    lower: &mut Vec<(f64, f64)>,
) {
    if upper.is_empty() {
        return;
    }
    let mut outline = std::mem::take(upper);
    outline.extend(lower.drain(..).rev());
    segments.push(outline);
}

fn bar_spans(low: &[Option<f64>], high: &[Option<f64>]) -> Vec<(f64, f64, f64)> {
    low.iter()
        .zip(high)
        .enumerate()
        .filter_map(|(index, bounds)| match bounds {
            (Some(lo), Some(hi)) => Some((index as f64 + 1.0, *lo, *hi)),
            _ => None,
        })
        .collect()
}
