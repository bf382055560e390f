/// Presentation binding for the dashboard
///
/// Holds the single current selection and the column-oriented data source
/// the page draws from. Every selection change replaces the whole source; the
/// source is never patched row by row.
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::chart::{render_chart_svg, ChartError, ChartLayers};
use crate::climatology::DailyAggregate;
use crate::services::climate_service::SelectionOptions;

/// Column-oriented table handed to the chart, rows in calendar order
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ColumnDataSource {
    pub day_of_year: Vec<u16>,
    pub month: Vec<u32>,
    pub day: Vec<u32>,
    pub record_high: Vec<Option<f64>>,
    pub record_low: Vec<Option<f64>>,
    pub normal_high_1981_2010: Vec<Option<f64>>,
    pub normal_low_1981_2010: Vec<Option<f64>>,
    pub actual_high: Vec<Option<f64>>,
    pub actual_low: Vec<Option<f64>>,
}

impl ColumnDataSource {
    pub fn len(&self) -> usize {
        self.day_of_year.len()
    }

    pub fn is_empty(&self) -> bool {
        self.day_of_year.is_empty()
    }

    /// Swap in new contents wholesale
    pub fn replace(&mut self, other: ColumnDataSource) {
        *self = other;
    }

    pub fn clear(&mut self) {
        *self = ColumnDataSource::default();
    }
}

impl From<&DailyAggregate> for ColumnDataSource {
    fn from(aggregate: &DailyAggregate) -> Self {
        let mut source = ColumnDataSource::default();
        for row in aggregate.calendar_order() {
            source.day_of_year.push(row.day_of_year);
            source.month.push(row.month);
            source.day.push(row.day);
            source.record_high.push(row.record_high);
            source.record_low.push(row.record_low);
            source.normal_high_1981_2010.push(row.normal_high_1981_2010);
            source.normal_low_1981_2010.push(row.normal_low_1981_2010);
            source.actual_high.push(row.actual_high);
            source.actual_low.push(row.actual_low);
        }
        source
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Selection {
    pub city: String,
    pub year: i32,
}

impl Selection {
    /// Apply a partial change; unspecified fields keep their value
    pub fn with_change(&self, change: &SelectionChange) -> Selection {
        Selection {
            city: change.city.clone().unwrap_or_else(|| self.city.clone()),
            year: change.year.unwrap_or(self.year),
        }
    }
}

/// Dropdown change posted by the page
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SelectionChange {
    pub city: Option<String>,
    pub year: Option<i32>,
}

pub fn chart_title(selection: &Selection) -> String {
    format!("Weather Data for {} in {}", selection.city, selection.year)
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DashboardSnapshot {
    pub selection: Selection,
    pub title: String,
    pub source: ColumnDataSource,
    pub error: Option<String>,
    /// The bound table drawn with every series visible
    pub chart_svg: String,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    selection: Selection,
    title: String,
    source: ColumnDataSource,
    error: Option<String>,
    chart_svg: String,
}

impl Dashboard {
    /// Empty dashboard defaulting to the first city and the latest year
    ///
    /// `fallback_year` is used when no year is known yet.
    pub fn new(options: &SelectionOptions, fallback_year: i32) -> Self {
        let selection = Selection {
            city: options.cities.first().cloned().unwrap_or_default(),
            year: options.years.last().copied().unwrap_or(fallback_year),
        };
        let mut dashboard = Self {
            title: chart_title(&selection),
            selection,
            source: ColumnDataSource::default(),
            error: None,
            chart_svg: String::new(),
        };
        dashboard.redraw();
        dashboard
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn source(&self) -> &ColumnDataSource {
        &self.source
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Draw the bound table with only the requested series
    pub fn render_chart(&self, layers: ChartLayers) -> Result<String, ChartError> {
        render_chart_svg(&self.title, &self.source, layers, self.error.as_deref())
    }

    fn redraw(&mut self) {
        match self.render_chart(ChartLayers::default()) {
            Ok(svg) => self.chart_svg = svg,
            Err(e) => {
                warn!("Could not draw chart for {}: {}", self.title, e);
                self.chart_svg.clear();
            }
        }
    }

    /// Commit a new selection together with its freshly computed table
    pub fn bind(&mut self, selection: Selection, aggregate: &DailyAggregate) {
        self.title = chart_title(&selection);
        self.selection = selection;
        self.source.replace(ColumnDataSource::from(aggregate));
        self.error = None;
        self.redraw();
    }

    /// Clear the chart after a failed recomputation
    ///
    /// The selection keeps its last successfully bound value.
    pub fn fail(&mut self, message: String) {
        self.source.clear();
        self.error = Some(message);
        self.redraw();
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            selection: self.selection.clone(),
            title: self.title.clone(),
            source: self.source.clone(),
            error: self.error.clone(),
            chart_svg: self.chart_svg.clone(),
        }
    }
}
