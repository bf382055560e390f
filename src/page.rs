/// Server-rendered dashboard page
///
/// The page template and its script live under `assets/` and are embedded at
/// compile time. The dropdowns and the chart SVG are rendered here from the
/// current selection; the script only swaps in new charts after a change.
use crate::dashboard::DashboardSnapshot;
use crate::services::SelectionOptions;

static PAGE_TEMPLATE: &str = include_str!("../assets/dashboard.html");
static PAGE_JS: &str = include_str!("../assets/dashboard.js");

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn option_tags<T: ToString>(values: &[T], selected: &str) -> String {
    values
        .iter()
        .map(|v| {
            let value = escape_html(&v.to_string());
            let attr = if v.to_string() == selected { " selected" } else { "" };
            format!("        <option value=\"{value}\"{attr}>{value}</option>")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_dashboard_page(options: &SelectionOptions, snapshot: &DashboardSnapshot) -> String {
    let city_options = option_tags(&options.cities, &snapshot.selection.city);
    let year_options = option_tags(&options.years, &snapshot.selection.year.to_string());

    PAGE_TEMPLATE
        .replace("{{TITLE}}", &escape_html(&snapshot.title))
        .replace("{{CITY_OPTIONS}}", &city_options)
        .replace("{{YEAR_OPTIONS}}", &year_options)
        .replace("{{ERROR}}", &escape_html(snapshot.error.as_deref().unwrap_or_default()))
        .replace("{{CHART_SVG}}", &snapshot.chart_svg)
        .replace("{{PAGE_SCRIPT}}", PAGE_JS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{ColumnDataSource, Selection};

    fn snapshot() -> DashboardSnapshot {
        DashboardSnapshot {
            selection: Selection {
                city: "New York, NY".to_string(),
                year: 2023,
            },
            title: "Weather Data for New York, NY in 2023".to_string(),
            source: ColumnDataSource::default(),
            error: None,
            chart_svg: "<svg id=\"drawn\"></svg>".to_string(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
        assert_eq!(escape_html("Denver, CO"), "Denver, CO");
    }

    #[test]
    fn test_render_marks_current_selection() {
        let options = SelectionOptions {
            cities: vec!["Chicago, IL".to_string(), "New York, NY".to_string()],
            years: vec![2022, 2023],
        };
        let html = render_dashboard_page(&options, &snapshot());

        assert!(html.contains("<option value=\"New York, NY\" selected>New York, NY</option>"));
        assert!(html.contains("<option value=\"Chicago, IL\">Chicago, IL</option>"));
        assert!(html.contains("<option value=\"2023\" selected>2023</option>"));
        assert!(html.contains("<title>Weather Data for New York, NY in 2023</title>"));
        assert!(html.contains("<svg id=\"drawn\"></svg>"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_render_escapes_error_message() {
        let mut failed = snapshot();
        failed.error = Some("Lookup failed: Unknown city: <b>".to_string());
        let options = SelectionOptions {
            cities: vec![],
            years: vec![],
        };
        let html = render_dashboard_page(&options, &failed);

        assert!(html.contains("Unknown city: &lt;b&gt;"));
    }
}
