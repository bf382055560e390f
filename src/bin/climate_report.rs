use chrono::{Datelike, Utc};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use weather_dashboard::climatology::{compute_daily_aggregate, DailyAggregate};
use weather_dashboard::config::DEFAULT_GHCN_BASE_URL;
use weather_dashboard::fetcher::GhcnFetcher;
use weather_dashboard::ghcn::StationFileParser;
use weather_dashboard::stations::{normalize_station_id, StationCatalog};

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
}

#[derive(Parser)]
#[command(name = "climate-report")]
#[command(about = "Print records, 1981-2010 normals and actuals for one station", long_about = None)]
struct Cli {
    /// City name from the built-in catalog (e.g. "Denver, CO")
    #[arg(long, conflicts_with = "station_id")]
    city: Option<String>,

    /// GHCN station id, bypassing the catalog
    #[arg(long)]
    station_id: Option<String>,

    /// Year for the actual series (default: current year)
    #[arg(long)]
    year: Option<i32>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Base URL of the by-station CSV files
    #[arg(long, env, default_value = DEFAULT_GHCN_BASE_URL)]
    ghcn_base_url: String,

    /// Drop values that failed a GHCN quality check
    #[arg(long)]
    exclude_quality_flagged: bool,
}

fn fmt_value(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.1}")).unwrap_or_else(|| "-".to_string())
}

fn print_table(aggregate: &DailyAggregate) {
    println!(
        "{:>4} {:>5} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "slot", "date", "rec_hi", "rec_lo", "norm_hi", "norm_lo", "act_hi", "act_lo"
    );
    for row in aggregate.calendar_order() {
        println!(
            "{:>4} {:02}-{:02} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
            row.day_of_year,
            row.month,
            row.day,
            fmt_value(row.record_high),
            fmt_value(row.record_low),
            fmt_value(row.normal_high_1981_2010),
            fmt_value(row.normal_low_1981_2010),
            fmt_value(row.actual_high),
            fmt_value(row.actual_low),
        );
    }
}

fn write_csv(aggregate: &DailyAggregate) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    for row in &aggregate.rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let catalog = StationCatalog::default();
    let (label, station_id) = match (&cli.city, &cli.station_id) {
        (_, Some(id)) => (id.clone(), normalize_station_id(id)?),
        (Some(city), None) => (city.clone(), catalog.lookup(city)?.station_id.clone()),
        (None, None) => {
            let cities = catalog.cities().join("; ");
            return Err(format!("Pass --city or --station-id (known cities: {cities})").into());
        }
    };
    let year = cli.year.unwrap_or_else(|| Utc::now().year());

    let fetcher = GhcnFetcher::new(cli.ghcn_base_url, 300)?
        .with_parser(StationFileParser::new(cli.exclude_quality_flagged));

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Downloading {station_id}.csv..."));

    let history = match fetcher.fetch_station(&station_id).await {
        Ok(history) => history,
        Err(e) => {
            pb.abandon_with_message(format!("Download failed for {label}"));
            return Err(e.into());
        }
    };
    pb.finish_with_message(format!(
        "{} observations for {label} ({:?}..={:?})",
        history.observations.len(),
        history.first_year(),
        history.last_year()
    ));

    let aggregate = compute_daily_aggregate(&history, year);
    match cli.format {
        OutputFormat::Table => print_table(&aggregate),
        OutputFormat::Csv => write_csv(&aggregate)?,
    }

    Ok(())
}
