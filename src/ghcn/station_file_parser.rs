/// GHCN-Daily station file parser
///
/// Parses the by-station CSV layout:
/// `ID,DATE,ELEMENT,DATA_VALUE,M_FLAG,Q_FLAG,S_FLAG,OBS_TIME`
///
/// Columns are located by header name. DATA_VALUE for TMAX/TMIN is stored in
/// tenths of a degree Celsius.
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::DailyObservation;

#[derive(Error, Debug)]
pub enum GhcnParseError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("No TMAX/TMIN observations found")]
    NoTemperatureData,
}

#[derive(Debug, Default)]
struct ElementSum {
    total: f64,
    count: u32,
}

impl ElementSum {
    fn add(&mut self, value: f64) {
        self.total += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total / self.count as f64)
    }
}

#[derive(Debug, Default)]
struct DayAccumulator {
    tmax: ElementSum,
    tmin: ElementSum,
}

struct ColumnIndex {
    date: usize,
    element: usize,
    value: usize,
    q_flag: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, GhcnParseError> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

        Ok(Self {
            date: find("DATE").ok_or(GhcnParseError::MissingColumn("DATE"))?,
            element: find("ELEMENT").ok_or(GhcnParseError::MissingColumn("ELEMENT"))?,
            value: find("DATA_VALUE").ok_or(GhcnParseError::MissingColumn("DATA_VALUE"))?,
            q_flag: find("Q_FLAG"),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct StationFileParser {
    exclude_quality_flagged: bool,
}

impl StationFileParser {
    pub fn new(exclude_quality_flagged: bool) -> Self {
        Self {
            exclude_quality_flagged,
        }
    }

    /// Parse a station file into one observation per date, sorted by date
    ///
    /// Rows with an unparseable date or value are skipped and counted.
    /// Repeated values for the same date and element are averaged.
    #[instrument(skip(self, text), fields(size = text.len()))]
    pub fn parse(&self, text: &str) -> Result<Vec<DailyObservation>, GhcnParseError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let columns = ColumnIndex::from_headers(reader.headers()?)?;

        let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
        let mut row_count = 0usize;
        let mut skipped_rows = 0usize;
        let mut flagged_rows = 0usize;

        for record in reader.records() {
            let record = record?;
            row_count += 1;

            let element = record.get(columns.element).unwrap_or_default();
            if element != "TMAX" && element != "TMIN" {
                continue;
            }

            if self.exclude_quality_flagged {
                let flagged = columns
                    .q_flag
                    .and_then(|idx| record.get(idx))
                    .is_some_and(|flag| !flag.is_empty());
                if flagged {
                    flagged_rows += 1;
                    continue;
                }
            }

            let date_str = record.get(columns.date).unwrap_or_default();
            let Some(date) = parse_ghcn_date(date_str) else {
                debug!("Row {}: unparseable date '{}', skipping", row_count, date_str);
                skipped_rows += 1;
                continue;
            };

            let value_str = record.get(columns.value).unwrap_or_default();
            let Ok(tenths) = value_str.parse::<f64>() else {
                debug!("Row {}: unparseable value '{}', skipping", row_count, value_str);
                skipped_rows += 1;
                continue;
            };

            let day = days.entry(date).or_default();
            let celsius = tenths / 10.0;
            if element == "TMAX" {
                day.tmax.add(celsius);
            } else {
                day.tmin.add(celsius);
            }
        }

        if skipped_rows > 0 {
            warn!("Skipped {} unparseable TMAX/TMIN rows out of {}", skipped_rows, row_count);
        }
        if flagged_rows > 0 {
            debug!("Dropped {} quality-flagged rows", flagged_rows);
        }

        if days.is_empty() {
            return Err(GhcnParseError::NoTemperatureData);
        }

        let observations: Vec<DailyObservation> = days
            .into_iter()
            .map(|(date, day)| DailyObservation {
                date,
                tmax: day.tmax.mean(),
                tmin: day.tmin.mean(),
            })
            .collect();

        info!("Parsed {} daily observations from {} rows", observations.len(), row_count);

        Ok(observations)
    }
}

/// Accepts `YYYYMMDD` (the published layout) and `YYYY-MM-DD`
pub fn parse_ghcn_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
ID,DATE,ELEMENT,DATA_VALUE,M_FLAG,Q_FLAG,S_FLAG,OBS_TIME
USW00094846,19590101,TMAX,-28,,,0,
USW00094846,19590101,TMIN,-117,,,0,
USW00094846,19590101,PRCP,0,T,,0,
USW00094846,19590102,TMAX,6,,,0,
USW00094846,19590102,TMIN,-50,,,0,
USW00094846,19590102,SNOW,0,,,0,
";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_ghcn_date_formats() {
        assert_eq!(parse_ghcn_date("20240229"), Some(date(2024, 2, 29)));
        assert_eq!(parse_ghcn_date("2024-02-29"), Some(date(2024, 2, 29)));
        assert_eq!(parse_ghcn_date("20230229"), None);
        assert_eq!(parse_ghcn_date(""), None);
    }

    #[test]
    fn test_parse_pivots_and_converts_tenths() {
        let parser = StationFileParser::default();
        let observations = parser.parse(SAMPLE).unwrap();

        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].date, date(1959, 1, 1));
        assert_eq!(observations[0].tmax, Some(-2.8));
        assert_eq!(observations[0].tmin, Some(-11.7));
        assert_eq!(observations[1].tmax, Some(0.6));
        assert_eq!(observations[1].tmin, Some(-5.0));
    }

    #[test]
    fn test_parse_header_order_independent() {
        let text = "\
ELEMENT,DATA_VALUE,DATE,ID
TMIN,15,2020-07-04,USW00023062
TMAX,301,2020-07-04,USW00023062
";
        let observations = StationFileParser::default().parse(text).unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].tmax, Some(30.1));
        assert_eq!(observations[0].tmin, Some(1.5));
    }

    #[test]
    fn test_parse_missing_element_is_absent() {
        let text = "\
ID,DATE,ELEMENT,DATA_VALUE
USW00023062,20200704,TMAX,301
";
        let observations = StationFileParser::default().parse(text).unwrap();
        assert_eq!(observations[0].tmax, Some(30.1));
        assert_eq!(observations[0].tmin, None);
    }

    #[test]
    fn test_parse_duplicate_values_are_averaged() {
        let text = "\
ID,DATE,ELEMENT,DATA_VALUE
USW00023062,20200704,TMAX,300
USW00023062,20200704,TMAX,310
";
        let observations = StationFileParser::default().parse(text).unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].tmax, Some(30.5));
    }

    #[test]
    fn test_parse_skips_bad_rows() {
        let text = "\
ID,DATE,ELEMENT,DATA_VALUE
USW00023062,notadate,TMAX,300
USW00023062,20200704,TMAX,abc
USW00023062,20200705,TMAX,250
";
        let observations = StationFileParser::default().parse(text).unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].date, date(2020, 7, 5));
    }

    #[test]
    fn test_quality_flagged_rows_kept_by_default() {
        let text = "\
ID,DATE,ELEMENT,DATA_VALUE,M_FLAG,Q_FLAG,S_FLAG,OBS_TIME
USW00023062,20200704,TMAX,999,,X,0,
USW00023062,20200704,TMIN,100,,,0,
";
        let kept = StationFileParser::new(false).parse(text).unwrap();
        assert_eq!(kept[0].tmax, Some(99.9));

        let dropped = StationFileParser::new(true).parse(text).unwrap();
        assert_eq!(dropped[0].tmax, None);
        assert_eq!(dropped[0].tmin, Some(10.0));
    }

    #[test]
    fn test_parse_missing_column() {
        let text = "ID,DATE,DATA_VALUE\nUSW00023062,20200704,300\n";
        let result = StationFileParser::default().parse(text);
        assert!(matches!(result, Err(GhcnParseError::MissingColumn("ELEMENT"))));
    }

    #[test]
    fn test_parse_without_temperature_rows() {
        let text = "ID,DATE,ELEMENT,DATA_VALUE\nUSW00023062,20200704,PRCP,3\n";
        let result = StationFileParser::default().parse(text);
        assert!(matches!(result, Err(GhcnParseError::NoTemperatureData)));
    }
}
