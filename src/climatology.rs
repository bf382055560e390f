/// Per-day-of-year climatology
///
/// Reduces a station history to a fixed 366-row table: all-time records,
/// 1981-2010 normals and the actual values for one selected year.
///
/// Slots 1..=365 follow a non-leap calendar in every year (Mar 1 is always
/// slot 60, Dec 31 is always slot 365). Feb 29 observations only exist in
/// leap years and are pooled into slot 366.
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::ops::RangeInclusive;
use utoipa::ToSchema;

use crate::ghcn::StationHistory;

pub const SLOT_COUNT: usize = 366;
pub const LEAP_DAY_SLOT: u16 = 366;
pub const NORMAL_PERIOD: RangeInclusive<i32> = 1981..=2010;

// Day-of-year of Feb 28
const FEB_28_ORDINAL: u32 = 59;

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Slot (1..=366) a calendar date contributes to
pub fn day_of_year_slot(date: NaiveDate) -> u16 {
    if date.month() == 2 && date.day() == 29 {
        return LEAP_DAY_SLOT;
    }
    let ordinal = date.ordinal();
    let slot = if is_leap_year(date.year()) && ordinal > FEB_28_ORDINAL {
        ordinal - 1
    } else {
        ordinal
    };
    slot as u16
}

/// Calendar (month, day) a slot represents
pub fn slot_calendar_day(slot: u16) -> Option<(u32, u32)> {
    if slot == LEAP_DAY_SLOT {
        return Some((2, 29));
    }
    // 2001 is a non-leap year
    NaiveDate::from_yo_opt(2001, u32::from(slot)).map(|d| (d.month(), d.day()))
}

/// Date a slot falls on in a given year, if it exists in that year
pub fn slot_date(slot: u16, year: i32) -> Option<NaiveDate> {
    let (month, day) = slot_calendar_day(slot)?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyAggregateRow {
    pub day_of_year: u16,
    pub month: u32,
    pub day: u32,
    pub record_high: Option<f64>,
    pub record_low: Option<f64>,
    pub normal_high_1981_2010: Option<f64>,
    pub normal_low_1981_2010: Option<f64>,
    pub actual_high: Option<f64>,
    pub actual_low: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyAggregate {
    pub station_id: String,
    pub year: i32,
    /// Exactly 366 rows ordered by day_of_year
    pub rows: Vec<DailyAggregateRow>,
}

impl DailyAggregate {
    pub fn row(&self, slot: u16) -> Option<&DailyAggregateRow> {
        self.rows.get(usize::from(slot).checked_sub(1)?)
    }

    /// Rows in calendar order (Feb 29 between Feb 28 and Mar 1)
    pub fn calendar_order(&self) -> Vec<&DailyAggregateRow> {
        let mut rows: Vec<&DailyAggregateRow> = self.rows.iter().collect();
        rows.sort_by_key(|r| (r.month, r.day));
        rows
    }

    pub fn has_actuals(&self) -> bool {
        self.rows
            .iter()
            .any(|r| r.actual_high.is_some() || r.actual_low.is_some())
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    total: f64,
    count: u32,
}

impl Mean {
    fn add(&mut self, value: f64) {
        self.total += value;
        self.count += 1;
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total / self.count as f64)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct SlotAccumulator {
    record_high: Option<f64>,
    record_low: Option<f64>,
    normal_high: Mean,
    normal_low: Mean,
    actual_high: Option<f64>,
    actual_low: Option<f64>,
}

fn max_opt(current: Option<f64>, value: f64) -> Option<f64> {
    Some(current.map_or(value, |c| c.max(value)))
}

fn min_opt(current: Option<f64>, value: f64) -> Option<f64> {
    Some(current.map_or(value, |c| c.min(value)))
}

/// Build the 366-row table for `year` from a station history
///
/// Records span the whole history and normals the 1981-2010 window regardless
/// of `year`. Actuals are absent for every day `year` has no observation.
pub fn compute_daily_aggregate(history: &StationHistory, year: i32) -> DailyAggregate {
    let mut slots = [SlotAccumulator::default(); SLOT_COUNT];

    for obs in &history.observations {
        let acc = &mut slots[usize::from(day_of_year_slot(obs.date)) - 1];
        let obs_year = obs.date.year();
        let in_normal_period = NORMAL_PERIOD.contains(&obs_year);

        if let Some(tmax) = obs.tmax {
            acc.record_high = max_opt(acc.record_high, tmax);
            if in_normal_period {
                acc.normal_high.add(tmax);
            }
        }
        if let Some(tmin) = obs.tmin {
            acc.record_low = min_opt(acc.record_low, tmin);
            if in_normal_period {
                acc.normal_low.add(tmin);
            }
        }
        if obs_year == year {
            acc.actual_high = obs.tmax;
            acc.actual_low = obs.tmin;
        }
    }

    let rows = slots
        .iter()
        .zip(1..=LEAP_DAY_SLOT)
        .map(|(acc, slot)| {
            let (month, day) = slot_calendar_day(slot).unwrap_or((2, 29));
            DailyAggregateRow {
                day_of_year: slot,
                month,
                day,
                record_high: acc.record_high,
                record_low: acc.record_low,
                normal_high_1981_2010: acc.normal_high.value(),
                normal_low_1981_2010: acc.normal_low.value(),
                actual_high: acc.actual_high,
                actual_low: acc.actual_low,
            }
        })
        .collect();

    DailyAggregate {
        station_id: history.station_id.clone(),
        year,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_is_leap_year() {
        assert!(is_leap_year(2024));
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2023));
    }

    #[test]
    fn test_day_of_year_slot_non_leap_year() {
        assert_eq!(day_of_year_slot(date(2023, 1, 1)), 1);
        assert_eq!(day_of_year_slot(date(2023, 2, 28)), 59);
        assert_eq!(day_of_year_slot(date(2023, 3, 1)), 60);
        assert_eq!(day_of_year_slot(date(2023, 12, 31)), 365);
    }

    #[test]
    fn test_day_of_year_slot_leap_year() {
        assert_eq!(day_of_year_slot(date(2024, 2, 28)), 59);
        assert_eq!(day_of_year_slot(date(2024, 2, 29)), LEAP_DAY_SLOT);
        assert_eq!(day_of_year_slot(date(2024, 3, 1)), 60);
        assert_eq!(day_of_year_slot(date(2024, 12, 31)), 365);
    }

    #[test]
    fn test_slot_calendar_day() {
        assert_eq!(slot_calendar_day(1), Some((1, 1)));
        assert_eq!(slot_calendar_day(60), Some((3, 1)));
        assert_eq!(slot_calendar_day(365), Some((12, 31)));
        assert_eq!(slot_calendar_day(366), Some((2, 29)));
        assert_eq!(slot_calendar_day(0), None);
        assert_eq!(slot_calendar_day(367), None);
    }

    #[test]
    fn test_slot_round_trips_every_day_of_a_leap_year() {
        let mut day = date(2024, 1, 1);
        while day.year() == 2024 {
            let slot = day_of_year_slot(day);
            assert_eq!(slot_date(slot, 2024), Some(day));
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_slot_date_leap_day_in_non_leap_year() {
        assert_eq!(slot_date(LEAP_DAY_SLOT, 2023), None);
        assert_eq!(slot_date(LEAP_DAY_SLOT, 2020), Some(date(2020, 2, 29)));
    }

    #[test]
    fn test_empty_history_still_has_366_rows() {
        let history = StationHistory::new("USW00094846", vec![]);
        let aggregate = compute_daily_aggregate(&history, 2020);
        assert_eq!(aggregate.rows.len(), SLOT_COUNT);
        assert!(aggregate.rows.iter().all(|r| r.record_high.is_none()));
        assert!(!aggregate.has_actuals());
    }

    #[test]
    fn test_row_lookup_by_slot() {
        let history = StationHistory::new("USW00094846", vec![]);
        let aggregate = compute_daily_aggregate(&history, 2020);
        assert_eq!(aggregate.row(1).unwrap().day_of_year, 1);
        assert_eq!(aggregate.row(366).unwrap().month, 2);
        assert!(aggregate.row(0).is_none());
        assert!(aggregate.row(367).is_none());
    }

    #[test]
    fn test_calendar_order_places_leap_day_after_feb_28() {
        let history = StationHistory::new("USW00094846", vec![]);
        let aggregate = compute_daily_aggregate(&history, 2020);
        let ordered = aggregate.calendar_order();
        assert_eq!((ordered[58].month, ordered[58].day), (2, 28));
        assert_eq!(ordered[59].day_of_year, LEAP_DAY_SLOT);
        assert_eq!((ordered[60].month, ordered[60].day), (3, 1));
        assert_eq!(ordered[365].day_of_year, 365);
    }
}
