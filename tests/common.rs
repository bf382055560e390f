// Shared fixtures for integration tests
#![allow(dead_code)]

use chrono::{Datelike, NaiveDate};

pub const HEADER: &str = "ID,DATE,ELEMENT,DATA_VALUE,M_FLAG,Q_FLAG,S_FLAG,OBS_TIME";

/// Deterministic max temperature in tenths of a degree for a date
pub fn tmax_tenths(date: NaiveDate) -> i32 {
    ((date.year() * 7 + date.ordinal() as i32 * 13) % 400) - 50
}

/// Deterministic min temperature in tenths of a degree for a date
pub fn tmin_tenths(date: NaiveDate) -> i32 {
    tmax_tenths(date) - 80 - (date.year() % 5) * 10
}

/// GHCN by-station CSV covering every day from `start` to `end` inclusive,
/// with a PRCP row per day that the parser must ignore
pub fn ghcn_csv(station_id: &str, start: NaiveDate, end: NaiveDate) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    let mut day = start;
    while day <= end {
        let date = day.format("%Y%m%d");
        out.push_str(&format!("{station_id},{date},TMAX,{},,,W,\n", tmax_tenths(day)));
        out.push_str(&format!("{station_id},{date},TMIN,{},,,W,\n", tmin_tenths(day)));
        out.push_str(&format!("{station_id},{date},PRCP,0,,,W,\n"));
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    out
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
