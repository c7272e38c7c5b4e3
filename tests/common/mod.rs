//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use bess_sizer::io::load::{LoadOptions, load_csv};
use bess_sizer::sim::policy::DispatchPolicy;
use bess_sizer::sim::types::{Sample, TimeSeries};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

/// Midnight of the first fixture day.
pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid timestamp")
}

/// Series with one sample every `dt_hours`, starting at [`start`].
pub fn series_with_dt(load: &[f64], pv: &[f64], dt_hours: f64) -> TimeSeries {
    let step = TimeDelta::seconds((dt_hours * 3600.0) as i64);
    let samples = load
        .iter()
        .zip(pv)
        .enumerate()
        .map(|(i, (&l, &p))| Sample::new(start() + step * i as i32, l, p))
        .collect();
    TimeSeries::new(samples, dt_hours).expect("valid series")
}

/// Quarter-hourly series starting at [`start`].
pub fn series(load: &[f64], pv: &[f64]) -> TimeSeries {
    series_with_dt(load, pv, 0.25)
}

/// Path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Two days of quarter-hourly load, PV and price (day-first timestamps).
pub fn two_days() -> TimeSeries {
    load_csv(&fixture_path("two_days.csv"), &LoadOptions::default()).expect("fixture loads")
}

/// One policy of every kind, with parameters that trigger on [`two_days`].
pub fn all_policies() -> Vec<DispatchPolicy> {
    vec![
        DispatchPolicy::strict_limits(50.0, -10.0).expect("valid policy"),
        DispatchPolicy::net_peak_shaving(50.0).expect("valid policy"),
        DispatchPolicy::self_consumption(),
        DispatchPolicy::price_arbitrage(0.30, 0.10).expect("valid policy"),
        DispatchPolicy::percentile_peak_shaving(90.0, 0.0).expect("valid policy"),
    ]
}
