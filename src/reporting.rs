//! Plain-text reports for the CLI.

use std::fmt;

use crate::runner::SizingResult;

/// Prints the annotated series, one line per sample.
pub fn print_steps(result: &SizingResult) {
    for step in &result.steps {
        println!("{step}");
    }
}

/// Prints the full report of one sizing run.
pub fn print_sizing_report(result: &SizingResult) {
    println!("\n{result}");
}

/// Comparison table: one row per run with method, SOC mode, power,
/// capacity, and the number of discharge events.
pub struct ComparisonTable<'a>(pub &'a [SizingResult]);

impl fmt::Display for ComparisonTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<26} {:<12} {:>12} {:>15} {:>7}",
            "Method", "SOC mode", "Power (kW)", "Capacity (kWh)", "Events"
        )?;
        for r in self.0 {
            writeln!(
                f,
                "{:<26} {:<12} {:>12.2} {:>15.2} {:>7}",
                r.method.name(),
                r.soc_mode.as_str(),
                r.required_power_kw,
                r.required_capacity_kwh,
                r.events.len()
            )?;
        }
        Ok(())
    }
}

/// Prints the side-by-side comparison of several sizing methods.
pub fn print_comparison(results: &[SizingResult]) {
    println!("\n--- Sizing Comparison ---");
    if let Some(first) = results.first() {
        println!("Policy: {}", first.policy);
        if let Some(threshold) = first.peak_threshold_kw {
            println!("Peak threshold: {threshold:.2} kW");
        }
    }
    print!("{}", ComparisonTable(results));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::compare_methods;
    use crate::sim::policy::DispatchPolicy;
    use crate::sim::sizing::SizingMethod;
    use crate::sim::types::{Sample, TimeSeries};
    use chrono::{NaiveDate, TimeDelta};

    #[test]
    fn comparison_has_one_row_per_method() {
        let start = NaiveDate::from_ymd_opt(2024, 9, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid timestamp");
        let samples = [(0.0, 10.0), (10.0, 0.0)]
            .iter()
            .enumerate()
            .map(|(i, &(l, p))| Sample::new(start + TimeDelta::minutes(15 * i as i64), l, p))
            .collect();
        let series = TimeSeries::new(samples, 0.25).expect("valid series");
        let results = compare_methods(
            &series,
            DispatchPolicy::self_consumption(),
            &SizingMethod::all_defaults(),
            None,
        )
        .expect("runs succeed");

        let table = ComparisonTable(&results).to_string();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("Method"));
        assert!(lines[4].starts_with("largest_discharge_event"));
        assert!(lines[4].contains("2.50"));
    }
}
