//! Discharge events: maximal runs of consecutive discharging steps.

use std::fmt;

use itertools::Itertools;

use super::types::{DispatchStep, Timestamp};

/// One contiguous discharge run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DischargeEvent {
    /// Index of the first step of the run (inclusive).
    pub start_index: usize,
    /// Index of the last step of the run (inclusive).
    pub end_index: usize,
    /// Timestamp of the first step.
    pub start: Timestamp,
    /// Timestamp of the last step.
    pub end: Timestamp,
    /// Energy delivered over the run (kWh, positive magnitude).
    pub energy_kwh: f64,
    /// Largest discharge power within the run (kW, positive magnitude).
    pub peak_power_kw: f64,
}

impl DischargeEvent {
    /// Number of steps in the run.
    pub fn samples(&self) -> usize {
        self.end_index - self.start_index + 1
    }
}

impl fmt::Display for DischargeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {} ({} steps): {:.2} kWh, peak {:.2} kW",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M"),
            self.samples(),
            self.energy_kwh,
            self.peak_power_kw,
        )
    }
}

/// Splits `steps` into runs of equal "is discharging" state and returns the
/// discharging runs in order.
pub fn discharge_events(steps: &[DispatchStep]) -> Vec<DischargeEvent> {
    let runs = steps
        .iter()
        .enumerate()
        .chunk_by(|(_, step)| step.is_discharging());

    let mut events = Vec::new();
    for (discharging, run) in &runs {
        if !discharging {
            continue;
        }
        let mut run = run.peekable();
        let Some(&(start_index, first)) = run.peek() else {
            continue;
        };
        let mut event = DischargeEvent {
            start_index,
            end_index: start_index,
            start: first.timestamp,
            end: first.timestamp,
            energy_kwh: 0.0,
            peak_power_kw: 0.0,
        };
        let mut energy = 0.0_f64;
        for (index, step) in run {
            energy += step.energy_kwh;
            event.end_index = index;
            event.end = step.timestamp;
            event.peak_power_kw = event.peak_power_kw.max(-step.battery_power_kw);
        }
        event.energy_kwh = energy.abs();
        events.push(event);
    }
    events
}
