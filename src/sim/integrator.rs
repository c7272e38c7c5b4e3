//! Battery energy integration (state of charge over time).

use std::fmt;

use serde::Deserialize;

use super::types::DispatchStep;

/// How the running energy sum is anchored.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocMode {
    /// One running sum over the whole horizon.
    #[default]
    Continuous,
    /// Running sum restarting at 0 on the first sample of every calendar date.
    DailyReset,
}

impl SocMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::DailyReset => "daily_reset",
        }
    }
}

impl fmt::Display for SocMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Integrates battery energy into a SOC series for an unconstrained ideal battery.
///
/// No capacity or power bounds are applied: the result is the energy the
/// battery would have to hold, relative to the integration origin.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnergyIntegrator {
    mode: SocMode,
}

impl EnergyIntegrator {
    pub fn new(mode: SocMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> SocMode {
        self.mode
    }

    /// Produces one SOC value (kWh) per step.
    ///
    /// `soc[0] = energy[0]` and `soc[t] = soc[t - 1] + energy[t]`; in
    /// daily-reset mode the sum restarts from 0 whenever the calendar date
    /// differs from the previous step's.
    pub fn integrate(&self, steps: &[DispatchStep]) -> Vec<f64> {
        let mut soc = Vec::with_capacity(steps.len());
        let mut running = 0.0_f64;
        let mut previous_date = None;

        for step in steps {
            let date = step.date();
            if self.mode == SocMode::DailyReset && previous_date.is_some_and(|d| d != date) {
                running = 0.0;
            }
            running += step.energy_kwh;
            soc.push(running);
            previous_date = Some(date);
        }
        soc
    }
}
