//! Battery sizing: reduces a dispatch trajectory to the power and energy
//! rating it requires.
//!
//! Power is always the largest absolute battery power. Capacity has five
//! interchangeable strategies, see [`SizingMethod`].

use std::fmt;

use chrono::TimeDelta;
use itertools::Itertools;

use super::event::discharge_events;
use super::integrator::{EnergyIntegrator, SocMode};
use super::quantile::quantile;
use super::types::DispatchStep;
use super::window::max_trailing_range;
use crate::error::ConfigurationError;

/// Default trailing window of the worst-window strategy.
pub const DEFAULT_WINDOW_HOURS: f64 = 24.0;

/// Default quantile of the daily-surplus strategy.
pub const DEFAULT_SURPLUS_QUANTILE: f64 = 0.9;

/// Selector names accepted by configuration, in declaration order.
pub const METHOD_NAMES: &[&str] = &[
    "worst_window",
    "guaranteed",
    "daily_cycle",
    "largest_discharge_event",
    "percentile_surplus",
];

/// Capacity sizing strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizingMethod {
    /// Largest SOC range within any trailing wall-clock window.
    WorstWindow { window: TimeDelta },
    /// SOC range over the whole horizon.
    Guaranteed,
    /// Largest SOC range within one calendar date.
    DailyCycle,
    /// Energy of the largest contiguous discharge run.
    LargestDischargeEvent,
    /// Quantile of the per-date charged energy.
    PercentileSurplus {
        /// Fraction in `(0, 1]`.
        quantile: f64,
    },
}

impl SizingMethod {
    /// Worst-window strategy over a window of `hours`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` on `window_hours` unless it is a
    /// positive duration of at least one millisecond.
    pub fn worst_window(hours: f64) -> Result<Self, ConfigurationError> {
        let invalid = || {
            ConfigurationError::new(
                "window_hours",
                format!("must be a positive number of hours, got {hours}"),
            )
        };
        if !hours.is_finite() || hours <= 0.0 {
            return Err(invalid());
        }
        let millis = (hours * 3_600_000.0).round();
        if millis < 1.0 || millis > i64::MAX as f64 {
            return Err(invalid());
        }
        let window = TimeDelta::try_milliseconds(millis as i64).ok_or_else(invalid)?;
        Ok(Self::WorstWindow { window })
    }

    /// Daily-surplus strategy at `quantile`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` on `quantile` unless `0 < quantile <= 1`.
    pub fn percentile_surplus(quantile: f64) -> Result<Self, ConfigurationError> {
        let method = Self::PercentileSurplus { quantile };
        method.validate()?;
        Ok(method)
    }

    /// Looks up a parameterless method by selector name, with defaults for
    /// the parameterized ones.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "worst_window" => Some(Self::WorstWindow {
                window: TimeDelta::hours(DEFAULT_WINDOW_HOURS as i64),
            }),
            "guaranteed" => Some(Self::Guaranteed),
            "daily_cycle" => Some(Self::DailyCycle),
            "largest_discharge_event" => Some(Self::LargestDischargeEvent),
            "percentile_surplus" => Some(Self::PercentileSurplus {
                quantile: DEFAULT_SURPLUS_QUANTILE,
            }),
            _ => None,
        }
    }

    /// Every method with default parameters, in selector order.
    pub fn all_defaults() -> Vec<Self> {
        METHOD_NAMES.iter().filter_map(|name| Self::from_name(name)).collect()
    }

    /// # Errors
    ///
    /// Returns a `ConfigurationError` naming the first invalid parameter.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match *self {
            Self::WorstWindow { window } if window <= TimeDelta::zero() => Err(
                ConfigurationError::new("window_hours", format!("must be > 0, got {window}")),
            ),
            Self::PercentileSurplus { quantile } if !(quantile > 0.0 && quantile <= 1.0) => {
                Err(ConfigurationError::new(
                    "quantile",
                    format!("must be in (0, 1], got {quantile}"),
                ))
            }
            _ => Ok(()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::WorstWindow { .. } => "worst_window",
            Self::Guaranteed => "guaranteed",
            Self::DailyCycle => "daily_cycle",
            Self::LargestDischargeEvent => "largest_discharge_event",
            Self::PercentileSurplus { .. } => "percentile_surplus",
        }
    }

    /// SOC mode the annotated series uses when the run does not override it.
    ///
    /// Methods that assume an overnight re-balance default to daily reset.
    pub fn default_soc_mode(&self) -> SocMode {
        match self {
            Self::DailyCycle | Self::PercentileSurplus { .. } => SocMode::DailyReset,
            _ => SocMode::Continuous,
        }
    }
}

impl fmt::Display for SizingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        match *self {
            Self::WorstWindow { window } => {
                write!(f, " ({} h)", window.num_milliseconds() as f64 / 3_600_000.0)
            }
            Self::PercentileSurplus { quantile } => write!(f, " (q = {quantile})"),
            _ => Ok(()),
        }
    }
}

/// Applies one sizing strategy to a dispatch trajectory.
#[derive(Debug, Clone, Copy)]
pub struct SizingCalculator {
    method: SizingMethod,
}

impl SizingCalculator {
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the method parameters are invalid.
    pub fn new(method: SizingMethod) -> Result<Self, ConfigurationError> {
        method.validate()?;
        Ok(Self { method })
    }

    pub fn method(&self) -> &SizingMethod {
        &self.method
    }

    /// Largest absolute battery power (kW); 0 for an empty trajectory.
    pub fn required_power_kw(steps: &[DispatchStep]) -> f64 {
        steps
            .iter()
            .map(|s| s.battery_power_kw.abs())
            .fold(0.0, f64::max)
    }

    /// Energy rating (kWh) the method requires; 0 for an empty trajectory.
    pub fn required_capacity_kwh(&self, steps: &[DispatchStep]) -> f64 {
        match self.method {
            SizingMethod::WorstWindow { window } => worst_window_kwh(steps, window),
            SizingMethod::Guaranteed => guaranteed_kwh(steps),
            SizingMethod::DailyCycle => daily_cycle_kwh(steps),
            SizingMethod::LargestDischargeEvent => largest_event_kwh(steps),
            SizingMethod::PercentileSurplus { quantile } => surplus_quantile_kwh(steps, quantile),
        }
    }
}

/// Pairs every step with the SOC levels it moves between, `[before, after]`,
/// on the continuous trajectory starting from 0.
///
/// Range strategies measure these swings rather than the post-step values
/// alone, so the level a window or day starts from is counted.
fn soc_swings(steps: &[DispatchStep]) -> impl Iterator<Item = (&DispatchStep, [f64; 2])> {
    let soc = EnergyIntegrator::new(SocMode::Continuous).integrate(steps);
    steps
        .iter()
        .zip(soc)
        .map(|(step, after)| (step, [after - step.energy_kwh, after]))
}

fn range(values: impl IntoIterator<Item = f64>) -> f64 {
    let (max, min) = values
        .into_iter()
        .fold((f64::NEG_INFINITY, f64::INFINITY), |(hi, lo), v| {
            (hi.max(v), lo.min(v))
        });
    if max >= min { max - min } else { 0.0 }
}

fn worst_window_kwh(steps: &[DispatchStep], window: TimeDelta) -> f64 {
    let points = soc_swings(steps)
        .flat_map(|(step, levels)| levels.map(|level| (step.timestamp, level)));
    max_trailing_range(points, window)
}

fn guaranteed_kwh(steps: &[DispatchStep]) -> f64 {
    range(soc_swings(steps).flat_map(|(_, levels)| levels))
}

fn daily_cycle_kwh(steps: &[DispatchStep]) -> f64 {
    let days = soc_swings(steps).chunk_by(|(step, _)| step.date());
    days.into_iter()
        .map(|(_, day)| range(day.flat_map(|(_, levels)| levels)))
        .fold(0.0, f64::max)
}

fn largest_event_kwh(steps: &[DispatchStep]) -> f64 {
    discharge_events(steps)
        .iter()
        .map(|e| e.energy_kwh)
        .fold(0.0, f64::max)
}

/// Charged energy summed per calendar date, for dates with any charging.
pub fn daily_surplus_kwh(steps: &[DispatchStep]) -> Vec<f64> {
    let days = steps
        .iter()
        .filter(|s| s.energy_kwh > 0.0)
        .chunk_by(|s| s.date());
    days.into_iter()
        .map(|(_, day)| day.map(|s| s.energy_kwh).sum())
        .collect()
}

fn surplus_quantile_kwh(steps: &[DispatchStep], q: f64) -> f64 {
    quantile(&daily_surplus_kwh(steps), q).unwrap_or(0.0)
}
