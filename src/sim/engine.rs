//! Dispatch simulator: applies a policy to every sample of a series.

use crate::error::{ConfigurationError, Error, ValidationError};

use super::policy::{DispatchPolicy, ResolvedPolicy, StepInput};
use super::power_balance::grid_exchange_kw;
use super::quantile::quantile;
use super::types::{DispatchStep, Sample, TimeSeries};

/// Runs one dispatch policy over a whole time series.
///
/// Holds no per-series state: the only series-level value, the percentile
/// threshold, lives in the [`ResolvedPolicy`] returned by [`resolve`](Self::resolve).
#[derive(Debug, Clone, Copy)]
pub struct DispatchSimulator {
    policy: DispatchPolicy,
}

impl DispatchSimulator {
    /// Creates a simulator for `policy`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the policy parameters are invalid.
    pub fn new(policy: DispatchPolicy) -> Result<Self, ConfigurationError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &DispatchPolicy {
        &self.policy
    }

    /// Checks the series against the policy's input needs and computes the
    /// percentile threshold, if the policy uses one.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` on `price` naming the 1-based row of the
    /// first sample without a price when the policy needs prices.
    pub fn resolve(&self, series: &TimeSeries) -> Result<ResolvedPolicy, ValidationError> {
        if self.policy.requires_price() {
            if let Some(i) = series.first_missing_price() {
                return Err(ValidationError::new(
                    "price",
                    format!(
                        "row {} ({}): required by the {} policy",
                        i + 1,
                        series.samples()[i].timestamp,
                        self.policy.name()
                    ),
                ));
            }
        }

        let threshold = match self.policy {
            DispatchPolicy::PercentilePeakShaving {
                peak_percentile, ..
            } => {
                let loads: Vec<f64> = series.samples().iter().map(|s| s.load_kw).collect();
                quantile(&loads, peak_percentile / 100.0)
            }
            _ => None,
        };

        Ok(ResolvedPolicy::new(self.policy, threshold))
    }

    /// Dispatches one sample.
    ///
    /// # Arguments
    ///
    /// * `resolved` - Policy bound to the series the sample belongs to
    /// * `sample` - Sample to dispatch
    /// * `dt_hours` - Sample duration in hours
    pub fn step(resolved: &ResolvedPolicy, sample: &Sample, dt_hours: f64) -> DispatchStep {
        let net_load_kw = sample.net_load_kw();
        let input = StepInput {
            load_kw: sample.load_kw,
            net_load_kw,
            price: sample.price,
        };
        let battery_power_kw = resolved.battery_power_kw(&input);

        DispatchStep {
            timestamp: sample.timestamp,
            net_load_kw,
            battery_power_kw,
            energy_kwh: battery_power_kw * dt_hours,
            grid_exchange_kw: grid_exchange_kw(net_load_kw, battery_power_kw),
        }
    }

    /// Dispatches every sample in order; one step per sample.
    pub fn simulate(resolved: &ResolvedPolicy, series: &TimeSeries) -> Vec<DispatchStep> {
        let dt_hours = series.dt_hours();
        series
            .samples()
            .iter()
            .map(|sample| Self::step(resolved, sample, dt_hours))
            .collect()
    }

    /// Resolves the policy against `series` and dispatches it.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    pub fn run(&self, series: &TimeSeries) -> Result<(ResolvedPolicy, Vec<DispatchStep>), Error> {
        let resolved = self.resolve(series)?;
        let steps = Self::simulate(&resolved, series);
        Ok((resolved, steps))
    }
}
