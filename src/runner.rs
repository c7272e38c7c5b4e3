//! Sizing pipeline: dispatch, integrate, size, annotate.

use std::fmt;
use std::panic;
use std::thread;

use tracing::debug;

use crate::error::{ConfigurationError, Error};
use crate::sim::engine::DispatchSimulator;
use crate::sim::event::{DischargeEvent, discharge_events};
use crate::sim::integrator::{EnergyIntegrator, SocMode};
use crate::sim::kpi::DispatchKpis;
use crate::sim::policy::DispatchPolicy;
use crate::sim::sizing::{SizingCalculator, SizingMethod};
use crate::sim::types::{AnnotatedStep, TimeSeries};

/// One policy paired with one sizing method.
#[derive(Debug, Clone, Copy)]
pub struct SizingRun {
    simulator: DispatchSimulator,
    calculator: SizingCalculator,
    soc_mode: Option<SocMode>,
}

impl SizingRun {
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if either the policy or the method is invalid.
    pub fn new(policy: DispatchPolicy, method: SizingMethod) -> Result<Self, ConfigurationError> {
        Ok(Self {
            simulator: DispatchSimulator::new(policy)?,
            calculator: SizingCalculator::new(method)?,
            soc_mode: None,
        })
    }

    /// Overrides the SOC mode of the annotated series.
    pub fn with_soc_mode(mut self, soc_mode: SocMode) -> Self {
        self.soc_mode = Some(soc_mode);
        self
    }

    pub fn policy(&self) -> &DispatchPolicy {
        self.simulator.policy()
    }

    pub fn method(&self) -> &SizingMethod {
        self.calculator.method()
    }

    /// SOC mode the annotated series will use.
    pub fn soc_mode(&self) -> SocMode {
        self.soc_mode
            .unwrap_or_else(|| self.method().default_soc_mode())
    }

    /// Runs the full pipeline over `series`.
    ///
    /// Either the whole series is processed or nothing is returned.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` when the series lacks an input the policy
    /// needs (prices for arbitrage).
    pub fn run(&self, series: &TimeSeries) -> Result<SizingResult, Error> {
        let (resolved, steps) = self.simulator.run(series)?;
        if let Some(threshold) = resolved.peak_threshold_kw() {
            debug!(threshold_kw = threshold, "resolved percentile threshold");
        }

        let soc_mode = self.soc_mode();
        let soc = EnergyIntegrator::new(soc_mode).integrate(&steps);
        let required_power_kw = SizingCalculator::required_power_kw(&steps);
        let required_capacity_kwh = self.calculator.required_capacity_kwh(&steps);
        let events = discharge_events(&steps);
        let kpis = DispatchKpis::from_steps(
            &steps,
            series.dt_hours(),
            required_capacity_kwh,
            resolved.import_limit_kw(),
        );

        let annotated = series
            .samples()
            .iter()
            .zip(&steps)
            .zip(soc)
            .map(|((sample, step), soc_kwh)| AnnotatedStep::new(sample, step, soc_kwh))
            .collect();

        debug!(
            policy = self.policy().name(),
            method = self.method().name(),
            samples = series.len(),
            required_power_kw,
            required_capacity_kwh,
            "sizing run finished"
        );

        Ok(SizingResult {
            policy: *self.policy(),
            method: *self.method(),
            soc_mode,
            required_capacity_kwh,
            required_power_kw,
            peak_threshold_kw: resolved.peak_threshold_kw(),
            events,
            kpis,
            steps: annotated,
        })
    }
}

/// Outcome of one sizing run.
#[derive(Debug, Clone, PartialEq)]
pub struct SizingResult {
    pub policy: DispatchPolicy,
    pub method: SizingMethod,
    /// SOC mode of `steps`.
    pub soc_mode: SocMode,
    /// Energy rating (kWh, >= 0).
    pub required_capacity_kwh: f64,
    /// Power rating (kW, >= 0): the largest absolute battery power.
    pub required_power_kw: f64,
    /// Load threshold the percentile policy resolved to.
    pub peak_threshold_kw: Option<f64>,
    pub events: Vec<DischargeEvent>,
    pub kpis: DispatchKpis,
    /// Annotated series, one entry per input sample.
    pub steps: Vec<AnnotatedStep>,
}

impl SizingResult {
    /// Discharge event with the most energy, earliest on ties.
    pub fn largest_event(&self) -> Option<&DischargeEvent> {
        self.events
            .iter()
            .reduce(|best, e| if e.energy_kwh > best.energy_kwh { e } else { best })
    }
}

impl fmt::Display for SizingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Sizing Result ---")?;
        writeln!(f, "Policy:                {}", self.policy)?;
        writeln!(f, "Method:                {}", self.method)?;
        writeln!(f, "SOC mode:              {}", self.soc_mode)?;
        if let Some(threshold) = self.peak_threshold_kw {
            writeln!(f, "Peak threshold:        {threshold:.2} kW")?;
        }
        writeln!(f, "Samples:               {}", self.steps.len())?;
        writeln!(f, "Required power:        {:.2} kW", self.required_power_kw)?;
        writeln!(
            f,
            "Required capacity:     {:.2} kWh",
            self.required_capacity_kwh
        )?;
        if let Some(event) = self.largest_event() {
            writeln!(f, "Largest event:         {event}")?;
        }
        write!(f, "{}", self.kpis)
    }
}

/// Runs `policy` with each of `methods` over the same series, one worker
/// thread per method.
///
/// `soc_mode`, when given, overrides every method's default SOC mode.
/// Results come back in the order of `methods`.
///
/// # Errors
///
/// Returns the first error in method order.
pub fn compare_methods(
    series: &TimeSeries,
    policy: DispatchPolicy,
    methods: &[SizingMethod],
    soc_mode: Option<SocMode>,
) -> Result<Vec<SizingResult>, Error> {
    let runs = methods
        .iter()
        .map(|&method| -> Result<SizingRun, ConfigurationError> {
            let run = SizingRun::new(policy, method)?;
            Ok(match soc_mode {
                Some(mode) => run.with_soc_mode(mode),
                None => run,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    thread::scope(|scope| {
        let handles: Vec<_> = runs
            .iter()
            .map(|run| scope.spawn(move || run.run(series)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|e| panic::resume_unwind(e)))
            .collect()
    })
}
