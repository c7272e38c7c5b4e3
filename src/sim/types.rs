//! Core engine types: input samples, the validated series, and per-step records.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

use super::power_balance::net_load_kw;
use crate::error::{ConfigurationError, Error, ValidationError};

/// Default sample duration in hours (15-minute metering).
pub const DEFAULT_DT_HOURS: f64 = 0.25;

/// Instant of a sample, carrying the UTC offset it was recorded in.
///
/// Ordering and window arithmetic use the instant; calendar dates and
/// printed times use the local wall clock of the offset.
pub type Timestamp = DateTime<FixedOffset>;

/// Reads a naive wall-clock time as a timestamp at UTC offset zero.
pub fn naive_timestamp(wall_clock: NaiveDateTime) -> Timestamp {
    wall_clock.and_utc().fixed_offset()
}

/// One metered time step of the site.
///
/// # Examples
///
/// ```
/// use bess_sizer::sim::types::Sample;
/// use chrono::NaiveDate;
///
/// let ts = NaiveDate::from_ymd_opt(2024, 6, 1)
///     .and_then(|d| d.and_hms_opt(12, 0, 0))
///     .expect("valid timestamp");
/// let sample = Sample::new(ts, 10.0, 4.0);
/// assert_eq!(sample.net_load_kw(), 6.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Start of the time step; calendar dates follow its local offset.
    pub timestamp: Timestamp,
    /// Building load (kW, >= 0).
    pub load_kw: f64,
    /// PV production (kW, >= 0).
    pub pv_kw: f64,
    /// Energy price for the step, any sign. Only the arbitrage policy needs it.
    pub price: Option<f64>,
}

impl Sample {
    /// Creates a sample without a price at a naive wall-clock time.
    pub fn new(timestamp: NaiveDateTime, load_kw: f64, pv_kw: f64) -> Self {
        Self {
            timestamp: naive_timestamp(timestamp),
            load_kw,
            pv_kw,
            price: None,
        }
    }

    /// Returns the same sample carrying `price`.
    pub fn with_price(self, price: f64) -> Self {
        Self {
            price: Some(price),
            ..self
        }
    }

    /// Net load before the battery (kW; positive=import, negative=export).
    pub fn net_load_kw(&self) -> f64 {
        net_load_kw(self.load_kw, self.pv_kw)
    }

    /// Local calendar date of the sample.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Immutable, validated input series.
///
/// Timestamps are strictly increasing as instants, so a DST fall-back that
/// repeats local times is accepted. Spacing is expected to equal `dt_hours`
/// but gaps are tolerated.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    samples: Vec<Sample>,
    dt_hours: f64,
}

impl TimeSeries {
    /// Validates and wraps `samples`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` on `dt_hours` if it is not a positive
    /// finite number, and a `ValidationError` naming the column and 1-based
    /// row for negative or non-finite values, non-finite prices, and
    /// non-increasing timestamps.
    pub fn new(samples: Vec<Sample>, dt_hours: f64) -> Result<Self, Error> {
        if !dt_hours.is_finite() || dt_hours <= 0.0 {
            return Err(ConfigurationError::new(
                "dt_hours",
                format!("must be a positive number of hours, got {dt_hours}"),
            )
            .into());
        }

        for (i, sample) in samples.iter().enumerate() {
            check_power("load", i, sample.load_kw)?;
            check_power("pv_production", i, sample.pv_kw)?;
            if let Some(price) = sample.price.filter(|p| !p.is_finite()) {
                return Err(ValidationError::new(
                    "price",
                    format!("row {}: must be finite, got {price}", i + 1),
                )
                .into());
            }
        }

        if let Some(i) = samples
            .windows(2)
            .position(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(ValidationError::new(
                "timestamp",
                format!(
                    "row {}: {} does not come after {}",
                    i + 2,
                    samples[i + 1].timestamp,
                    samples[i].timestamp
                ),
            )
            .into());
        }

        Ok(Self { samples, dt_hours })
    }

    /// Samples in timestamp order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Duration of one sample in hours.
    pub fn dt_hours(&self) -> f64 {
        self.dt_hours
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Index of the first sample without a price, if any.
    pub fn first_missing_price(&self) -> Option<usize> {
        self.samples.iter().position(|s| s.price.is_none())
    }
}

fn check_power(field: &str, index: usize, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("row {}: must be a finite value >= 0, got {value}", index + 1),
        ))
    }
}

/// Battery decision and resulting grid exchange for one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchStep {
    /// Timestamp of the source sample.
    pub timestamp: Timestamp,
    /// Net load before the battery (kW; positive=import, negative=export).
    pub net_load_kw: f64,
    /// Battery power (kW; positive=charge, negative=discharge).
    pub battery_power_kw: f64,
    /// Energy into the battery over the step: `battery_power_kw * dt_hours`.
    pub energy_kwh: f64,
    /// Grid exchange after the battery: `net_load_kw + battery_power_kw`.
    pub grid_exchange_kw: f64,
}

impl DispatchStep {
    pub fn is_discharging(&self) -> bool {
        self.battery_power_kw < 0.0
    }

    pub fn is_charging(&self) -> bool {
        self.battery_power_kw > 0.0
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Complete audit record of one sample, as charted and exported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotatedStep {
    pub timestamp: Timestamp,
    /// Building load (kW).
    pub load_kw: f64,
    /// PV production (kW).
    pub pv_kw: f64,
    /// Energy price, when the input carried one.
    pub price: Option<f64>,
    /// Net load before the battery (kW).
    pub net_load_kw: f64,
    /// Battery power (kW; positive=charge, negative=discharge).
    pub battery_power_kw: f64,
    /// Energy into the battery over the step (kWh).
    pub energy_kwh: f64,
    /// Battery energy state relative to the integration origin (kWh).
    pub soc_kwh: f64,
    /// Grid exchange after the battery (kW; positive=import, negative=export).
    pub grid_exchange_kw: f64,
}

impl AnnotatedStep {
    /// Joins a sample with its dispatch decision and integrated SOC.
    pub fn new(sample: &Sample, step: &DispatchStep, soc_kwh: f64) -> Self {
        Self {
            timestamp: sample.timestamp,
            load_kw: sample.load_kw,
            pv_kw: sample.pv_kw,
            price: sample.price,
            net_load_kw: step.net_load_kw,
            battery_power_kw: step.battery_power_kw,
            energy_kwh: step.energy_kwh,
            soc_kwh,
            grid_exchange_kw: step.grid_exchange_kw,
        }
    }
}

impl fmt::Display for AnnotatedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | load={:>8.2} kW  pv={:>8.2} kW  net={:>8.2} kW | \
             bat={:>8.2} kW  soc={:>9.2} kWh | grid={:>8.2} kW",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.load_kw,
            self.pv_kw,
            self.net_load_kw,
            self.battery_power_kw,
            self.soc_kwh,
            self.grid_exchange_kw,
        )?;
        if let Some(price) = self.price {
            write!(f, "  price={price:.4}")?;
        }
        Ok(())
    }
}
