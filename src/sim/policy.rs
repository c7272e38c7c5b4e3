//! Rule-based battery dispatch policies.
//!
//! Every policy is a pure function of the current sample: it never looks at
//! earlier samples or at the battery state. Battery power follows the grid
//! meter convention: positive = charging, negative = discharging.

use std::fmt;

use crate::error::ConfigurationError;

/// Selector names accepted by configuration, in declaration order.
pub const POLICY_NAMES: &[&str] = &[
    "strict_limits",
    "net_peak_shaving",
    "self_consumption",
    "price_arbitrage",
    "percentile_peak_shaving",
];

/// Battery operating policy.
///
/// Build through the validating constructors; policies assembled directly
/// are re-validated by the simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DispatchPolicy {
    /// Keep grid exchange within `[export_limit_kw, import_limit_kw]`.
    StrictLimits {
        /// Maximum grid import (kW, > 0).
        import_limit_kw: f64,
        /// Maximum grid export as a signed value (kW, <= 0).
        export_limit_kw: f64,
    },
    /// Shave net import above a threshold and store any PV surplus.
    NetPeakShaving {
        /// Net import above which the battery discharges (kW, > 0).
        import_threshold_kw: f64,
    },
    /// Dispatch to zero net exchange at every step.
    SelfConsumption,
    /// Serve load when prices are high, store surplus PV when they are low.
    PriceArbitrage {
        /// Price above which the battery discharges.
        high_price: f64,
        /// Price below which the battery charges. Must be < `high_price`.
        low_price: f64,
    },
    /// Shave building load above a percentile of the whole series.
    PercentilePeakShaving {
        /// Percentile of load used as the threshold, percent in `(0, 100)`.
        peak_percentile: f64,
        /// Export limit below which surplus is stored (kW, <= 0).
        export_limit_kw: f64,
    },
}

impl DispatchPolicy {
    /// # Errors
    ///
    /// Returns a `ConfigurationError` unless `import_limit_kw > 0` and `export_limit_kw <= 0`.
    pub fn strict_limits(
        import_limit_kw: f64,
        export_limit_kw: f64,
    ) -> Result<Self, ConfigurationError> {
        let policy = Self::StrictLimits {
            import_limit_kw,
            export_limit_kw,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// # Errors
    ///
    /// Returns a `ConfigurationError` unless `import_threshold_kw > 0`.
    pub fn net_peak_shaving(import_threshold_kw: f64) -> Result<Self, ConfigurationError> {
        let policy = Self::NetPeakShaving {
            import_threshold_kw,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn self_consumption() -> Self {
        Self::SelfConsumption
    }

    /// # Errors
    ///
    /// Returns a `ConfigurationError` unless both prices are finite and `high_price > low_price`.
    pub fn price_arbitrage(high_price: f64, low_price: f64) -> Result<Self, ConfigurationError> {
        let policy = Self::PriceArbitrage {
            high_price,
            low_price,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// # Errors
    ///
    /// Returns a `ConfigurationError` unless `0 < peak_percentile < 100` and `export_limit_kw <= 0`.
    pub fn percentile_peak_shaving(
        peak_percentile: f64,
        export_limit_kw: f64,
    ) -> Result<Self, ConfigurationError> {
        let policy = Self::PercentilePeakShaving {
            peak_percentile,
            export_limit_kw,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Checks every parameter against its constraint without clamping.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match *self {
            Self::StrictLimits {
                import_limit_kw,
                export_limit_kw,
            } => {
                require_positive("import_limit_kw", import_limit_kw)?;
                require_non_positive("export_limit_kw", export_limit_kw)
            }
            Self::NetPeakShaving {
                import_threshold_kw,
            } => require_positive("import_threshold_kw", import_threshold_kw),
            Self::SelfConsumption => Ok(()),
            Self::PriceArbitrage {
                high_price,
                low_price,
            } => {
                require_finite("high_price", high_price)?;
                require_finite("low_price", low_price)?;
                if high_price > low_price {
                    Ok(())
                } else {
                    Err(ConfigurationError::new(
                        "high_price",
                        format!("must be > low_price ({low_price}), got {high_price}"),
                    ))
                }
            }
            Self::PercentilePeakShaving {
                peak_percentile,
                export_limit_kw,
            } => {
                if !(peak_percentile > 0.0 && peak_percentile < 100.0) {
                    return Err(ConfigurationError::new(
                        "peak_percentile",
                        format!("must be in (0, 100), got {peak_percentile}"),
                    ));
                }
                require_non_positive("export_limit_kw", export_limit_kw)
            }
        }
    }

    /// Selector name, as used in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StrictLimits { .. } => "strict_limits",
            Self::NetPeakShaving { .. } => "net_peak_shaving",
            Self::SelfConsumption => "self_consumption",
            Self::PriceArbitrage { .. } => "price_arbitrage",
            Self::PercentilePeakShaving { .. } => "percentile_peak_shaving",
        }
    }

    /// Whether every sample must carry a price.
    pub fn requires_price(&self) -> bool {
        matches!(self, Self::PriceArbitrage { .. })
    }

    /// Fixed grid import limit the policy enforces, if it has one.
    ///
    /// The percentile policy's limit depends on the series and is resolved
    /// by the simulator.
    pub fn import_limit_kw(&self) -> Option<f64> {
        match *self {
            Self::StrictLimits {
                import_limit_kw, ..
            } => Some(import_limit_kw),
            Self::NetPeakShaving {
                import_threshold_kw,
            } => Some(import_threshold_kw),
            _ => None,
        }
    }
}

impl fmt::Display for DispatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        match *self {
            Self::StrictLimits {
                import_limit_kw,
                export_limit_kw,
            } => write!(
                f,
                " (import {import_limit_kw:.2} kW, export {export_limit_kw:.2} kW)"
            ),
            Self::NetPeakShaving {
                import_threshold_kw,
            } => write!(f, " (threshold {import_threshold_kw:.2} kW)"),
            Self::SelfConsumption => Ok(()),
            Self::PriceArbitrage {
                high_price,
                low_price,
            } => write!(f, " (high {high_price:.4}, low {low_price:.4})"),
            Self::PercentilePeakShaving {
                peak_percentile,
                export_limit_kw,
            } => write!(
                f,
                " (P{peak_percentile} of load, export {export_limit_kw:.2} kW)"
            ),
        }
    }
}

fn require_finite(field: &str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::new(
            field,
            format!("must be finite, got {value}"),
        ))
    }
}

fn require_positive(field: &str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::new(
            field,
            format!("must be > 0, got {value}"),
        ))
    }
}

fn require_non_positive(field: &str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && value <= 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::new(
            field,
            format!("must be <= 0, got {value}"),
        ))
    }
}

/// Per-sample quantities a policy decides on.
#[derive(Debug, Clone, Copy)]
pub struct StepInput {
    /// Building load (kW).
    pub load_kw: f64,
    /// Net load before the battery (kW).
    pub net_load_kw: f64,
    /// Energy price, when present.
    pub price: Option<f64>,
}

/// A policy bound to the series-level values it needs.
///
/// Only the percentile policy carries one: its load threshold, computed once
/// over the whole series before dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPolicy {
    policy: DispatchPolicy,
    peak_threshold_kw: Option<f64>,
}

impl ResolvedPolicy {
    pub(crate) fn new(policy: DispatchPolicy, peak_threshold_kw: Option<f64>) -> Self {
        Self {
            policy,
            peak_threshold_kw,
        }
    }

    pub fn policy(&self) -> &DispatchPolicy {
        &self.policy
    }

    /// Load threshold of the percentile policy; `None` for other policies
    /// and for an empty series.
    pub fn peak_threshold_kw(&self) -> Option<f64> {
        self.peak_threshold_kw
    }

    /// Import limit to audit grid exchange against, including the resolved
    /// percentile threshold.
    pub fn import_limit_kw(&self) -> Option<f64> {
        self.policy.import_limit_kw().or(self.peak_threshold_kw)
    }

    /// Battery power command for one sample (kW; positive=charge, negative=discharge).
    pub fn battery_power_kw(&self, input: &StepInput) -> f64 {
        let net = input.net_load_kw;
        match self.policy {
            DispatchPolicy::StrictLimits {
                import_limit_kw,
                export_limit_kw,
            } => {
                if net > import_limit_kw {
                    -(net - import_limit_kw)
                } else if net < export_limit_kw {
                    -(net - export_limit_kw)
                } else {
                    0.0
                }
            }
            DispatchPolicy::NetPeakShaving {
                import_threshold_kw,
            } => {
                let discharging = net > import_threshold_kw;
                if discharging {
                    -(net - import_threshold_kw)
                } else if net < 0.0 {
                    -net
                } else {
                    0.0
                }
            }
            // Written out so a balanced step yields +0.0 rather than -0.0.
            DispatchPolicy::SelfConsumption if net == 0.0 => 0.0,
            DispatchPolicy::SelfConsumption => -net,
            DispatchPolicy::PriceArbitrage {
                high_price,
                low_price,
            } => match input.price {
                Some(price) if price > high_price && net > 0.0 => -net,
                Some(price) if price < low_price && net < 0.0 => -net,
                _ => 0.0,
            },
            DispatchPolicy::PercentilePeakShaving {
                export_limit_kw, ..
            } => {
                let Some(threshold) = self.peak_threshold_kw else {
                    return 0.0;
                };
                let discharging = input.load_kw > threshold;
                if discharging {
                    -(input.load_kw - threshold)
                } else if net < export_limit_kw {
                    -(net - export_limit_kw)
                } else {
                    0.0
                }
            }
        }
    }
}
