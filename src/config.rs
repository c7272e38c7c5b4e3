//! TOML-based run configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigurationError;
use crate::io::load::LoadOptions;
use crate::runner::SizingRun;
use crate::sim::integrator::SocMode;
use crate::sim::policy::{DispatchPolicy, POLICY_NAMES};
use crate::sim::sizing::{
    DEFAULT_SURPLUS_QUANTILE, DEFAULT_WINDOW_HOURS, METHOD_NAMES, SizingMethod,
};
use crate::sim::types::DEFAULT_DT_HOURS;

/// Top-level run configuration parsed from TOML.
///
/// All fields have defaults matching the `peak_shaving` preset. Load from
/// TOML with [`RunConfig::from_toml_file`] or pick a preset with
/// [`RunConfig::from_preset`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Input series parameters.
    #[serde(default)]
    pub input: InputConfig,
    /// Dispatch policy selector and parameters.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Sizing method selector and parameters.
    #[serde(default)]
    pub sizing: SizingConfig,
}

/// Input series parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Sample duration in hours (must be > 0).
    pub dt_hours: f64,
    /// `strftime` format of the timestamp column; auto-detected when absent.
    pub timestamp_format: Option<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dt_hours: DEFAULT_DT_HOURS,
            timestamp_format: None,
        }
    }
}

/// Dispatch policy selector and the union of all variant parameters.
///
/// Only the parameters of the selected `kind` are read.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// One of `strict_limits`, `net_peak_shaving`, `self_consumption`,
    /// `price_arbitrage`, `percentile_peak_shaving`.
    pub kind: String,
    /// Grid import limit (kW), `strict_limits`.
    pub import_limit_kw: f64,
    /// Grid export limit (kW, <= 0), `strict_limits` and `percentile_peak_shaving`.
    pub export_limit_kw: f64,
    /// Net import threshold (kW), `net_peak_shaving`.
    pub import_threshold_kw: f64,
    /// Discharge price, `price_arbitrage`.
    pub high_price: f64,
    /// Charge price, `price_arbitrage`.
    pub low_price: f64,
    /// Load percentile in percent, `percentile_peak_shaving`.
    pub peak_percentile: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            kind: "net_peak_shaving".to_string(),
            import_limit_kw: 50.0,
            export_limit_kw: 0.0,
            import_threshold_kw: 50.0,
            high_price: 0.30,
            low_price: 0.10,
            peak_percentile: 95.0,
        }
    }
}

/// Sizing method selector and parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizingConfig {
    /// One of `worst_window`, `guaranteed`, `daily_cycle`,
    /// `largest_discharge_event`, `percentile_surplus`.
    pub method: String,
    /// Trailing window (hours), `worst_window`.
    pub window_hours: f64,
    /// Fraction in (0, 1], `percentile_surplus`.
    pub quantile: f64,
    /// SOC mode of the annotated series; the method's default when absent.
    pub soc_mode: Option<SocMode>,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            method: "worst_window".to_string(),
            window_hours: DEFAULT_WINDOW_HOURS,
            quantile: DEFAULT_SURPLUS_QUANTILE,
            soc_mode: None,
        }
    }
}

impl RunConfig {
    /// Net peak shaving at 50 kW, sized over the worst 24 h window.
    pub fn peak_shaving() -> Self {
        Self::default()
    }

    /// Hard 50 kW import / 10 kW export band, sized for full coverage.
    pub fn strict_limits() -> Self {
        Self {
            policy: PolicyConfig {
                kind: "strict_limits".to_string(),
                import_limit_kw: 50.0,
                export_limit_kw: -10.0,
                ..PolicyConfig::default()
            },
            sizing: SizingConfig {
                method: "guaranteed".to_string(),
                ..SizingConfig::default()
            },
            ..Self::default()
        }
    }

    /// Zero net exchange, sized on the 90th percentile of daily PV surplus.
    pub fn self_consumption() -> Self {
        Self {
            policy: PolicyConfig {
                kind: "self_consumption".to_string(),
                ..PolicyConfig::default()
            },
            sizing: SizingConfig {
                method: "percentile_surplus".to_string(),
                ..SizingConfig::default()
            },
            ..Self::default()
        }
    }

    /// Price band arbitrage, sized on the largest daily SOC range.
    pub fn price_arbitrage() -> Self {
        Self {
            policy: PolicyConfig {
                kind: "price_arbitrage".to_string(),
                ..PolicyConfig::default()
            },
            sizing: SizingConfig {
                method: "daily_cycle".to_string(),
                ..SizingConfig::default()
            },
            ..Self::default()
        }
    }

    /// Shave load above its 95th percentile, sized on the largest discharge event.
    pub fn percentile_peak_shaving() -> Self {
        Self {
            policy: PolicyConfig {
                kind: "percentile_peak_shaving".to_string(),
                ..PolicyConfig::default()
            },
            sizing: SizingConfig {
                method: "largest_discharge_event".to_string(),
                ..SizingConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &[
        "peak_shaving",
        "strict_limits",
        "self_consumption",
        "price_arbitrage",
        "percentile_peak_shaving",
    ];

    /// Loads a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigurationError> {
        match name {
            "peak_shaving" => Ok(Self::peak_shaving()),
            "strict_limits" => Ok(Self::strict_limits()),
            "self_consumption" => Ok(Self::self_consumption()),
            "price_arbitrage" => Ok(Self::price_arbitrage()),
            "percentile_peak_shaving" => Ok(Self::percentile_peak_shaving()),
            _ => Err(ConfigurationError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a run configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigurationError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigurationError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a run configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigurationError> {
        toml::from_str(s).map_err(|e| ConfigurationError::new("toml", e.to_string()))
    }

    /// Builds the configured dispatch policy.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` with a `policy.`-prefixed field if the
    /// kind is unknown or a parameter of the selected kind is invalid.
    pub fn dispatch_policy(&self) -> Result<DispatchPolicy, ConfigurationError> {
        let p = &self.policy;
        let policy = match p.kind.as_str() {
            "strict_limits" => DispatchPolicy::strict_limits(p.import_limit_kw, p.export_limit_kw),
            "net_peak_shaving" => DispatchPolicy::net_peak_shaving(p.import_threshold_kw),
            "self_consumption" => Ok(DispatchPolicy::self_consumption()),
            "price_arbitrage" => DispatchPolicy::price_arbitrage(p.high_price, p.low_price),
            "percentile_peak_shaving" => {
                DispatchPolicy::percentile_peak_shaving(p.peak_percentile, p.export_limit_kw)
            }
            other => Err(ConfigurationError::new(
                "kind",
                format!(
                    "unknown policy \"{other}\", available: {}",
                    POLICY_NAMES.join(", ")
                ),
            )),
        };
        policy.map_err(|e| e.within("policy"))
    }

    /// Builds the configured sizing method.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` with a `sizing.`-prefixed field if the
    /// method is unknown or its parameter is invalid.
    pub fn sizing_method(&self) -> Result<SizingMethod, ConfigurationError> {
        let s = &self.sizing;
        let method = match s.method.as_str() {
            "worst_window" => SizingMethod::worst_window(s.window_hours),
            "percentile_surplus" => SizingMethod::percentile_surplus(s.quantile),
            other => SizingMethod::from_name(other).ok_or_else(|| {
                ConfigurationError::new(
                    "method",
                    format!(
                        "unknown sizing method \"{other}\", available: {}",
                        METHOD_NAMES.join(", ")
                    ),
                )
            }),
        };
        method.map_err(|e| e.within("sizing"))
    }

    /// Builds the full sizing run.
    ///
    /// # Errors
    ///
    /// Same as [`dispatch_policy`](Self::dispatch_policy) and [`sizing_method`](Self::sizing_method).
    pub fn sizing_run(&self) -> Result<SizingRun, ConfigurationError> {
        let run = SizingRun::new(self.dispatch_policy()?, self.sizing_method()?)?;
        Ok(match self.sizing.soc_mode {
            Some(mode) => run.with_soc_mode(mode),
            None => run,
        })
    }

    /// Every sizing method, with this configuration's window and quantile.
    ///
    /// # Errors
    ///
    /// Returns the first invalid method parameter.
    pub fn all_sizing_methods(&self) -> Result<Vec<SizingMethod>, ConfigurationError> {
        METHOD_NAMES
            .iter()
            .map(|name| {
                let config = Self {
                    sizing: SizingConfig {
                        method: (*name).to_string(),
                        ..self.sizing.clone()
                    },
                    ..self.clone()
                };
                config.sizing_method()
            })
            .collect()
    }

    /// CSV loader options for the input section.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            dt_hours: self.input.dt_hours,
            timestamp_format: self.input.timestamp_format.clone(),
        }
    }

    /// Validates all sections and returns every error found.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigurationError> {
        let mut errors = Vec::new();

        let dt = self.input.dt_hours;
        if !dt.is_finite() || dt <= 0.0 {
            errors.push(ConfigurationError::new(
                "input.dt_hours",
                format!("must be > 0, got {dt}"),
            ));
        }
        if self
            .input
            .timestamp_format
            .as_deref()
            .is_some_and(|f| f.trim().is_empty())
        {
            errors.push(ConfigurationError::new(
                "input.timestamp_format",
                "must not be empty",
            ));
        }

        if let Err(e) = self.dispatch_policy() {
            errors.push(e);
        }
        if let Err(e) = self.sizing_method() {
            errors.push(e);
        }

        errors
    }
}
